// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Custom assertions for integration tests

use speedracer::core::cpu::CPU;
use speedracer::core::memory::{Bus, PhysicalBus};

/// Assert CPU register has expected value
#[allow(dead_code)]
pub fn assert_cpu_reg(cpu: &CPU, reg: u8, expected: u64) {
    let actual = cpu.reg(reg);
    assert_eq!(
        actual, expected,
        "Register ${} mismatch: expected 0x{:016X}, got 0x{:016X}",
        reg, expected, actual
    );
}

/// Assert CPU PC is at expected address
#[allow(dead_code)]
pub fn assert_cpu_pc(cpu: &CPU, expected: u32) {
    let actual = cpu.pc();
    assert_eq!(
        actual, expected,
        "PC mismatch: expected 0x{:08X}, got 0x{:08X}",
        expected, actual
    );
}

/// Assert physical memory contains expected word
#[allow(dead_code)]
pub fn assert_memory_word(bus: &Bus, paddr: u64, expected: u32) {
    let actual = bus.read32(paddr).expect("Failed to read memory");
    assert_eq!(
        actual, expected,
        "Memory at 0x{:08X} mismatch: expected 0x{:08X}, got 0x{:08X}",
        paddr, expected, actual
    );
}

/// Assert Cause.ExcCode has expected value
#[allow(dead_code)]
pub fn assert_exc_code(cpu: &CPU, expected: u32) {
    let actual = (cpu.cop0().cause() >> 2) & 0x1F;
    assert_eq!(
        actual, expected,
        "ExcCode mismatch: expected {}, got {}",
        expected, actual
    );
}
