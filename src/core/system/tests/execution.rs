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

//! Bounded execution and tracing tests

use super::*;
use crate::core::cpu::ExceptionCause;

#[test]
fn test_system_step() {
    let mut system = system_with_prom(&[0x0000_0000]);

    let initial_pc = system.pc();
    assert_eq!(system.step(), StepEvent::Retired);

    assert_eq!(system.pc(), initial_pc + 4);
    assert_eq!(system.steps(), 1);
}

#[test]
fn test_boot_sequence() {
    // lui t0, 0x1234 ; addi t0, t0, 0x5678
    let mut system = system_with_prom(&[0x3C08_1234, 0x2108_5678]);

    let summary = system.run(2);

    assert_eq!(summary.retired, 2);
    assert_eq!(system.cpu().reg(8), 0x1234_5678);
    assert_eq!(system.pc(), 0xBFC0_0008);
}

#[test]
fn test_run_is_bounded() {
    // 0xBFC00000: j 0xBFC00000 ; nop
    let mut system = system_with_prom(&[0x0BF0_0000, 0x0000_0000]);

    let summary = system.run(1001);

    assert_eq!(summary.steps, 1001);
    assert_eq!(summary.exceptions, 0);
    assert_eq!(system.steps(), 1001);
    // Odd step count leaves the CPU in the delay slot
    assert_eq!(system.pc(), 0xBFC0_0004);
    assert!(system.cpu().in_delay_slot());
}

#[test]
fn test_run_zero_does_nothing() {
    let mut system = system_with_prom(&[0]);
    assert_eq!(system.run(0), RunSummary::default());
    assert_eq!(system.pc(), 0xBFC0_0000);
}

#[test]
fn test_run_counts_exceptions() {
    // syscall at the reset vector lands in the BEV general vector,
    // which holds nops in an all-zero PROM
    let mut words = vec![0u32; 0x200];
    words[0] = 0x0000_000C;
    let mut system = system_with_prom(&words);

    assert_eq!(system.step(), StepEvent::Exception(ExceptionCause::Syscall));
    assert_eq!(system.pc(), 0xBFC0_0380);

    let summary = system.run(4);
    assert_eq!(summary.retired, 4);
    assert_eq!(system.exceptions(), 1);
}

#[test]
fn test_count_advances_per_step() {
    let config = MachineConfig {
        count_per_step: 2,
        ..Default::default()
    };
    let mut system = System::new(&config).unwrap();
    system.load_prom_bytes(&[0u8; 64]).unwrap();

    system.run(5);
    assert_eq!(
        system.cpu().cop0().read32(crate::core::cpu::COP0::COUNT),
        10
    );
}

#[test]
fn test_tracing_respects_limit() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let path = file.path().to_str().unwrap().to_string();
    let mut system = system_with_prom(&[0u32; 16]);

    system.enable_tracing(&path, 5).unwrap();
    assert!(system.is_tracing());
    system.run(10);

    assert_eq!(system.trace_count(), 5);
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 5);

    system.disable_tracing();
    assert!(!system.is_tracing());
    assert_eq!(system.trace_count(), 0);
}
