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

//! CPU test modules
//!
//! Tests are organized into the following categories:
//! - `basic`: CPU initialization, reset, register access, PC handling
//! - `decode`: Instruction decoding
//! - `delay_slot`: Branch delay slots, links and branch-likely annulment
//! - `exceptions`: Exception entry, vectors, EPC/BD, bus and address errors
//! - `cop0`: COP0 register masks, the timer and COP0 instructions
//! - `tlb`: TLB maintenance and mapped translation
//! - `instructions`: Instruction semantics

mod instructions;

use super::*;
use crate::core::memory::{Bus, PhysicalBus};

/// Physical address test programs are placed at
pub(super) const CODE_BASE: u64 = 0x1000;

/// KSEG0 address of `CODE_BASE`
pub(super) const CODE_VADDR: u32 = 0x8000_1000;

pub(super) fn test_cpu() -> CPU {
    CPU::new(&MachineConfig::default()).unwrap()
}

/// CPU positioned at `CODE_VADDR` with `program` in RAM behind it
pub(super) fn setup(program: &[u32]) -> (CPU, Bus) {
    let mut cpu = test_cpu();
    let mut bus = Bus::new();
    load_program(&mut bus, CODE_BASE, program);
    cpu.set_pc(CODE_VADDR);
    (cpu, bus)
}

pub(super) fn load_program(bus: &mut Bus, paddr: u64, program: &[u32]) {
    for (i, word) in program.iter().enumerate() {
        bus.write32(paddr + (i as u64) * 4, *word).unwrap();
    }
}

/// Step `n` times, asserting every step retires
pub(super) fn run(cpu: &mut CPU, bus: &mut Bus, n: usize) {
    for _ in 0..n {
        let event = cpu.step(bus);
        assert_eq!(
            event,
            StepEvent::Retired,
            "unexpected exception at 0x{:08X}",
            cpu.pc()
        );
    }
}

/// Clear Status.BEV so exceptions use the RAM vectors at 0x80000000
pub(super) fn clear_bev(cpu: &mut CPU) {
    let status = cpu.cop0().status() - Status::BEV;
    cpu.cop0_mut().write(COP0::STATUS, status.bits() as u64);
}

/// Install a TLB entry through the staging registers and TLBWI
pub(super) fn map_pair(
    cpu: &mut CPU,
    index: u32,
    entry_hi: u32,
    lo0: u32,
    lo1: u32,
    page_mask: u32,
) {
    let cop0 = cpu.cop0_mut();
    cop0.write(COP0::INDEX, index as u64);
    cop0.write(COP0::ENTRY_HI, entry_hi as u64);
    cop0.write(COP0::ENTRY_LO0, lo0 as u64);
    cop0.write(COP0::ENTRY_LO1, lo1 as u64);
    cop0.write(COP0::PAGE_MASK, page_mask as u64);
    cpu.op_tlbwi().unwrap();
}

/// EntryLo value for `pfn` with the given D and V bits
pub(super) fn entry_lo(pfn: u32, dirty: bool, valid: bool) -> u32 {
    (pfn << 6) | (2 << 3) | ((dirty as u32) << 2) | ((valid as u32) << 1)
}

/// Instruction encoders for test programs
pub(super) mod asm {
    pub const NOP: u32 = 0;

    fn r(funct: u32, rs: u8, rt: u8, rd: u8, sa: u8) -> u32 {
        ((rs as u32) << 21) | ((rt as u32) << 16) | ((rd as u32) << 11) | ((sa as u32) << 6) | funct
    }

    fn i(op: u32, rs: u8, rt: u8, imm: u16) -> u32 {
        (op << 26) | ((rs as u32) << 21) | ((rt as u32) << 16) | imm as u32
    }

    pub fn lui(rt: u8, imm: u16) -> u32 {
        i(0x0F, 0, rt, imm)
    }

    pub fn addi(rt: u8, rs: u8, imm: i16) -> u32 {
        i(0x08, rs, rt, imm as u16)
    }

    pub fn addiu(rt: u8, rs: u8, imm: i16) -> u32 {
        i(0x09, rs, rt, imm as u16)
    }

    pub fn ori(rt: u8, rs: u8, imm: u16) -> u32 {
        i(0x0D, rs, rt, imm)
    }

    pub fn add(rd: u8, rs: u8, rt: u8) -> u32 {
        r(0x20, rs, rt, rd, 0)
    }

    pub fn lw(rt: u8, base: u8, offset: i16) -> u32 {
        i(0x23, base, rt, offset as u16)
    }

    pub fn sw(rt: u8, base: u8, offset: i16) -> u32 {
        i(0x2B, base, rt, offset as u16)
    }

    pub fn beq(rs: u8, rt: u8, offset: i16) -> u32 {
        i(0x04, rs, rt, offset as u16)
    }

    pub fn bne(rs: u8, rt: u8, offset: i16) -> u32 {
        i(0x05, rs, rt, offset as u16)
    }

    pub fn beql(rs: u8, rt: u8, offset: i16) -> u32 {
        i(0x14, rs, rt, offset as u16)
    }

    pub fn j(target: u32) -> u32 {
        (0x02 << 26) | ((target >> 2) & 0x03FF_FFFF)
    }

    pub fn jal(target: u32) -> u32 {
        (0x03 << 26) | ((target >> 2) & 0x03FF_FFFF)
    }

    pub fn jr(rs: u8) -> u32 {
        r(0x08, rs, 0, 0, 0)
    }

    pub fn jalr(rd: u8, rs: u8) -> u32 {
        r(0x09, rs, 0, rd, 0)
    }

    pub fn syscall() -> u32 {
        0x0000_000C
    }

    pub fn mfc0(rt: u8, rd: u8) -> u32 {
        0x4000_0000 | ((rt as u32) << 16) | ((rd as u32) << 11)
    }

    pub fn mtc0(rt: u8, rd: u8) -> u32 {
        0x4080_0000 | ((rt as u32) << 16) | ((rd as u32) << 11)
    }

    pub const TLBR: u32 = 0x4200_0001;
    pub const TLBWI: u32 = 0x4200_0002;
    pub const TLBWR: u32 = 0x4200_0006;
    pub const TLBP: u32 = 0x4200_0008;
    pub const ERET: u32 = 0x4200_0018;
}
