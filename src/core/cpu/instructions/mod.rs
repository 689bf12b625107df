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

//! CPU instruction implementations
//!
//! This module contains all MIPS III integer instruction implementations,
//! organized by instruction type. Every handler returns an [`ExecResult`];
//! an `Err` is a guest exception that the step loop delivers through CP0.

use super::decode::{decode, Instruction};
use super::mmu::{AccessKind, TranslationFault};
use super::{Exception, ExceptionCause, ExecResult, CPU};
use crate::core::memory::{BusFault, PhysicalBus};

// Instruction modules organized by type
mod arithmetic;
mod branch;
mod cop0;
mod exception;
mod jump;
mod load;
mod logical;
mod multiply;
mod shift;
mod store;

impl CPU {
    /// Fetch, decode and execute the instruction at `pc`
    pub(super) fn execute_next<B: PhysicalBus + ?Sized>(&mut self, bus: &mut B) -> ExecResult {
        let pc = self.pc;
        if pc & 0x3 != 0 {
            return Err(Exception::with_address(ExceptionCause::AddressErrorLoad, pc));
        }

        let paddr = self.translate(pc, AccessKind::Fetch)?;
        self.current_instruction = bus
            .fetch32(paddr)
            .map_err(|fault| Self::bus_exception(fault, pc, AccessKind::Fetch))?;

        let instruction = decode(self.current_instruction).map_err(|err| {
            log::warn!("{} at PC=0x{:08X}", err, pc);
            Exception::new(ExceptionCause::ReservedInstruction)
        })?;

        self.execute(instruction, bus)
    }

    /// Dispatch a decoded instruction to its handler
    pub(super) fn execute<B: PhysicalBus + ?Sized>(
        &mut self,
        instruction: Instruction,
        bus: &mut B,
    ) -> ExecResult {
        use Instruction::*;

        match instruction {
            Sll { rd, rt, sa } => self.op_sll(rt, rd, sa),
            Srl { rd, rt, sa } => self.op_srl(rt, rd, sa),
            Sra { rd, rt, sa } => self.op_sra(rt, rd, sa),
            Sllv { rd, rt, rs } => self.op_sllv(rs, rt, rd),
            Srlv { rd, rt, rs } => self.op_srlv(rs, rt, rd),
            Srav { rd, rt, rs } => self.op_srav(rs, rt, rd),
            Dsll { rd, rt, sa } => self.op_dsll(rt, rd, sa),
            Dsrl { rd, rt, sa } => self.op_dsrl(rt, rd, sa),
            Dsra { rd, rt, sa } => self.op_dsra(rt, rd, sa),
            Dsll32 { rd, rt, sa } => self.op_dsll(rt, rd, sa + 32),
            Dsrl32 { rd, rt, sa } => self.op_dsrl(rt, rd, sa + 32),
            Dsra32 { rd, rt, sa } => self.op_dsra(rt, rd, sa + 32),
            Dsllv { rd, rt, rs } => self.op_dsllv(rs, rt, rd),
            Dsrlv { rd, rt, rs } => self.op_dsrlv(rs, rt, rd),
            Dsrav { rd, rt, rs } => self.op_dsrav(rs, rt, rd),

            Jr { rs } => self.op_jr(rs),
            Jalr { rd, rs } => self.op_jalr(rs, rd),

            Syscall { .. } => self.op_syscall(),
            Break { .. } => self.op_break(),
            Sync => Ok(()),

            Mfhi { rd } => self.op_mfhi(rd),
            Mthi { rs } => self.op_mthi(rs),
            Mflo { rd } => self.op_mflo(rd),
            Mtlo { rs } => self.op_mtlo(rs),
            Mult { rs, rt } => self.op_mult(rs, rt),
            Multu { rs, rt } => self.op_multu(rs, rt),
            Div { rs, rt } => self.op_div(rs, rt),
            Divu { rs, rt } => self.op_divu(rs, rt),
            Dmult { rs, rt } => self.op_dmult(rs, rt),
            Dmultu { rs, rt } => self.op_dmultu(rs, rt),
            Ddiv { rs, rt } => self.op_ddiv(rs, rt),
            Ddivu { rs, rt } => self.op_ddivu(rs, rt),

            Add { rd, rs, rt } => self.op_add(rs, rt, rd),
            Addu { rd, rs, rt } => self.op_addu(rs, rt, rd),
            Sub { rd, rs, rt } => self.op_sub(rs, rt, rd),
            Subu { rd, rs, rt } => self.op_subu(rs, rt, rd),
            And { rd, rs, rt } => self.op_and(rs, rt, rd),
            Or { rd, rs, rt } => self.op_or(rs, rt, rd),
            Xor { rd, rs, rt } => self.op_xor(rs, rt, rd),
            Nor { rd, rs, rt } => self.op_nor(rs, rt, rd),
            Slt { rd, rs, rt } => self.op_slt(rs, rt, rd),
            Sltu { rd, rs, rt } => self.op_sltu(rs, rt, rd),
            Dadd { rd, rs, rt } => self.op_dadd(rs, rt, rd),
            Daddu { rd, rs, rt } => self.op_daddu(rs, rt, rd),
            Dsub { rd, rs, rt } => self.op_dsub(rs, rt, rd),
            Dsubu { rd, rs, rt } => self.op_dsubu(rs, rt, rd),

            Trap { cond, rs, rt } => self.op_trap(cond, self.reg(rs), self.reg(rt)),
            TrapImm { cond, rs, imm } => self.op_trap(cond, self.reg(rs), imm as i64 as u64),

            Bltz {
                rs,
                offset,
                link,
                likely,
            } => self.op_bltz(rs, offset, link, likely),
            Bgez {
                rs,
                offset,
                link,
                likely,
            } => self.op_bgez(rs, offset, link, likely),
            Beq {
                rs,
                rt,
                offset,
                likely,
            } => self.op_beq(rs, rt, offset, likely),
            Bne {
                rs,
                rt,
                offset,
                likely,
            } => self.op_bne(rs, rt, offset, likely),
            Blez { rs, offset, likely } => self.op_blez(rs, offset, likely),
            Bgtz { rs, offset, likely } => self.op_bgtz(rs, offset, likely),

            J { target } => self.op_j(target),
            Jal { target } => self.op_jal(target),

            Addi { rt, rs, imm } => self.op_addi(rs, rt, imm),
            Addiu { rt, rs, imm } => self.op_addiu(rs, rt, imm),
            Daddi { rt, rs, imm } => self.op_daddi(rs, rt, imm),
            Daddiu { rt, rs, imm } => self.op_daddiu(rs, rt, imm),
            Slti { rt, rs, imm } => self.op_slti(rs, rt, imm),
            Sltiu { rt, rs, imm } => self.op_sltiu(rs, rt, imm),
            Andi { rt, rs, imm } => self.op_andi(rs, rt, imm),
            Ori { rt, rs, imm } => self.op_ori(rs, rt, imm),
            Xori { rt, rs, imm } => self.op_xori(rs, rt, imm),
            Lui { rt, imm } => self.op_lui(rt, imm),

            Load {
                kind,
                rt,
                base,
                offset,
            } => self.op_load(kind, rt, base, offset, &*bus),
            Store {
                kind,
                rt,
                base,
                offset,
            } => self.op_store(kind, rt, base, offset, bus),
            Cache => Ok(()),

            Mfc0 { rt, rd } => self.op_mfc0(rt, rd),
            Dmfc0 { rt, rd } => self.op_dmfc0(rt, rd),
            Mtc0 { rt, rd } => self.op_mtc0(rt, rd),
            Dmtc0 { rt, rd } => self.op_dmtc0(rt, rd),
            Tlbr => self.op_tlbr(),
            Tlbwi => self.op_tlbwi(),
            Tlbwr => self.op_tlbwr(),
            Tlbp => self.op_tlbp(),
            Eret => self.op_eret(),
            Wait => self.op_wait(),

            Coprocessor { unit } => Err(Exception::coprocessor_unusable(unit)),
        }
    }

    /// Translate a virtual address, mapping MMU faults to guest exceptions
    pub(super) fn translate(&self, vaddr: u32, access: AccessKind) -> ExecResult<u64> {
        self.tlb
            .translate(vaddr, access, &self.cop0)
            .map_err(|fault| {
                let (tlb_cause, address_cause) = match access {
                    AccessKind::Fetch | AccessKind::Load => {
                        (ExceptionCause::TlbLoad, ExceptionCause::AddressErrorLoad)
                    }
                    AccessKind::Store => {
                        (ExceptionCause::TlbStore, ExceptionCause::AddressErrorStore)
                    }
                };
                match fault {
                    TranslationFault::Refill => Exception::refill(tlb_cause, vaddr),
                    TranslationFault::Invalid => Exception::with_address(tlb_cause, vaddr),
                    TranslationFault::Modified => {
                        Exception::with_address(ExceptionCause::TlbModified, vaddr)
                    }
                    TranslationFault::AddressError => Exception::with_address(address_cause, vaddr),
                }
            })
    }

    /// Map a physical bus fault to the guest exception for `access`
    pub(super) fn bus_exception(fault: BusFault, vaddr: u32, access: AccessKind) -> Exception {
        let cause = match (fault, access) {
            (BusFault::Unmapped { .. }, AccessKind::Fetch) => ExceptionCause::BusErrorInstruction,
            (BusFault::Unmapped { .. }, _) => ExceptionCause::BusErrorData,
            (BusFault::Misaligned { .. }, AccessKind::Store) => ExceptionCause::AddressErrorStore,
            (BusFault::Misaligned { .. }, _) => ExceptionCause::AddressErrorLoad,
        };
        log::debug!("Bus fault: {} (vaddr 0x{:08X})", fault, vaddr);
        Exception::with_address(cause, vaddr)
    }

    /// Effective address: base register plus sign-extended offset
    ///
    /// Addressing is 32-bit, so only the low word of the sum is used.
    #[inline(always)]
    pub(super) fn effective_address(&self, base: u8, offset: i16) -> u32 {
        self.reg(base).wrapping_add(offset as i64 as u64) as u32
    }
}
