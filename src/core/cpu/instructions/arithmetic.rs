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

use super::super::{Exception, ExceptionCause, ExecResult, CPU};

impl CPU {
    // === Arithmetic Instructions ===

    /// ADD: Add (with overflow exception)
    ///
    /// Adds the low words of two registers with signed overflow detection.
    /// On overflow the destination is left untouched and an Overflow
    /// exception is raised.
    ///
    /// Format: add rd, rs, rt
    /// Operation: rd = sign_extend(rs + rt)
    ///
    /// # Arguments
    ///
    /// * `rs` - First source register
    /// * `rt` - Second source register
    /// * `rd` - Destination register
    pub(in crate::core::cpu) fn op_add(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let a = self.reg(rs) as i32;
        let b = self.reg(rt) as i32;

        match a.checked_add(b) {
            Some(result) => {
                self.set_reg32(rd, result as u32);
                Ok(())
            }
            None => Err(Exception::new(ExceptionCause::Overflow)),
        }
    }

    /// ADDU: Add Unsigned (no overflow exception)
    ///
    /// Format: addu rd, rs, rt
    /// Operation: rd = sign_extend(rs + rt), wrapping modulo 2^32
    pub(in crate::core::cpu) fn op_addu(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let result = (self.reg(rs) as u32).wrapping_add(self.reg(rt) as u32);
        self.set_reg32(rd, result);
        Ok(())
    }

    /// ADDI: Add Immediate (with overflow exception)
    ///
    /// Format: addi rt, rs, imm
    /// Operation: rt = sign_extend(rs + sign_extend(imm))
    pub(in crate::core::cpu) fn op_addi(&mut self, rs: u8, rt: u8, imm: i16) -> ExecResult {
        let a = self.reg(rs) as i32;

        match a.checked_add(imm as i32) {
            Some(result) => {
                self.set_reg32(rt, result as u32);
                Ok(())
            }
            None => Err(Exception::new(ExceptionCause::Overflow)),
        }
    }

    /// ADDIU: Add Immediate Unsigned (no overflow exception)
    ///
    /// Despite the name, the immediate is sign-extended.
    ///
    /// Format: addiu rt, rs, imm
    /// Operation: rt = sign_extend(rs + sign_extend(imm))
    pub(in crate::core::cpu) fn op_addiu(&mut self, rs: u8, rt: u8, imm: i16) -> ExecResult {
        let result = (self.reg(rs) as u32).wrapping_add(imm as i32 as u32);
        self.set_reg32(rt, result);
        Ok(())
    }

    /// SUB: Subtract (with overflow exception)
    ///
    /// Format: sub rd, rs, rt
    /// Operation: rd = sign_extend(rs - rt)
    pub(in crate::core::cpu) fn op_sub(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let a = self.reg(rs) as i32;
        let b = self.reg(rt) as i32;

        match a.checked_sub(b) {
            Some(result) => {
                self.set_reg32(rd, result as u32);
                Ok(())
            }
            None => Err(Exception::new(ExceptionCause::Overflow)),
        }
    }

    /// SUBU: Subtract Unsigned (no overflow exception)
    pub(in crate::core::cpu) fn op_subu(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let result = (self.reg(rs) as u32).wrapping_sub(self.reg(rt) as u32);
        self.set_reg32(rd, result);
        Ok(())
    }

    /// DADD: Doubleword Add (with overflow exception)
    ///
    /// Format: dadd rd, rs, rt
    /// Operation: rd = rs + rt (64-bit)
    pub(in crate::core::cpu) fn op_dadd(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let a = self.reg(rs) as i64;
        let b = self.reg(rt) as i64;

        match a.checked_add(b) {
            Some(result) => {
                self.set_reg(rd, result as u64);
                Ok(())
            }
            None => Err(Exception::new(ExceptionCause::Overflow)),
        }
    }

    /// DADDU: Doubleword Add Unsigned (no overflow exception)
    pub(in crate::core::cpu) fn op_daddu(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let result = self.reg(rs).wrapping_add(self.reg(rt));
        self.set_reg(rd, result);
        Ok(())
    }

    /// DADDI: Doubleword Add Immediate (with overflow exception)
    pub(in crate::core::cpu) fn op_daddi(&mut self, rs: u8, rt: u8, imm: i16) -> ExecResult {
        let a = self.reg(rs) as i64;

        match a.checked_add(imm as i64) {
            Some(result) => {
                self.set_reg(rt, result as u64);
                Ok(())
            }
            None => Err(Exception::new(ExceptionCause::Overflow)),
        }
    }

    /// DADDIU: Doubleword Add Immediate Unsigned (no overflow exception)
    pub(in crate::core::cpu) fn op_daddiu(&mut self, rs: u8, rt: u8, imm: i16) -> ExecResult {
        let result = self.reg(rs).wrapping_add(imm as i64 as u64);
        self.set_reg(rt, result);
        Ok(())
    }

    /// DSUB: Doubleword Subtract (with overflow exception)
    pub(in crate::core::cpu) fn op_dsub(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let a = self.reg(rs) as i64;
        let b = self.reg(rt) as i64;

        match a.checked_sub(b) {
            Some(result) => {
                self.set_reg(rd, result as u64);
                Ok(())
            }
            None => Err(Exception::new(ExceptionCause::Overflow)),
        }
    }

    /// DSUBU: Doubleword Subtract Unsigned (no overflow exception)
    pub(in crate::core::cpu) fn op_dsubu(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let result = self.reg(rs).wrapping_sub(self.reg(rt));
        self.set_reg(rd, result);
        Ok(())
    }

    // === Comparison Instructions ===

    /// SLT: Set on Less Than (signed)
    ///
    /// Format: slt rd, rs, rt
    /// Operation: rd = (rs < rt) ? 1 : 0
    pub(in crate::core::cpu) fn op_slt(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let result = (self.reg(rs) as i64) < (self.reg(rt) as i64);
        self.set_reg(rd, result as u64);
        Ok(())
    }

    /// SLTU: Set on Less Than Unsigned
    pub(in crate::core::cpu) fn op_sltu(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let result = self.reg(rs) < self.reg(rt);
        self.set_reg(rd, result as u64);
        Ok(())
    }

    /// SLTI: Set on Less Than Immediate (signed)
    ///
    /// Format: slti rt, rs, imm
    /// Operation: rt = (rs < sign_extend(imm)) ? 1 : 0
    pub(in crate::core::cpu) fn op_slti(&mut self, rs: u8, rt: u8, imm: i16) -> ExecResult {
        let result = (self.reg(rs) as i64) < imm as i64;
        self.set_reg(rt, result as u64);
        Ok(())
    }

    /// SLTIU: Set on Less Than Immediate Unsigned
    ///
    /// The immediate is sign-extended, then both sides compare unsigned.
    pub(in crate::core::cpu) fn op_sltiu(&mut self, rs: u8, rt: u8, imm: i16) -> ExecResult {
        let result = self.reg(rs) < imm as i64 as u64;
        self.set_reg(rt, result as u64);
        Ok(())
    }
}
