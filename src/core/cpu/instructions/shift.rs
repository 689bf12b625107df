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

use super::super::{ExecResult, CPU};

impl CPU {
    // === Word Shift Instructions ===
    //
    // Word shifts operate on the low 32 bits of rt and sign-extend the
    // result. Variable shift amounts use the low 5 bits of rs.

    /// SLL: Shift Left Logical
    ///
    /// Format: sll rd, rt, sa
    /// Operation: rd = sign_extend(rt << sa)
    ///
    /// `sll $zero, $zero, 0` (0x00000000) is the canonical `nop`.
    pub(in crate::core::cpu) fn op_sll(&mut self, rt: u8, rd: u8, sa: u8) -> ExecResult {
        let result = (self.reg(rt) as u32) << (sa & 0x1F);
        self.set_reg32(rd, result);
        Ok(())
    }

    /// SRL: Shift Right Logical
    pub(in crate::core::cpu) fn op_srl(&mut self, rt: u8, rd: u8, sa: u8) -> ExecResult {
        let result = (self.reg(rt) as u32) >> (sa & 0x1F);
        self.set_reg32(rd, result);
        Ok(())
    }

    /// SRA: Shift Right Arithmetic
    pub(in crate::core::cpu) fn op_sra(&mut self, rt: u8, rd: u8, sa: u8) -> ExecResult {
        let result = ((self.reg(rt) as u32) as i32) >> (sa & 0x1F);
        self.set_reg32(rd, result as u32);
        Ok(())
    }

    /// SLLV: Shift Left Logical Variable
    pub(in crate::core::cpu) fn op_sllv(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let shift = (self.reg(rs) & 0x1F) as u32;
        self.set_reg32(rd, (self.reg(rt) as u32) << shift);
        Ok(())
    }

    /// SRLV: Shift Right Logical Variable
    pub(in crate::core::cpu) fn op_srlv(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let shift = (self.reg(rs) & 0x1F) as u32;
        self.set_reg32(rd, (self.reg(rt) as u32) >> shift);
        Ok(())
    }

    /// SRAV: Shift Right Arithmetic Variable
    pub(in crate::core::cpu) fn op_srav(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let shift = (self.reg(rs) & 0x1F) as u32;
        let result = ((self.reg(rt) as u32) as i32) >> shift;
        self.set_reg32(rd, result as u32);
        Ok(())
    }

    // === Doubleword Shift Instructions ===
    //
    // DSLL32/DSRL32/DSRA32 dispatch here with 32 added to `sa`.

    /// DSLL: Doubleword Shift Left Logical
    pub(in crate::core::cpu) fn op_dsll(&mut self, rt: u8, rd: u8, sa: u8) -> ExecResult {
        let result = self.reg(rt) << (sa & 0x3F);
        self.set_reg(rd, result);
        Ok(())
    }

    /// DSRL: Doubleword Shift Right Logical
    pub(in crate::core::cpu) fn op_dsrl(&mut self, rt: u8, rd: u8, sa: u8) -> ExecResult {
        let result = self.reg(rt) >> (sa & 0x3F);
        self.set_reg(rd, result);
        Ok(())
    }

    /// DSRA: Doubleword Shift Right Arithmetic
    pub(in crate::core::cpu) fn op_dsra(&mut self, rt: u8, rd: u8, sa: u8) -> ExecResult {
        let result = (self.reg(rt) as i64) >> (sa & 0x3F);
        self.set_reg(rd, result as u64);
        Ok(())
    }

    /// DSLLV: Doubleword Shift Left Logical Variable (low 6 bits of rs)
    pub(in crate::core::cpu) fn op_dsllv(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let shift = (self.reg(rs) & 0x3F) as u32;
        self.set_reg(rd, self.reg(rt) << shift);
        Ok(())
    }

    /// DSRLV: Doubleword Shift Right Logical Variable
    pub(in crate::core::cpu) fn op_dsrlv(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let shift = (self.reg(rs) & 0x3F) as u32;
        self.set_reg(rd, self.reg(rt) >> shift);
        Ok(())
    }

    /// DSRAV: Doubleword Shift Right Arithmetic Variable
    pub(in crate::core::cpu) fn op_dsrav(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let shift = (self.reg(rs) & 0x3F) as u32;
        let result = (self.reg(rt) as i64) >> shift;
        self.set_reg(rd, result as u64);
        Ok(())
    }
}
