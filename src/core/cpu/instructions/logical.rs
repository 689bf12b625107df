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

use super::super::{sext32, ExecResult, CPU};

impl CPU {
    // === Logical Instructions ===

    /// AND: Bitwise AND
    ///
    /// Format: and rd, rs, rt
    /// Operation: rd = rs & rt
    pub(in crate::core::cpu) fn op_and(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let result = self.reg(rs) & self.reg(rt);
        self.set_reg(rd, result);
        Ok(())
    }

    /// OR: Bitwise OR
    ///
    /// `or rd, rs, $zero` is the canonical `move`.
    pub(in crate::core::cpu) fn op_or(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let result = self.reg(rs) | self.reg(rt);
        self.set_reg(rd, result);
        Ok(())
    }

    /// XOR: Bitwise exclusive OR
    pub(in crate::core::cpu) fn op_xor(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let result = self.reg(rs) ^ self.reg(rt);
        self.set_reg(rd, result);
        Ok(())
    }

    /// NOR: Bitwise NOR
    ///
    /// `nor rd, rs, $zero` is the canonical `not`.
    pub(in crate::core::cpu) fn op_nor(&mut self, rs: u8, rt: u8, rd: u8) -> ExecResult {
        let result = !(self.reg(rs) | self.reg(rt));
        self.set_reg(rd, result);
        Ok(())
    }

    /// ANDI: AND Immediate (zero-extended)
    ///
    /// Format: andi rt, rs, imm
    /// Operation: rt = rs & zero_extend(imm)
    pub(in crate::core::cpu) fn op_andi(&mut self, rs: u8, rt: u8, imm: u16) -> ExecResult {
        let result = self.reg(rs) & imm as u64;
        self.set_reg(rt, result);
        Ok(())
    }

    /// ORI: OR Immediate (zero-extended)
    pub(in crate::core::cpu) fn op_ori(&mut self, rs: u8, rt: u8, imm: u16) -> ExecResult {
        let result = self.reg(rs) | imm as u64;
        self.set_reg(rt, result);
        Ok(())
    }

    /// XORI: XOR Immediate (zero-extended)
    pub(in crate::core::cpu) fn op_xori(&mut self, rs: u8, rt: u8, imm: u16) -> ExecResult {
        let result = self.reg(rs) ^ imm as u64;
        self.set_reg(rt, result);
        Ok(())
    }

    /// LUI: Load Upper Immediate
    ///
    /// Format: lui rt, imm
    /// Operation: rt = sign_extend(imm << 16)
    ///
    /// # Example
    ///
    /// ```text
    /// LUI $t0, 0x8000  # $t0 = 0xFFFFFFFF80000000
    /// ```
    pub(in crate::core::cpu) fn op_lui(&mut self, rt: u8, imm: u16) -> ExecResult {
        self.set_reg(rt, sext32((imm as u32) << 16));
        Ok(())
    }
}
