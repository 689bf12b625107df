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
    // === Branch Instructions ===
    //
    // A taken branch is queued and applied after the delay slot retires.
    // Branch-likely forms annul the delay slot when not taken. Linking forms
    // write the return address (branch + 8) whether or not they are taken.

    /// BLTZ / BLTZL / BLTZAL / BLTZALL: Branch on Less Than Zero
    ///
    /// Format: bltz rs, offset
    /// Operation: if (rs < 0) PC = PC + 4 + (sign_extend(offset) << 2)
    ///
    /// # Arguments
    ///
    /// * `rs` - Register to test
    /// * `offset` - Word offset relative to the delay slot
    /// * `link` - Write the return address to r31
    /// * `likely` - Annul the delay slot when not taken
    pub(in crate::core::cpu) fn op_bltz(
        &mut self,
        rs: u8,
        offset: i16,
        link: bool,
        likely: bool,
    ) -> ExecResult {
        let taken = (self.reg(rs) as i64) < 0;
        if link {
            self.link(31);
        }
        self.conditional_branch(taken, offset, likely);
        Ok(())
    }

    /// BGEZ / BGEZL / BGEZAL / BGEZALL: Branch on Greater Than or Equal to Zero
    ///
    /// `bgezal $zero, offset` is the canonical `bal`.
    pub(in crate::core::cpu) fn op_bgez(
        &mut self,
        rs: u8,
        offset: i16,
        link: bool,
        likely: bool,
    ) -> ExecResult {
        let taken = (self.reg(rs) as i64) >= 0;
        if link {
            self.link(31);
        }
        self.conditional_branch(taken, offset, likely);
        Ok(())
    }

    /// BEQ / BEQL: Branch on Equal
    ///
    /// Format: beq rs, rt, offset
    /// Operation: if (rs == rt) PC = PC + 4 + (sign_extend(offset) << 2)
    pub(in crate::core::cpu) fn op_beq(
        &mut self,
        rs: u8,
        rt: u8,
        offset: i16,
        likely: bool,
    ) -> ExecResult {
        let taken = self.reg(rs) == self.reg(rt);
        self.conditional_branch(taken, offset, likely);
        Ok(())
    }

    /// BNE / BNEL: Branch on Not Equal
    pub(in crate::core::cpu) fn op_bne(
        &mut self,
        rs: u8,
        rt: u8,
        offset: i16,
        likely: bool,
    ) -> ExecResult {
        let taken = self.reg(rs) != self.reg(rt);
        self.conditional_branch(taken, offset, likely);
        Ok(())
    }

    /// BLEZ / BLEZL: Branch on Less Than or Equal to Zero (signed)
    pub(in crate::core::cpu) fn op_blez(
        &mut self,
        rs: u8,
        offset: i16,
        likely: bool,
    ) -> ExecResult {
        let taken = (self.reg(rs) as i64) <= 0;
        self.conditional_branch(taken, offset, likely);
        Ok(())
    }

    /// BGTZ / BGTZL: Branch on Greater Than Zero (signed)
    pub(in crate::core::cpu) fn op_bgtz(
        &mut self,
        rs: u8,
        offset: i16,
        likely: bool,
    ) -> ExecResult {
        let taken = (self.reg(rs) as i64) > 0;
        self.conditional_branch(taken, offset, likely);
        Ok(())
    }

    fn conditional_branch(&mut self, taken: bool, offset: i16, likely: bool) {
        if taken {
            self.branch(offset);
        } else if likely {
            self.nullify_delay_slot();
        }
    }

    /// Write the return address (the instruction after the delay slot)
    pub(in crate::core::cpu) fn link(&mut self, rd: u8) {
        let return_address = self.pc.wrapping_add(8);
        self.set_reg(rd, sext32(return_address));
    }

    /// Queue a PC-relative branch
    ///
    /// The offset is relative to the address of the delay slot (B + 4),
    /// where B is the branch instruction address held in `pc`.
    pub(in crate::core::cpu) fn branch(&mut self, offset: i16) {
        let offset = (offset as i32) << 2;
        let target = self.pc.wrapping_add(4).wrapping_add(offset as u32);
        self.branch_to(target);
    }

    /// Queue an absolute branch, taken after the delay slot
    pub(in crate::core::cpu) fn branch_to(&mut self, target: u32) {
        self.branch_request = Some(target);
    }

    /// Skip the delay slot (branch-likely not taken)
    pub(in crate::core::cpu) fn nullify_delay_slot(&mut self) {
        self.next_pc = self.pc.wrapping_add(8);
    }
}
