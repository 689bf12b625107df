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
    // === Jump Instructions ===

    /// J: Jump
    ///
    /// The target address is formed by combining the upper 4 bits of the
    /// delay slot address with the 26-bit target field shifted left by 2.
    ///
    /// Format: j target
    /// Operation: PC = ((PC + 4) & 0xF0000000) | (target << 2)
    pub(in crate::core::cpu) fn op_j(&mut self, target: u32) -> ExecResult {
        let region = self.pc.wrapping_add(4) & 0xF000_0000;
        self.branch_to(region | (target << 2));
        Ok(())
    }

    /// JAL: Jump and Link
    ///
    /// Format: jal target
    /// Operation: r31 = PC + 8; PC = ((PC + 4) & 0xF0000000) | (target << 2)
    pub(in crate::core::cpu) fn op_jal(&mut self, target: u32) -> ExecResult {
        self.link(31);
        self.op_j(target)
    }

    /// JR: Jump Register
    ///
    /// A misaligned target is not checked here; it faults when fetched.
    ///
    /// Format: jr rs
    /// Operation: PC = rs
    pub(in crate::core::cpu) fn op_jr(&mut self, rs: u8) -> ExecResult {
        let target = self.reg(rs) as u32;
        self.branch_to(target);
        Ok(())
    }

    /// JALR: Jump And Link Register
    ///
    /// Format: jalr rd, rs
    /// Operation: rd = PC + 8; PC = rs
    ///
    /// # Arguments
    ///
    /// * `rs` - Source register containing target address
    /// * `rd` - Destination register for return address (r31 if encoded as 0)
    pub(in crate::core::cpu) fn op_jalr(&mut self, rs: u8, rd: u8) -> ExecResult {
        // Target is read before the link in case rd == rs
        let target = self.reg(rs) as u32;
        let rd = if rd == 0 { 31 } else { rd };
        self.link(rd);
        self.branch_to(target);
        Ok(())
    }
}
