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

//! Coprocessor 0 (System Control) instructions
//!
//! Outside kernel mode every COP0 instruction requires Status.CU0.

use super::super::cop0::{Mode, Status};
use super::super::{sext32, Exception, ExecResult, COP0, CPU};

impl CPU {
    /// Check that COP0 instructions may execute in the current mode
    fn check_cop0_usable(&self) -> ExecResult {
        if self.cop0.mode() != Mode::Kernel && !self.cop0.status().contains(Status::CU0) {
            return Err(Exception::coprocessor_unusable(0));
        }
        Ok(())
    }

    /// MFC0: Move From Coprocessor 0
    ///
    /// Format: mfc0 rt, rd
    /// Operation: rt = sign_extend(cop0[rd][31:0])
    ///
    /// # Example
    ///
    /// ```text
    /// MFC0 $t0, $12  # Move Status Register to $t0
    /// ```
    pub(in crate::core::cpu) fn op_mfc0(&mut self, rt: u8, rd: u8) -> ExecResult {
        self.check_cop0_usable()?;
        let value = self.cop0.read32(rd as usize);
        self.set_reg32(rt, value);
        Ok(())
    }

    /// DMFC0: Doubleword Move From Coprocessor 0
    pub(in crate::core::cpu) fn op_dmfc0(&mut self, rt: u8, rd: u8) -> ExecResult {
        self.check_cop0_usable()?;
        let value = self.cop0.read(rd as usize);
        self.set_reg(rt, value);
        Ok(())
    }

    /// MTC0: Move To Coprocessor 0
    ///
    /// The write goes through the per-register masks and side effects of
    /// [`COP0::write`].
    ///
    /// # Example
    ///
    /// ```text
    /// MTC0 $t0, $12  # Move $t0 to Status Register
    /// ```
    pub(in crate::core::cpu) fn op_mtc0(&mut self, rt: u8, rd: u8) -> ExecResult {
        self.check_cop0_usable()?;
        let value = sext32(self.reg(rt) as u32);
        self.cop0.write(rd as usize, value);
        Ok(())
    }

    /// DMTC0: Doubleword Move To Coprocessor 0
    pub(in crate::core::cpu) fn op_dmtc0(&mut self, rt: u8, rd: u8) -> ExecResult {
        self.check_cop0_usable()?;
        let value = self.reg(rt);
        self.cop0.write(rd as usize, value);
        Ok(())
    }

    /// TLBR: Read Indexed TLB Entry
    pub(in crate::core::cpu) fn op_tlbr(&mut self) -> ExecResult {
        self.check_cop0_usable()?;
        self.tlb.read_indexed(&mut self.cop0);
        Ok(())
    }

    /// TLBWI: Write Indexed TLB Entry
    pub(in crate::core::cpu) fn op_tlbwi(&mut self) -> ExecResult {
        self.check_cop0_usable()?;
        self.tlb.write_indexed(&self.cop0);
        Ok(())
    }

    /// TLBWR: Write Random TLB Entry
    pub(in crate::core::cpu) fn op_tlbwr(&mut self) -> ExecResult {
        self.check_cop0_usable()?;
        self.tlb.write_random(&mut self.cop0);
        Ok(())
    }

    /// TLBP: Probe TLB for Matching Entry
    pub(in crate::core::cpu) fn op_tlbp(&mut self) -> ExecResult {
        self.check_cop0_usable()?;
        self.tlb.probe(&mut self.cop0);
        Ok(())
    }

    /// ERET: Exception Return
    ///
    /// Returns to ErrorEPC if Status.ERL is set (clearing ERL), otherwise to
    /// EPC (clearing EXL). ERET has no delay slot and clears the LL bit.
    pub(in crate::core::cpu) fn op_eret(&mut self) -> ExecResult {
        self.check_cop0_usable()?;

        let status = self.cop0.status();
        let target = if status.contains(Status::ERL) {
            self.cop0.set_status(status - Status::ERL);
            self.cop0.read32(COP0::ERROR_EPC)
        } else {
            self.cop0.set_status(status - Status::EXL);
            self.cop0.read32(COP0::EPC)
        };

        self.ll_bit = false;
        self.next_pc = target;
        log::trace!("ERET to 0x{:08X}", target);
        Ok(())
    }

    /// WAIT: Enter standby
    ///
    /// Treated as a no-op; the step loop keeps advancing Count, so a pending
    /// timer interrupt still arrives.
    pub(in crate::core::cpu) fn op_wait(&mut self) -> ExecResult {
        self.check_cop0_usable()?;
        Ok(())
    }
}
