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

//! Exception-triggering instructions

use super::super::decode::TrapCond;
use super::super::{Exception, ExceptionCause, ExecResult, CPU};

impl CPU {
    /// SYSCALL: System Call
    ///
    /// Always raises a Syscall exception. The code field is left for the
    /// handler to read back from the instruction at EPC.
    pub(in crate::core::cpu) fn op_syscall(&mut self) -> ExecResult {
        Err(Exception::new(ExceptionCause::Syscall))
    }

    /// BREAK: Breakpoint
    ///
    /// Always raises a Breakpoint exception.
    pub(in crate::core::cpu) fn op_break(&mut self) -> ExecResult {
        Err(Exception::new(ExceptionCause::Breakpoint))
    }

    /// TGE/TGEU/TLT/TLTU/TEQ/TNE and their immediate forms
    ///
    /// Raises a Trap exception when the condition holds. Immediate forms
    /// pass the sign-extended immediate as `b`; the unsigned conditions
    /// compare it unsigned.
    ///
    /// # Example
    ///
    /// ```text
    /// TEQ $a0, $zero  # trap if $a0 == 0
    /// ```
    pub(in crate::core::cpu) fn op_trap(&mut self, cond: TrapCond, a: u64, b: u64) -> ExecResult {
        let trap = match cond {
            TrapCond::Ge => (a as i64) >= (b as i64),
            TrapCond::Geu => a >= b,
            TrapCond::Lt => (a as i64) < (b as i64),
            TrapCond::Ltu => a < b,
            TrapCond::Eq => a == b,
            TrapCond::Ne => a != b,
        };

        if trap {
            Err(Exception::new(ExceptionCause::Trap))
        } else {
            Ok(())
        }
    }
}
