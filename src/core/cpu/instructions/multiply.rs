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
    // === Multiply/Divide Instructions ===
    //
    // Word forms use the low 32 bits of each operand and leave HI and LO
    // sign-extended. None of these trap, including division by zero.

    /// MULT: Multiply (signed)
    ///
    /// Format: mult rs, rt
    /// Operation: (HI, LO) = rs * rt (signed 64-bit result)
    ///
    /// # Example
    ///
    /// ```text
    /// # 100 * 200 = 20000
    /// # LO = 20000 (0x4E20), HI = 0
    /// MULT $1, $2
    /// ```
    pub(in crate::core::cpu) fn op_mult(&mut self, rs: u8, rt: u8) -> ExecResult {
        let a = self.reg(rs) as i32 as i64;
        let b = self.reg(rt) as i32 as i64;
        let result = a * b;

        self.lo = sext32(result as u32);
        self.hi = sext32((result >> 32) as u32);
        Ok(())
    }

    /// MULTU: Multiply Unsigned
    ///
    /// # Example
    ///
    /// ```text
    /// # 0xFFFFFFFF * 2 = 0x1FFFFFFFE
    /// # LO = 0xFFFFFFFFFFFFFFFE, HI = 1
    /// MULTU $1, $2
    /// ```
    pub(in crate::core::cpu) fn op_multu(&mut self, rs: u8, rt: u8) -> ExecResult {
        let a = self.reg(rs) as u32 as u64;
        let b = self.reg(rt) as u32 as u64;
        let result = a * b;

        self.lo = sext32(result as u32);
        self.hi = sext32((result >> 32) as u32);
        Ok(())
    }

    /// DIV: Divide (signed)
    ///
    /// Format: div rs, rt
    /// Operation: LO = rs / rt (quotient), HI = rs % rt (remainder)
    ///
    /// # Special Cases
    ///
    /// * Division by zero: LO = -1 or 1 (based on sign), HI = numerator
    /// * Overflow (0x80000000 / -1): LO = 0x80000000, HI = 0
    pub(in crate::core::cpu) fn op_div(&mut self, rs: u8, rt: u8) -> ExecResult {
        let numerator = self.reg(rs) as i32;
        let denominator = self.reg(rt) as i32;

        let (quotient, remainder) = if denominator == 0 {
            (if numerator >= 0 { -1 } else { 1 }, numerator)
        } else if numerator == i32::MIN && denominator == -1 {
            (i32::MIN, 0)
        } else {
            (numerator / denominator, numerator % denominator)
        };

        self.lo = sext32(quotient as u32);
        self.hi = sext32(remainder as u32);
        Ok(())
    }

    /// DIVU: Divide Unsigned
    ///
    /// # Special Cases
    ///
    /// * Division by zero: LO = 0xFFFFFFFF, HI = numerator
    pub(in crate::core::cpu) fn op_divu(&mut self, rs: u8, rt: u8) -> ExecResult {
        let numerator = self.reg(rs) as u32;
        let denominator = self.reg(rt) as u32;

        let (quotient, remainder) = if denominator == 0 {
            (0xFFFF_FFFF, numerator)
        } else {
            (numerator / denominator, numerator % denominator)
        };

        self.lo = sext32(quotient);
        self.hi = sext32(remainder);
        Ok(())
    }

    /// DMULT: Doubleword Multiply (signed, 128-bit result)
    pub(in crate::core::cpu) fn op_dmult(&mut self, rs: u8, rt: u8) -> ExecResult {
        let a = self.reg(rs) as i64 as i128;
        let b = self.reg(rt) as i64 as i128;
        let result = a * b;

        self.lo = result as u64;
        self.hi = (result >> 64) as u64;
        Ok(())
    }

    /// DMULTU: Doubleword Multiply Unsigned (128-bit result)
    pub(in crate::core::cpu) fn op_dmultu(&mut self, rs: u8, rt: u8) -> ExecResult {
        let a = self.reg(rs) as u128;
        let b = self.reg(rt) as u128;
        let result = a * b;

        self.lo = result as u64;
        self.hi = (result >> 64) as u64;
        Ok(())
    }

    /// DDIV: Doubleword Divide (signed)
    ///
    /// Same special cases as DIV, at 64-bit width.
    pub(in crate::core::cpu) fn op_ddiv(&mut self, rs: u8, rt: u8) -> ExecResult {
        let numerator = self.reg(rs) as i64;
        let denominator = self.reg(rt) as i64;

        let (quotient, remainder) = if denominator == 0 {
            (if numerator >= 0 { -1 } else { 1 }, numerator)
        } else if numerator == i64::MIN && denominator == -1 {
            (i64::MIN, 0)
        } else {
            (numerator / denominator, numerator % denominator)
        };

        self.lo = quotient as u64;
        self.hi = remainder as u64;
        Ok(())
    }

    /// DDIVU: Doubleword Divide Unsigned
    pub(in crate::core::cpu) fn op_ddivu(&mut self, rs: u8, rt: u8) -> ExecResult {
        let numerator = self.reg(rs);
        let denominator = self.reg(rt);

        let (quotient, remainder) = if denominator == 0 {
            (u64::MAX, numerator)
        } else {
            (numerator / denominator, numerator % denominator)
        };

        self.lo = quotient;
        self.hi = remainder;
        Ok(())
    }

    // === HI/LO Move Instructions ===

    /// MFHI: Move From HI
    pub(in crate::core::cpu) fn op_mfhi(&mut self, rd: u8) -> ExecResult {
        self.set_reg(rd, self.hi);
        Ok(())
    }

    /// MTHI: Move To HI
    pub(in crate::core::cpu) fn op_mthi(&mut self, rs: u8) -> ExecResult {
        self.hi = self.reg(rs);
        Ok(())
    }

    /// MFLO: Move From LO
    pub(in crate::core::cpu) fn op_mflo(&mut self, rd: u8) -> ExecResult {
        self.set_reg(rd, self.lo);
        Ok(())
    }

    /// MTLO: Move To LO
    pub(in crate::core::cpu) fn op_mtlo(&mut self, rs: u8) -> ExecResult {
        self.lo = self.reg(rs);
        Ok(())
    }
}
