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

use super::super::decode::LoadKind;
use super::super::mmu::AccessKind;
use super::super::{Exception, ExceptionCause, ExecResult, COP0, CPU};
use crate::core::memory::PhysicalBus;

impl CPU {
    // === Load Instructions ===

    /// LB/LBU/LH/LHU/LW/LWU/LD/LWL/LWR/LDL/LDR/LL: Load from memory
    ///
    /// The effective address is checked for alignment before translation,
    /// so a misaligned access raises AdEL even in an unmapped page.
    ///
    /// Format: lw rt, offset(base)
    /// Operation: rt = memory[base + sign_extend(offset)]
    ///
    /// # Arguments
    ///
    /// * `kind` - Load variant (width, signedness, partial or linked)
    /// * `rt` - Destination register
    /// * `base` - Base address register
    /// * `offset` - Signed byte offset
    /// * `bus` - Physical bus
    pub(in crate::core::cpu) fn op_load<B: PhysicalBus + ?Sized>(
        &mut self,
        kind: LoadKind,
        rt: u8,
        base: u8,
        offset: i16,
        bus: &B,
    ) -> ExecResult {
        let vaddr = self.effective_address(base, offset);

        match kind {
            LoadKind::Lb => {
                let value = self.read_virtual(bus, vaddr, 1)?;
                self.set_reg(rt, value as u8 as i8 as i64 as u64);
            }
            LoadKind::Lbu => {
                let value = self.read_virtual(bus, vaddr, 1)?;
                self.set_reg(rt, value);
            }
            LoadKind::Lh => {
                let value = self.read_virtual(bus, vaddr, 2)?;
                self.set_reg(rt, value as u16 as i16 as i64 as u64);
            }
            LoadKind::Lhu => {
                let value = self.read_virtual(bus, vaddr, 2)?;
                self.set_reg(rt, value);
            }
            LoadKind::Lw => {
                let value = self.read_virtual(bus, vaddr, 4)?;
                self.set_reg32(rt, value as u32);
            }
            LoadKind::Lwu => {
                let value = self.read_virtual(bus, vaddr, 4)?;
                self.set_reg(rt, value);
            }
            LoadKind::Ld => {
                let value = self.read_virtual(bus, vaddr, 8)?;
                self.set_reg(rt, value);
            }
            LoadKind::Lwl | LoadKind::Lwr => {
                let memory = self.read_virtual(bus, vaddr & !0x3, 4)?;
                let current = self.reg(rt) as u32 as u64;
                let byte = vaddr & 0x3;
                let merged = if kind == LoadKind::Lwl {
                    merge_left(current, memory, byte, 4)
                } else {
                    merge_right(current, memory, byte, 4)
                };
                self.set_reg32(rt, merged as u32);
            }
            LoadKind::Ldl | LoadKind::Ldr => {
                let memory = self.read_virtual(bus, vaddr & !0x7, 8)?;
                let current = self.reg(rt);
                let byte = vaddr & 0x7;
                let merged = if kind == LoadKind::Ldl {
                    merge_left(current, memory, byte, 8)
                } else {
                    merge_right(current, memory, byte, 8)
                };
                self.set_reg(rt, merged);
            }
            LoadKind::Ll => {
                let value = self.read_virtual(bus, vaddr, 4)?;
                let paddr = self.translate(vaddr, AccessKind::Load)?;
                self.set_reg32(rt, value as u32);
                self.ll_bit = true;
                // LLAddr holds physical address bits 35:4
                self.cop0.write(COP0::LL_ADDR, paddr >> 4);
            }
        }

        Ok(())
    }

    /// Read `size` bytes at a virtual address, zero-extended
    pub(in crate::core::cpu) fn read_virtual<B: PhysicalBus + ?Sized>(
        &self,
        bus: &B,
        vaddr: u32,
        size: u8,
    ) -> ExecResult<u64> {
        if vaddr & (size as u32 - 1) != 0 {
            return Err(Exception::with_address(ExceptionCause::AddressErrorLoad, vaddr));
        }

        let paddr = self.translate(vaddr, AccessKind::Load)?;
        let value = match size {
            1 => bus.read8(paddr).map(u64::from),
            2 => bus.read16(paddr).map(u64::from),
            4 => bus.read32(paddr).map(u64::from),
            _ => bus.read64(paddr),
        };

        value.map_err(|fault| Self::bus_exception(fault, vaddr, AccessKind::Load))
    }
}

/// Mask covering a `width`-byte value
#[inline(always)]
pub(super) fn width_mask(width: u32) -> u64 {
    if width >= 8 {
        u64::MAX
    } else {
        (1u64 << (width * 8)) - 1
    }
}

/// LWL/LDL merge (big-endian)
///
/// The memory bytes from the addressed byte to the end of the aligned unit
/// replace the most significant bytes of the register.
#[inline(always)]
fn merge_left(register: u64, memory: u64, byte: u32, width: u32) -> u64 {
    let shift = byte * 8;
    let keep = (1u64 << shift) - 1;
    ((memory << shift) & width_mask(width)) | (register & keep)
}

/// LWR/LDR merge (big-endian)
///
/// The memory bytes from the start of the aligned unit to the addressed byte
/// replace the least significant bytes of the register.
#[inline(always)]
fn merge_right(register: u64, memory: u64, byte: u32, width: u32) -> u64 {
    let shift = (width - 1 - byte) * 8;
    let full = width_mask(width);
    let keep = full & !(full >> shift);
    (memory >> shift) | (register & keep)
}
