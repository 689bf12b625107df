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

use super::super::decode::StoreKind;
use super::super::mmu::AccessKind;
use super::super::{Exception, ExceptionCause, ExecResult, CPU};
use super::load::width_mask;
use crate::core::memory::PhysicalBus;

impl CPU {
    // === Store Instructions ===

    /// SB/SH/SW/SD/SWL/SWR/SDL/SDR/SC: Store to memory
    ///
    /// Stores go through the MMU with store access, so a clean page raises
    /// TLB Modified.
    ///
    /// Format: sw rt, offset(base)
    /// Operation: memory[base + sign_extend(offset)] = rt
    pub(in crate::core::cpu) fn op_store<B: PhysicalBus + ?Sized>(
        &mut self,
        kind: StoreKind,
        rt: u8,
        base: u8,
        offset: i16,
        bus: &mut B,
    ) -> ExecResult {
        let vaddr = self.effective_address(base, offset);
        let value = self.reg(rt);

        match kind {
            StoreKind::Sb => self.write_virtual(bus, vaddr, 1, value),
            StoreKind::Sh => self.write_virtual(bus, vaddr, 2, value),
            StoreKind::Sw => self.write_virtual(bus, vaddr, 4, value),
            StoreKind::Sd => self.write_virtual(bus, vaddr, 8, value),
            StoreKind::Swl | StoreKind::Swr => {
                let aligned = vaddr & !0x3;
                let paddr = self.translate(aligned, AccessKind::Store)?;
                let memory = bus
                    .read32(paddr)
                    .map_err(|fault| Self::bus_exception(fault, vaddr, AccessKind::Store))?;
                let byte = vaddr & 0x3;
                let merged = if kind == StoreKind::Swl {
                    merge_left(value, memory as u64, byte, 4)
                } else {
                    merge_right(value, memory as u64, byte, 4)
                };
                bus.write32(paddr, merged as u32)
                    .map_err(|fault| Self::bus_exception(fault, vaddr, AccessKind::Store))
            }
            StoreKind::Sdl | StoreKind::Sdr => {
                let aligned = vaddr & !0x7;
                let paddr = self.translate(aligned, AccessKind::Store)?;
                let memory = bus
                    .read64(paddr)
                    .map_err(|fault| Self::bus_exception(fault, vaddr, AccessKind::Store))?;
                let byte = vaddr & 0x7;
                let merged = if kind == StoreKind::Sdl {
                    merge_left(value, memory, byte, 8)
                } else {
                    merge_right(value, memory, byte, 8)
                };
                bus.write64(paddr, merged)
                    .map_err(|fault| Self::bus_exception(fault, vaddr, AccessKind::Store))
            }
            StoreKind::Sc => {
                if self.ll_bit {
                    self.write_virtual(bus, vaddr, 4, value)?;
                    self.set_reg(rt, 1);
                } else {
                    self.set_reg(rt, 0);
                }
                Ok(())
            }
        }
    }

    /// Write the low `size` bytes of `value` at a virtual address
    pub(in crate::core::cpu) fn write_virtual<B: PhysicalBus + ?Sized>(
        &mut self,
        bus: &mut B,
        vaddr: u32,
        size: u8,
        value: u64,
    ) -> ExecResult {
        if vaddr & (size as u32 - 1) != 0 {
            return Err(Exception::with_address(ExceptionCause::AddressErrorStore, vaddr));
        }

        let paddr = self.translate(vaddr, AccessKind::Store)?;
        let result = match size {
            1 => bus.write8(paddr, value as u8),
            2 => bus.write16(paddr, value as u16),
            4 => bus.write32(paddr, value as u32),
            _ => bus.write64(paddr, value),
        };

        result.map_err(|fault| Self::bus_exception(fault, vaddr, AccessKind::Store))
    }
}

/// SWL/SDL merge (big-endian)
///
/// The most significant register bytes are stored from the addressed byte
/// to the end of the aligned unit.
#[inline(always)]
fn merge_left(register: u64, memory: u64, byte: u32, width: u32) -> u64 {
    let shift = byte * 8;
    let full = width_mask(width);
    (memory & full & !(full >> shift)) | ((register & full) >> shift)
}

/// SWR/SDR merge (big-endian)
///
/// The least significant register bytes are stored from the start of the
/// aligned unit to the addressed byte.
#[inline(always)]
fn merge_right(register: u64, memory: u64, byte: u32, width: u32) -> u64 {
    let shift = (width - 1 - byte) * 8;
    let keep = (1u64 << shift) - 1;
    ((register << shift) & width_mask(width)) | (memory & keep)
}
