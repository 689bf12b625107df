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

//! Memory-mapped I/O device trait
//!
//! The bus dispatches any physical address that is neither RAM nor PROM to
//! the first registered device whose range contains it. Devices only see
//! device-relative offsets.
//!
//! # Example
//!
//! ```
//! use speedracer::core::memory::{BusResult, IODevice};
//!
//! struct Scratch {
//!     base: u64,
//!     registers: [u32; 4],
//! }
//!
//! impl IODevice for Scratch {
//!     fn address_range(&self) -> (u64, u64) {
//!         (self.base, self.base + 0x0F)
//!     }
//!
//!     fn read_register(&self, offset: u64) -> BusResult<u32> {
//!         Ok(self.registers[(offset / 4) as usize])
//!     }
//!
//!     fn write_register(&mut self, offset: u64, value: u32) -> BusResult<()> {
//!         self.registers[(offset / 4) as usize] = value;
//!         Ok(())
//!     }
//! }
//! ```

use super::BusResult;

/// Trait for memory-mapped I/O devices
///
/// Devices must implement the 32-bit register accessors. The narrower and
/// wider accessors have defaults built on them using big-endian byte lanes:
/// offset 0 of a register is its most significant byte.
///
/// # Thread Safety
///
/// Devices do not need to be `Send` or `Sync`; the bus is owned by the guest
/// execution thread. A device that hands data to another thread (a display
/// consumer, say) should do so through an atomic or a copied snapshot, never
/// by exposing its own storage.
pub trait IODevice {
    /// Inclusive physical address range `(start, end)` this device decodes
    fn address_range(&self) -> (u64, u64);

    /// Check if this device contains the given physical address
    fn contains(&self, addr: u64) -> bool {
        let (start, end) = self.address_range();
        addr >= start && addr <= end
    }

    /// Read a 32-bit register at a device-relative offset
    fn read_register(&self, offset: u64) -> BusResult<u32>;

    /// Write a 32-bit register at a device-relative offset
    fn write_register(&mut self, offset: u64, value: u32) -> BusResult<()>;

    fn read_register16(&self, offset: u64) -> BusResult<u16> {
        let value = self.read_register(offset & !0x03)?;
        let shift = (2 - (offset & 0x02)) * 8;
        Ok((value >> shift) as u16)
    }

    fn write_register16(&mut self, offset: u64, value: u16) -> BusResult<()> {
        // Read-modify-write to update only the target 16-bit lane
        let aligned = offset & !0x03;
        let shift = (2 - (offset & 0x02)) * 8;
        let mask = !(0xFFFFu32 << shift);
        let current = self.read_register(aligned)?;
        self.write_register(aligned, (current & mask) | ((value as u32) << shift))
    }

    fn read_register8(&self, offset: u64) -> BusResult<u8> {
        let value = self.read_register(offset & !0x03)?;
        let shift = (3 - (offset & 0x03)) * 8;
        Ok((value >> shift) as u8)
    }

    fn write_register8(&mut self, offset: u64, value: u8) -> BusResult<()> {
        let aligned = offset & !0x03;
        let shift = (3 - (offset & 0x03)) * 8;
        let mask = !(0xFFu32 << shift);
        let current = self.read_register(aligned)?;
        self.write_register(aligned, (current & mask) | ((value as u32) << shift))
    }

    /// 64-bit read as two register reads, high word first
    fn read_register64(&self, offset: u64) -> BusResult<u64> {
        let high = self.read_register(offset)? as u64;
        let low = self.read_register(offset + 4)? as u64;
        Ok((high << 32) | low)
    }

    fn write_register64(&mut self, offset: u64, value: u64) -> BusResult<()> {
        self.write_register(offset, (value >> 32) as u32)?;
        self.write_register(offset + 4, value as u32)
    }

    /// Device name for logging
    fn name(&self) -> &str {
        "Unknown Device"
    }
}
