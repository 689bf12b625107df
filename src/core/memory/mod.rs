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

//! Physical memory bus
//!
//! The CPU core never touches host memory directly. Every instruction fetch
//! and data access goes through the [`PhysicalBus`] trait after the MMU has
//! produced a physical address. [`Bus`] is the stock implementation: RAM,
//! the boot PROM and a list of memory-mapped devices.
//!
//! # Memory Map
//!
//! | Physical Address Range  | Region   | Size (default) | Access |
//! |-------------------------|----------|----------------|--------|
//! | 0x00000000-ram_size-1   | RAM      | 8MB            | R/W    |
//! | 0x1FC00000-0x1FCFFFFF   | PROM     | 1MB            | R only |
//! | device ranges           | MMIO     | per device     | R/W    |
//!
//! All multi-byte accesses are big-endian, matching the SGI MIPS machines.
//!
//! # Example
//!
//! ```
//! use speedracer::core::memory::{Bus, PhysicalBus};
//!
//! let mut bus = Bus::new();
//! bus.write32(0x0000_1000, 0x12345678).unwrap();
//! assert_eq!(bus.read32(0x0000_1000).unwrap(), 0x12345678);
//! assert_eq!(bus.read8(0x0000_1000).unwrap(), 0x12); // big-endian
//! ```

use crate::core::config::MachineConfig;
use crate::core::error::{EmulatorError, Result};
use std::fs::File;
use std::io::Read;
use thiserror::Error;

mod io_device;
#[cfg(test)]
mod tests;

pub use io_device::IODevice;

/// Fault reported by the physical bus
///
/// The CPU maps `Unmapped` to a Bus Error exception and `Misaligned` to an
/// Address Error exception.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusFault {
    #[error("unmapped physical address 0x{address:09X}")]
    Unmapped { address: u64 },

    #[error("misaligned {size}-byte access at physical 0x{address:09X}")]
    Misaligned { address: u64, size: u8 },
}

/// Result type for bus accesses
pub type BusResult<T> = std::result::Result<T, BusFault>;

/// Physical bus capability consumed by the CPU core
///
/// Implementors provide sized reads and writes at physical addresses.
/// Reads take `&self`; devices with read side effects use interior
/// mutability.
pub trait PhysicalBus {
    fn read8(&self, paddr: u64) -> BusResult<u8>;
    fn read16(&self, paddr: u64) -> BusResult<u16>;
    fn read32(&self, paddr: u64) -> BusResult<u32>;
    fn read64(&self, paddr: u64) -> BusResult<u64>;

    fn write8(&mut self, paddr: u64, value: u8) -> BusResult<()>;
    fn write16(&mut self, paddr: u64, value: u16) -> BusResult<()>;
    fn write32(&mut self, paddr: u64, value: u32) -> BusResult<()>;
    fn write64(&mut self, paddr: u64, value: u64) -> BusResult<()>;

    /// Read an instruction word
    ///
    /// Separate from `read32` so buses can treat instruction fetches
    /// differently (e.g. for tracing). Defaults to `read32`.
    fn fetch32(&self, paddr: u64) -> BusResult<u32> {
        self.read32(paddr)
    }

    /// Copy `len` bytes starting at `paddr`
    ///
    /// The returned buffer is a snapshot: it never aliases guest memory, so a
    /// consumer on another thread can hold it while the guest keeps running.
    fn read_block(&self, paddr: u64, len: usize) -> BusResult<Vec<u8>> {
        (0..len as u64)
            .map(|i| self.read8(paddr.wrapping_add(i)))
            .collect()
    }
}

/// Memory region identification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    /// Main RAM
    RAM,
    /// Boot PROM
    PROM,
    /// Memory-mapped device (index into the device list)
    Device(usize),
    /// Unmapped region
    Unmapped,
}

/// Stock physical bus: RAM, PROM and MMIO devices
pub struct Bus {
    /// Main RAM, physical address 0
    ram: Vec<u8>,

    /// Boot PROM image, physical address 0x1FC00000
    ///
    /// Read-only from the guest's point of view
    prom: Vec<u8>,

    /// Memory-mapped devices, searched in registration order
    devices: Vec<Box<dyn IODevice>>,
}

impl Bus {
    /// PROM physical base address
    pub const PROM_START: u64 = 0x1FC0_0000;

    /// Create a bus with the default machine configuration
    ///
    /// # Example
    ///
    /// ```
    /// use speedracer::core::memory::Bus;
    ///
    /// let bus = Bus::new();
    /// assert_eq!(bus.ram_size(), 8 * 1024 * 1024);
    /// ```
    pub fn new() -> Self {
        Self::with_config(&MachineConfig::default())
    }

    /// Create a bus sized by `config`
    ///
    /// The configuration is expected to have been validated.
    pub fn with_config(config: &MachineConfig) -> Self {
        Self {
            ram: vec![0u8; config.ram_size],
            prom: vec![0xFFu8; config.prom_size],
            devices: Vec::new(),
        }
    }

    /// Reset the bus to initial state
    ///
    /// Clears RAM. The PROM image and registered devices are kept.
    pub fn reset(&mut self) {
        self.ram.fill(0);
    }

    /// RAM size in bytes
    pub fn ram_size(&self) -> usize {
        self.ram.len()
    }

    /// PROM contents
    pub fn prom(&self) -> &[u8] {
        &self.prom
    }

    /// Load a PROM image from file
    ///
    /// Returns the number of bytes loaded. The rest of the PROM window keeps
    /// the erased value 0xFF.
    ///
    /// # Errors
    ///
    /// - `EmulatorError::PromNotFound` if the file cannot be opened
    /// - `EmulatorError::PromTooLarge` if the image exceeds the PROM window
    /// - `EmulatorError::Io` on read failure
    ///
    /// # Example
    ///
    /// ```no_run
    /// use speedracer::core::memory::Bus;
    ///
    /// let mut bus = Bus::new();
    /// bus.load_prom("roms/ip30prom.rev4.9.bin").unwrap();
    /// ```
    pub fn load_prom(&mut self, path: &str) -> Result<usize> {
        let mut file =
            File::open(path).map_err(|_| EmulatorError::PromNotFound(path.to_string()))?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        self.load_prom_bytes(&data)?;

        log::info!("Loaded PROM {} ({} bytes)", path, data.len());
        Ok(data.len())
    }

    /// Copy a PROM image from memory
    pub fn load_prom_bytes(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > self.prom.len() {
            return Err(EmulatorError::PromTooLarge {
                max: self.prom.len(),
                got: data.len(),
            });
        }

        self.prom.fill(0xFF);
        self.prom[..data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Register a memory-mapped device
    ///
    /// Devices are matched in registration order; RAM and PROM take
    /// precedence over any device overlapping them.
    pub fn register_device(&mut self, device: Box<dyn IODevice>) {
        let (start, end) = device.address_range();
        log::debug!(
            "Registered device '{}' at 0x{:09X}-0x{:09X}",
            device.name(),
            start,
            end
        );
        self.devices.push(device);
    }

    /// Identify the region containing a physical address
    ///
    /// # Example
    ///
    /// ```
    /// use speedracer::core::memory::{Bus, MemoryRegion};
    ///
    /// let bus = Bus::new();
    /// assert_eq!(bus.identify_region(0x0000_0000), MemoryRegion::RAM);
    /// assert_eq!(bus.identify_region(0x1FC0_0000), MemoryRegion::PROM);
    /// assert_eq!(bus.identify_region(0x1F00_0000), MemoryRegion::Unmapped);
    /// ```
    pub fn identify_region(&self, paddr: u64) -> MemoryRegion {
        if paddr < self.ram.len() as u64 {
            return MemoryRegion::RAM;
        }
        if paddr >= Self::PROM_START && paddr - Self::PROM_START < self.prom.len() as u64 {
            return MemoryRegion::PROM;
        }
        match self.devices.iter().position(|d| d.contains(paddr)) {
            Some(index) => MemoryRegion::Device(index),
            None => MemoryRegion::Unmapped,
        }
    }

    /// Borrow `N` bytes of backing storage for a RAM or PROM access
    fn backing<const N: usize>(&self, paddr: u64) -> BusResult<Option<[u8; N]>> {
        let (store, offset) = match self.identify_region(paddr) {
            MemoryRegion::RAM => (&self.ram, paddr as usize),
            MemoryRegion::PROM => (&self.prom, (paddr - Self::PROM_START) as usize),
            MemoryRegion::Device(_) => return Ok(None),
            MemoryRegion::Unmapped => return Err(BusFault::Unmapped { address: paddr }),
        };

        let bytes: [u8; N] = store
            .get(offset..offset + N)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(BusFault::Unmapped { address: paddr })?;
        Ok(Some(bytes))
    }

    /// Store `N` bytes into RAM (PROM writes are ignored)
    ///
    /// Returns `false` if the address belongs to a device.
    fn store<const N: usize>(&mut self, paddr: u64, bytes: [u8; N]) -> BusResult<bool> {
        match self.identify_region(paddr) {
            MemoryRegion::RAM => {
                let offset = paddr as usize;
                let slot = self
                    .ram
                    .get_mut(offset..offset + N)
                    .ok_or(BusFault::Unmapped { address: paddr })?;
                slot.copy_from_slice(&bytes);
                Ok(true)
            }
            MemoryRegion::PROM => {
                // PROM is read-only, ignore writes
                log::trace!("Attempt to write to PROM at 0x{:09X} (ignored)", paddr);
                Ok(true)
            }
            MemoryRegion::Device(_) => Ok(false),
            MemoryRegion::Unmapped => Err(BusFault::Unmapped { address: paddr }),
        }
    }

    /// Find the device owning `paddr` and the device-relative offset
    fn device(&self, paddr: u64) -> BusResult<(&dyn IODevice, u64)> {
        let device = self
            .devices
            .iter()
            .find(|d| d.contains(paddr))
            .ok_or(BusFault::Unmapped { address: paddr })?;
        let (start, _) = device.address_range();
        Ok((device.as_ref(), paddr - start))
    }

    fn device_mut(&mut self, paddr: u64) -> BusResult<(&mut Box<dyn IODevice>, u64)> {
        let device = self
            .devices
            .iter_mut()
            .find(|d| d.contains(paddr))
            .ok_or(BusFault::Unmapped { address: paddr })?;
        let (start, _) = device.address_range();
        Ok((device, paddr - start))
    }
}

#[inline(always)]
fn check_alignment(paddr: u64, size: u8) -> BusResult<()> {
    if paddr & (size as u64 - 1) != 0 {
        Err(BusFault::Misaligned {
            address: paddr,
            size,
        })
    } else {
        Ok(())
    }
}

impl PhysicalBus for Bus {
    fn read8(&self, paddr: u64) -> BusResult<u8> {
        match self.backing::<1>(paddr)? {
            Some(bytes) => Ok(bytes[0]),
            None => {
                let (device, offset) = self.device(paddr)?;
                log::trace!("{} read8 at offset 0x{:X}", device.name(), offset);
                device.read_register8(offset)
            }
        }
    }

    fn read16(&self, paddr: u64) -> BusResult<u16> {
        check_alignment(paddr, 2)?;
        match self.backing::<2>(paddr)? {
            Some(bytes) => Ok(u16::from_be_bytes(bytes)),
            None => {
                let (device, offset) = self.device(paddr)?;
                log::trace!("{} read16 at offset 0x{:X}", device.name(), offset);
                device.read_register16(offset)
            }
        }
    }

    fn read32(&self, paddr: u64) -> BusResult<u32> {
        check_alignment(paddr, 4)?;
        match self.backing::<4>(paddr)? {
            Some(bytes) => Ok(u32::from_be_bytes(bytes)),
            None => {
                let (device, offset) = self.device(paddr)?;
                log::trace!("{} read32 at offset 0x{:X}", device.name(), offset);
                device.read_register(offset)
            }
        }
    }

    fn read64(&self, paddr: u64) -> BusResult<u64> {
        check_alignment(paddr, 8)?;
        match self.backing::<8>(paddr)? {
            Some(bytes) => Ok(u64::from_be_bytes(bytes)),
            None => {
                let (device, offset) = self.device(paddr)?;
                log::trace!("{} read64 at offset 0x{:X}", device.name(), offset);
                device.read_register64(offset)
            }
        }
    }

    fn write8(&mut self, paddr: u64, value: u8) -> BusResult<()> {
        if self.store(paddr, [value])? {
            return Ok(());
        }
        let (device, offset) = self.device_mut(paddr)?;
        log::trace!(
            "{} write8 0x{:02X} at offset 0x{:X}",
            device.name(),
            value,
            offset
        );
        device.write_register8(offset, value)
    }

    fn write16(&mut self, paddr: u64, value: u16) -> BusResult<()> {
        check_alignment(paddr, 2)?;
        if self.store(paddr, value.to_be_bytes())? {
            return Ok(());
        }
        let (device, offset) = self.device_mut(paddr)?;
        log::trace!(
            "{} write16 0x{:04X} at offset 0x{:X}",
            device.name(),
            value,
            offset
        );
        device.write_register16(offset, value)
    }

    fn write32(&mut self, paddr: u64, value: u32) -> BusResult<()> {
        check_alignment(paddr, 4)?;
        if self.store(paddr, value.to_be_bytes())? {
            return Ok(());
        }
        let (device, offset) = self.device_mut(paddr)?;
        log::trace!(
            "{} write32 0x{:08X} at offset 0x{:X}",
            device.name(),
            value,
            offset
        );
        device.write_register(offset, value)
    }

    fn write64(&mut self, paddr: u64, value: u64) -> BusResult<()> {
        check_alignment(paddr, 8)?;
        if self.store(paddr, value.to_be_bytes())? {
            return Ok(());
        }
        let (device, offset) = self.device_mut(paddr)?;
        log::trace!(
            "{} write64 0x{:016X} at offset 0x{:X}",
            device.name(),
            value,
            offset
        );
        device.write_register64(offset, value)
    }

    fn read_block(&self, paddr: u64, len: usize) -> BusResult<Vec<u8>> {
        // Plain memory ranges are copied in one go; anything touching a
        // device falls back to byte reads.
        let end = paddr
            .checked_add(len as u64)
            .ok_or(BusFault::Unmapped { address: paddr })?;
        if len > 0 && end <= self.ram.len() as u64 {
            return Ok(self.ram[paddr as usize..end as usize].to_vec());
        }
        (0..len as u64)
            .map(|i| self.read8(paddr + i))
            .collect()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
