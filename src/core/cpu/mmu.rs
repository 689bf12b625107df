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

//! Memory management unit: segment table and software-managed TLB
//!
//! Virtual addresses use 32-bit compatibility addressing:
//!
//! | Range                   | Segment | Mapping                              |
//! |-------------------------|---------|--------------------------------------|
//! | 0x00000000-0x7FFFFFFF   | kuseg   | TLB (identity while Status.ERL = 1)  |
//! | 0x80000000-0x9FFFFFFF   | kseg0   | physical = vaddr - 0x80000000        |
//! | 0xA0000000-0xBFFFFFFF   | kseg1   | physical = vaddr - 0xA0000000        |
//! | 0xC0000000-0xDFFFFFFF   | ksseg   | TLB                                  |
//! | 0xE0000000-0xFFFFFFFF   | kseg3   | TLB                                  |
//!
//! User mode may only touch kuseg; supervisor mode may touch kuseg and
//! ksseg. Everything else is an address error.
//!
//! Each TLB entry maps an even/odd pair of pages. Page sizes run from 4KB
//! to 16MB in steps of 4x, selected by PageMask.

use super::cop0::{Mode, Status, COP0};
use crate::core::config::MAX_TLB_SIZE;
use crate::core::error::{EmulatorError, Result};

/// Kind of memory access being translated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Fetch,
    Load,
    Store,
}

/// Translation failure reported to the CPU
///
/// The CPU turns this into the guest exception matching the access kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationFault {
    /// No TLB entry matched
    Refill,
    /// The matching page has V = 0
    Invalid,
    /// Store to a page with D = 0
    Modified,
    /// Segment not accessible in the current mode
    AddressError,
}

/// PageMask values for the supported page sizes (4K, 16K, 64K, 256K, 1M, 4M, 16M)
pub const SUPPORTED_PAGE_MASKS: [u32; 7] = [
    0x0000_0000,
    0x0000_6000,
    0x0001_E000,
    0x0007_E000,
    0x001F_E000,
    0x007F_E000,
    0x01FF_E000,
];

/// One half (even or odd page) of a TLB entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TlbPage {
    /// Physical frame number (4KB units)
    pub pfn: u32,
    /// Cache algorithm (C field)
    pub cache: u8,
    /// Writable
    pub dirty: bool,
    pub valid: bool,
}

impl TlbPage {
    /// Decode the page half of an EntryLo value
    pub fn from_entry_lo(lo: u32) -> Self {
        Self {
            pfn: (lo >> 6) & 0x00FF_FFFF,
            cache: ((lo >> 3) & 0x7) as u8,
            dirty: lo & 0x4 != 0,
            valid: lo & 0x2 != 0,
        }
    }

    /// Encode as an EntryLo value with the given G bit
    pub fn to_entry_lo(self, global: bool) -> u32 {
        (self.pfn << 6)
            | ((self.cache as u32) << 3)
            | ((self.dirty as u32) << 2)
            | ((self.valid as u32) << 1)
            | global as u32
    }
}

/// TLB entry mapping an even/odd page pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TlbEntry {
    /// Set by TLBWI/TLBWR; reset entries never match
    pub valid: bool,
    /// Virtual page number of the pair (vaddr bits 31:13)
    pub vpn2: u32,
    pub page_mask: u32,
    pub asid: u8,
    /// Matches regardless of ASID
    pub global: bool,
    pub even: TlbPage,
    pub odd: TlbPage,
}

impl TlbEntry {
    /// Offset mask covering both pages of the pair
    #[inline(always)]
    fn pair_mask(&self) -> u32 {
        self.page_mask | 0x1FFF
    }

    /// Size of a single page in bytes
    pub fn page_size(&self) -> u32 {
        (self.pair_mask() >> 1) + 1
    }

    /// Check whether this entry maps `vaddr` for address space `asid`
    #[inline(always)]
    pub fn matches(&self, vaddr: u32, asid: u8) -> bool {
        let mask = self.pair_mask();
        self.valid && (vaddr & !mask) == (self.vpn2 & !mask) && (self.global || self.asid == asid)
    }

    /// Select the even or odd half for `vaddr`
    #[inline(always)]
    fn page_for(&self, vaddr: u32) -> &TlbPage {
        if vaddr & self.page_size() != 0 {
            &self.odd
        } else {
            &self.even
        }
    }
}

/// Software-managed TLB
///
/// Entries are only created or replaced by TLBWI/TLBWR; translation never
/// modifies them.
///
/// # Example
///
/// ```
/// use speedracer::core::cpu::Tlb;
///
/// let tlb = Tlb::new(48).unwrap();
/// assert_eq!(tlb.len(), 48);
/// assert!(Tlb::new(0).is_err());
/// ```
pub struct Tlb {
    entries: Vec<TlbEntry>,
}

impl Tlb {
    /// Create a TLB with `size` invalid entries
    ///
    /// # Errors
    ///
    /// `ZeroSizedTlb` for an empty TLB, `TlbTooLarge` above 64 entries.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(EmulatorError::ZeroSizedTlb);
        }
        if size > MAX_TLB_SIZE {
            return Err(EmulatorError::TlbTooLarge(size));
        }
        Ok(Self {
            entries: vec![TlbEntry::default(); size],
        })
    }

    /// Invalidate every entry
    pub fn reset(&mut self) {
        self.entries.fill(TlbEntry::default());
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&TlbEntry> {
        self.entries.get(index)
    }

    /// Find the first entry mapping `vaddr` in address space `asid`
    pub fn lookup(&self, vaddr: u32, asid: u8) -> Option<(usize, &TlbEntry)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.matches(vaddr, asid))
    }

    /// Translate a virtual address to a physical address
    ///
    /// # Arguments
    ///
    /// * `vaddr` - Virtual address
    /// * `access` - Fetch, load or store
    /// * `cop0` - Supplies the privilege mode, Status.ERL and the current ASID
    ///
    /// # Returns
    ///
    /// The physical address, or the fault the CPU should raise
    ///
    /// # Example
    ///
    /// ```
    /// use speedracer::core::config::MachineConfig;
    /// use speedracer::core::cpu::{AccessKind, TranslationFault, CPU};
    ///
    /// let cpu = CPU::new(&MachineConfig::default()).unwrap();
    /// let mmu = cpu.tlb();
    ///
    /// // KSEG1 is unmapped and uncached
    /// assert_eq!(mmu.translate(0xBFC0_0000, AccessKind::Fetch, cpu.cop0()), Ok(0x1FC0_0000));
    ///
    /// // KUSEG goes through the (empty) TLB
    /// assert_eq!(
    ///     mmu.translate(0x0040_0000, AccessKind::Load, cpu.cop0()),
    ///     Err(TranslationFault::Refill)
    /// );
    /// ```
    pub fn translate(
        &self,
        vaddr: u32,
        access: AccessKind,
        cop0: &COP0,
    ) -> std::result::Result<u64, TranslationFault> {
        let mode = cop0.mode();

        match vaddr {
            // kuseg
            0x0000_0000..=0x7FFF_FFFF => {
                if cop0.status().contains(Status::ERL) {
                    return Ok(vaddr as u64);
                }
                self.translate_mapped(vaddr, access, cop0.asid())
            }
            // kseg0
            0x8000_0000..=0x9FFF_FFFF => {
                if mode != Mode::Kernel {
                    return Err(TranslationFault::AddressError);
                }
                Ok((vaddr - 0x8000_0000) as u64)
            }
            // kseg1
            0xA000_0000..=0xBFFF_FFFF => {
                if mode != Mode::Kernel {
                    return Err(TranslationFault::AddressError);
                }
                Ok((vaddr - 0xA000_0000) as u64)
            }
            // ksseg
            0xC000_0000..=0xDFFF_FFFF => {
                if mode == Mode::User {
                    return Err(TranslationFault::AddressError);
                }
                self.translate_mapped(vaddr, access, cop0.asid())
            }
            // kseg3
            _ => {
                if mode != Mode::Kernel {
                    return Err(TranslationFault::AddressError);
                }
                self.translate_mapped(vaddr, access, cop0.asid())
            }
        }
    }

    fn translate_mapped(
        &self,
        vaddr: u32,
        access: AccessKind,
        asid: u8,
    ) -> std::result::Result<u64, TranslationFault> {
        let (_, entry) = self.lookup(vaddr, asid).ok_or(TranslationFault::Refill)?;
        let page = entry.page_for(vaddr);

        if !page.valid {
            return Err(TranslationFault::Invalid);
        }
        if access == AccessKind::Store && !page.dirty {
            return Err(TranslationFault::Modified);
        }

        let offset_mask = entry.page_size() - 1;
        Ok(((page.pfn as u64) << 12) | (vaddr & offset_mask) as u64)
    }

    /// TLBR: copy the entry at Index into EntryHi, EntryLo0/1 and PageMask
    pub(crate) fn read_indexed(&self, cop0: &mut COP0) {
        let index = self.wrap_index(cop0.index());
        let entry = self.entries[index];

        cop0.set_raw(COP0::ENTRY_HI, entry.vpn2 | entry.asid as u32);
        cop0.set_raw(COP0::ENTRY_LO0, entry.even.to_entry_lo(entry.global));
        cop0.set_raw(COP0::ENTRY_LO1, entry.odd.to_entry_lo(entry.global));
        cop0.set_raw(COP0::PAGE_MASK, entry.page_mask);
    }

    /// TLBWI: write the staging registers to the entry at Index
    pub(crate) fn write_indexed(&mut self, cop0: &COP0) {
        let index = self.wrap_index(cop0.index());
        self.write_entry(index, cop0);
    }

    /// TLBWR: write the staging registers to the entry at Random, then
    /// advance Random
    pub(crate) fn write_random(&mut self, cop0: &mut COP0) {
        let index = self.wrap_index(cop0.random());
        self.write_entry(index, cop0);
        cop0.advance_random();
    }

    /// TLBP: look up EntryHi and set Index to the matching slot, or to the
    /// P bit alone if nothing matches
    pub(crate) fn probe(&self, cop0: &mut COP0) {
        let entry_hi = cop0.read32(COP0::ENTRY_HI);
        match self.lookup(entry_hi & 0xFFFF_E000, entry_hi as u8) {
            Some((index, _)) => cop0.set_raw(COP0::INDEX, index as u32),
            None => cop0.set_raw(COP0::INDEX, COP0::INDEX_PROBE_FAIL),
        }
    }

    fn wrap_index(&self, index: u32) -> usize {
        let index = index as usize;
        if index >= self.entries.len() {
            log::warn!(
                "TLB index {} out of range (size {}), wrapping",
                index,
                self.entries.len()
            );
        }
        index % self.entries.len()
    }

    fn write_entry(&mut self, index: usize, cop0: &COP0) {
        let page_mask = cop0.read32(COP0::PAGE_MASK);
        let entry_hi = cop0.read32(COP0::ENTRY_HI);
        let lo0 = cop0.read32(COP0::ENTRY_LO0);
        let lo1 = cop0.read32(COP0::ENTRY_LO1);

        if !SUPPORTED_PAGE_MASKS.contains(&page_mask) {
            log::warn!("TLB write with unsupported PageMask 0x{:08X}", page_mask);
        }

        let entry = TlbEntry {
            valid: true,
            vpn2: entry_hi & 0xFFFF_E000 & !page_mask,
            page_mask,
            asid: entry_hi as u8,
            global: lo0 & lo1 & 0x1 != 0,
            even: TlbPage::from_entry_lo(lo0),
            odd: TlbPage::from_entry_lo(lo1),
        };

        log::debug!(
            "TLB[{}] <- VPN2=0x{:08X} ASID={:02X} G={} mask=0x{:08X} even PFN=0x{:06X} odd PFN=0x{:06X}",
            index,
            entry.vpn2,
            entry.asid,
            entry.global,
            page_mask,
            entry.even.pfn,
            entry.odd.pfn
        );
        self.entries[index] = entry;
    }
}
