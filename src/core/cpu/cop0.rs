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

//! Coprocessor 0 (System Control)
//!
//! CP0 holds the exception state, the interval timer, the interrupt mask
//! and the TLB staging registers. Registers are stored as 64-bit words;
//! 32-bit registers are kept sign-extended so that MFC0 and DMFC0 read the
//! same value.
//!
//! All guest writes go through [`COP0::write`], which applies the
//! per-register writable masks and side effects. The CPU uses the
//! crate-private `set_raw` path for hardware updates (exception entry,
//! TLBR, TLBP).

use bitflags::bitflags;

use super::sext32;

bitflags! {
    /// Status register (CP0 r12) bit view
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u32 {
        /// Interrupt enable
        const IE = 1 << 0;
        /// Exception level
        const EXL = 1 << 1;
        /// Error level
        const ERL = 1 << 2;
        /// KSU = 01 (supervisor)
        const KSU_SUPERVISOR = 1 << 3;
        /// KSU = 10 (user)
        const KSU_USER = 1 << 4;
        /// TLB shutdown (read-only)
        const TS = 1 << 21;
        /// Bootstrap exception vectors
        const BEV = 1 << 22;
        /// Coprocessor 0 usable outside kernel mode
        const CU0 = 1 << 28;
        const CU1 = 1 << 29;
        const CU2 = 1 << 30;
        const CU3 = 1 << 31;

        const _ = !0;
    }
}

/// Processor privilege mode derived from Status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Kernel,
    Supervisor,
    User,
}

/// Coprocessor 0 (System Control)
pub struct COP0 {
    /// COP0 registers (32 registers)
    regs: [u64; 32],

    /// Number of TLB entries, bounds Index/Random/Wired
    tlb_size: usize,

    /// Value reported by PRId
    prid: u32,

    /// IP2..IP6 asserted through `set_hw_pending`, merged into every latch
    asserted: u8,
}

impl COP0 {
    /// TLB index (P bit 31 set by a failed probe)
    pub const INDEX: usize = 0;
    /// TLB random replacement index (read-only)
    pub const RANDOM: usize = 1;
    /// Even page mapping
    pub const ENTRY_LO0: usize = 2;
    /// Odd page mapping
    pub const ENTRY_LO1: usize = 3;
    /// Page table pointer
    pub const CONTEXT: usize = 4;
    /// Page size mask
    pub const PAGE_MASK: usize = 5;
    /// Number of wired TLB entries
    pub const WIRED: usize = 6;
    /// Bad Virtual Address
    pub const BAD_VADDR: usize = 8;
    /// Interval timer count
    pub const COUNT: usize = 9;
    /// VPN2 and ASID
    pub const ENTRY_HI: usize = 10;
    /// Interval timer compare
    pub const COMPARE: usize = 11;
    /// Status Register
    pub const STATUS: usize = 12;
    /// Cause Register
    pub const CAUSE: usize = 13;
    /// Exception PC
    pub const EPC: usize = 14;
    /// Processor ID
    pub const PRID: usize = 15;
    /// Configuration
    pub const CONFIG: usize = 16;
    /// Load-linked address
    pub const LL_ADDR: usize = 17;
    pub const WATCH_LO: usize = 18;
    pub const WATCH_HI: usize = 19;
    pub const TAG_LO: usize = 28;
    pub const TAG_HI: usize = 29;
    /// Error exception PC
    pub const ERROR_EPC: usize = 30;

    /// Index P (probe failure) bit
    pub const INDEX_PROBE_FAIL: u32 = 0x8000_0000;

    /// Writable EntryLo bits: PFN, C, D, V, G
    pub const ENTRY_LO_MASK: u32 = 0x3FFF_FFFF;
    /// Writable EntryHi bits: VPN2 and ASID
    pub const ENTRY_HI_MASK: u32 = 0xFFFF_E0FF;
    /// Writable PageMask bits
    pub const PAGE_MASK_MASK: u32 = 0x01FF_E000;
    /// Writable Context bits: PTEBase
    pub const CONTEXT_PTE_BASE_MASK: u32 = 0xFF80_0000;
    /// Context BadVPN2 field
    pub const CONTEXT_BAD_VPN2_MASK: u32 = 0x007F_FFF0;
    /// Writable Status bits (everything but TS and the reserved bits 20 and 23)
    pub const STATUS_WRITE_MASK: u32 = 0xFE57_FFFF;
    /// Writable Config bits: K0 cache algorithm
    pub const CONFIG_K0_MASK: u32 = 0x0000_0007;

    /// Cause branch delay bit
    pub const CAUSE_BD: u32 = 1 << 31;
    /// Cause coprocessor error field
    pub const CAUSE_CE_MASK: u32 = 0x3000_0000;
    /// Cause interrupt pending field
    pub const CAUSE_IP_MASK: u32 = 0x0000_FF00;
    /// Software interrupt bits IP1:0 (the only guest-writable Cause bits)
    pub const CAUSE_SW_MASK: u32 = 0x0000_0300;
    /// Timer interrupt IP7
    pub const CAUSE_IP7: u32 = 1 << 15;
    /// Exception code field
    pub const CAUSE_EXC_CODE_MASK: u32 = 0x0000_007C;

    /// Hardware lines IP2..IP6 in the interrupt-pending byte
    pub const HW_LINE_MASK: u8 = 0x7C;

    /// Create a new COP0 instance for a TLB with `tlb_size` entries
    ///
    /// # Returns
    /// Initialized COP0 instance with reset values
    pub(crate) fn new(tlb_size: usize, prid: u32) -> Self {
        let mut cop0 = Self {
            regs: [0u64; 32],
            tlb_size,
            prid,
            asserted: 0,
        };
        cop0.reset();
        cop0
    }

    /// Reset COP0 registers to initial state
    ///
    /// Status holds only BEV; Count, Random and Wired are zero.
    pub(crate) fn reset(&mut self) {
        self.regs = [0u64; 32];
        self.regs[Self::STATUS] = sext32(Status::BEV.bits());
        self.regs[Self::PRID] = sext32(self.prid);
        self.asserted = 0;
    }

    /// Number of TLB entries this CP0 indexes
    pub fn tlb_size(&self) -> usize {
        self.tlb_size
    }

    /// Read a CP0 register
    ///
    /// Reserved slots read as zero.
    pub fn read(&self, reg: usize) -> u64 {
        self.regs[reg & 0x1F]
    }

    /// Read the low 32 bits of a CP0 register
    #[inline(always)]
    pub fn read32(&self, reg: usize) -> u32 {
        self.read(reg) as u32
    }

    /// Write a CP0 register with guest semantics
    ///
    /// # Details
    ///
    /// | Register  | Write behavior                                   |
    /// |-----------|--------------------------------------------------|
    /// | Index     | index bits only, P bit untouched                 |
    /// | Random    | ignored                                          |
    /// | EntryLo   | PFN/C/D/V/G                                      |
    /// | Context   | PTEBase only                                     |
    /// | PageMask  | mask bits 24:13                                  |
    /// | Wired     | clamped below the TLB size, resets Random        |
    /// | BadVAddr  | ignored                                          |
    /// | Compare   | clears the timer interrupt (IP7)                 |
    /// | Status    | all but TS                                       |
    /// | Cause     | IP1:0 only                                       |
    /// | PRId      | ignored                                          |
    /// | Config    | K0 only                                          |
    /// | reserved  | ignored                                          |
    pub fn write(&mut self, reg: usize, value: u64) {
        let reg = reg & 0x1F;
        let low = value as u32;

        match reg {
            Self::INDEX => {
                let mask = self.index_mask();
                let old = self.read32(Self::INDEX);
                self.set_raw(Self::INDEX, (old & !mask) | (low & mask));
            }
            Self::RANDOM | Self::BAD_VADDR | Self::PRID => {
                log::trace!("COP0: write to read-only r{} ignored", reg);
            }
            Self::ENTRY_LO0 | Self::ENTRY_LO1 => {
                self.set_raw(reg, low & Self::ENTRY_LO_MASK);
            }
            Self::CONTEXT => {
                let old = self.read32(Self::CONTEXT);
                let merged =
                    (old & !Self::CONTEXT_PTE_BASE_MASK) | (low & Self::CONTEXT_PTE_BASE_MASK);
                self.set_raw(Self::CONTEXT, merged);
            }
            Self::PAGE_MASK => self.set_raw(Self::PAGE_MASK, low & Self::PAGE_MASK_MASK),
            Self::WIRED => {
                let top = (self.tlb_size - 1) as u32;
                let wired = (low & 0x3F).min(top);
                self.set_raw(Self::WIRED, wired);
                self.set_raw(Self::RANDOM, top);
                log::debug!("COP0: Wired={} Random={}", wired, top);
            }
            Self::COUNT => self.set_raw(Self::COUNT, low),
            Self::ENTRY_HI => self.set_raw(Self::ENTRY_HI, low & Self::ENTRY_HI_MASK),
            Self::COMPARE => {
                self.set_raw(Self::COMPARE, low);
                self.clear_cause_bits(Self::CAUSE_IP7);
            }
            Self::STATUS => {
                let old = self.status().bits();
                let merged = (old & !Self::STATUS_WRITE_MASK) | (low & Self::STATUS_WRITE_MASK);
                self.set_raw(Self::STATUS, merged);
            }
            Self::CAUSE => {
                let old = self.cause();
                let merged = (old & !Self::CAUSE_SW_MASK) | (low & Self::CAUSE_SW_MASK);
                self.set_raw(Self::CAUSE, merged);
            }
            Self::CONFIG => {
                let old = self.read32(Self::CONFIG);
                let merged = (old & !Self::CONFIG_K0_MASK) | (low & Self::CONFIG_K0_MASK);
                self.set_raw(Self::CONFIG, merged);
            }
            Self::EPC
            | Self::LL_ADDR
            | Self::WATCH_LO
            | Self::WATCH_HI
            | Self::TAG_LO
            | Self::TAG_HI
            | Self::ERROR_EPC => self.regs[reg] = value,
            _ => {
                log::trace!("COP0: write to reserved r{} ignored", reg);
            }
        }
    }

    /// Store a 32-bit value sign-extended, bypassing the guest write masks
    #[inline(always)]
    pub(crate) fn set_raw(&mut self, reg: usize, value: u32) {
        self.regs[reg] = sext32(value);
    }

    /// Status register bit view
    #[inline(always)]
    pub fn status(&self) -> Status {
        Status::from_bits_retain(self.read32(Self::STATUS))
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.set_raw(Self::STATUS, status.bits());
    }

    /// Cause register
    #[inline(always)]
    pub fn cause(&self) -> u32 {
        self.read32(Self::CAUSE)
    }

    #[inline(always)]
    fn set_cause_bits(&mut self, bits: u32) {
        let cause = self.cause();
        self.set_raw(Self::CAUSE, cause | bits);
    }

    #[inline(always)]
    fn clear_cause_bits(&mut self, bits: u32) {
        let cause = self.cause();
        self.set_raw(Self::CAUSE, cause & !bits);
    }

    /// Current privilege mode
    ///
    /// EXL or ERL force kernel mode regardless of KSU.
    pub fn mode(&self) -> Mode {
        let status = self.status();
        if status.intersects(Status::EXL | Status::ERL) {
            return Mode::Kernel;
        }
        match (status.bits() >> 3) & 0x3 {
            0b01 => Mode::Supervisor,
            0b10 => Mode::User,
            _ => Mode::Kernel,
        }
    }

    /// Address space identifier from EntryHi
    #[inline(always)]
    pub fn asid(&self) -> u8 {
        self.read32(Self::ENTRY_HI) as u8
    }

    /// Advance Count by `n` ticks
    ///
    /// If Count passes through Compare during the advance, the timer
    /// interrupt (IP7) is raised. It stays raised until Compare is written.
    pub fn tick(&mut self, n: u32) {
        let old = self.read32(Self::COUNT);
        let compare = self.read32(Self::COMPARE);
        self.set_raw(Self::COUNT, old.wrapping_add(n));

        // Match inside the window (old, old + n]
        if compare.wrapping_sub(old).wrapping_sub(1) < n {
            log::trace!("COP0: Count reached Compare 0x{:08X}", compare);
            self.set_cause_bits(Self::CAUSE_IP7);
        }
    }

    /// Mark interrupt lines pending (mask over IP7..IP0)
    ///
    /// Lines IP2..IP6 stay asserted across latches of the external lines
    /// until [`clear_hw_pending`](Self::clear_hw_pending) drops them.
    pub fn set_hw_pending(&mut self, mask: u8) {
        self.asserted |= mask & Self::HW_LINE_MASK;
        self.set_cause_bits((mask as u32) << 8);
    }

    /// Clear pending interrupt lines (mask over IP7..IP0)
    ///
    /// An external line that is still raised comes back on the next latch.
    pub fn clear_hw_pending(&mut self, mask: u8) {
        self.asserted &= !mask;
        self.clear_cause_bits((mask as u32) << 8);
    }

    /// Interrupt-pending byte (Cause.IP)
    #[inline(always)]
    pub fn hw_pending(&self) -> u8 {
        (self.cause() >> 8) as u8
    }

    /// Replace IP2..IP6 with the current level of the external lines
    ///
    /// Lines asserted through `set_hw_pending` are OR-ed in. Software bits
    /// IP1:0 and the timer bit IP7 are kept.
    pub(crate) fn latch_lines(&mut self, lines: u8) {
        let keep = self.cause() & !((Self::HW_LINE_MASK as u32) << 8);
        let pending = (((lines | self.asserted) & Self::HW_LINE_MASK) as u32) << 8;
        self.set_raw(Self::CAUSE, keep | pending);
    }

    /// Check whether an enabled interrupt is pending
    ///
    /// `IE && !EXL && !ERL && (IP & IM) != 0`
    pub fn interrupt_ready(&self) -> bool {
        let status = self.status();
        if !status.contains(Status::IE) || status.intersects(Status::EXL | Status::ERL) {
            return false;
        }
        let im = (status.bits() >> 8) as u8;
        self.hw_pending() & im != 0
    }

    /// Mask covering the index bits of the Index register
    #[inline(always)]
    fn index_mask(&self) -> u32 {
        (self.tlb_size.next_power_of_two() - 1) as u32
    }

    /// Current Index field (P bit stripped)
    #[inline(always)]
    pub fn index(&self) -> u32 {
        self.read32(Self::INDEX) & self.index_mask()
    }

    #[inline(always)]
    pub fn random(&self) -> u32 {
        self.read32(Self::RANDOM)
    }

    #[inline(always)]
    pub fn wired(&self) -> u32 {
        self.read32(Self::WIRED)
    }

    /// Step Random to the next replacement slot
    ///
    /// Random counts down and wraps to `tlb_size - 1` instead of dropping
    /// below Wired.
    pub(crate) fn advance_random(&mut self) {
        let random = self.random();
        let next = if random <= self.wired() {
            (self.tlb_size - 1) as u32
        } else {
            random - 1
        };
        self.set_raw(Self::RANDOM, next);
    }
}

/// Exception cause codes (Cause.ExcCode)
///
/// These correspond to the exception codes stored in the CAUSE register
/// when a CPU exception occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ExceptionCause {
    /// Interrupt (external or internal)
    Interrupt = 0,
    /// Store to a clean (D=0) page
    TlbModified = 1,
    /// TLB refill or invalid on load or fetch
    TlbLoad = 2,
    /// TLB refill or invalid on store
    TlbStore = 3,
    /// Address error on load
    AddressErrorLoad = 4,
    /// Address error on store
    AddressErrorStore = 5,
    /// Bus error on instruction fetch
    BusErrorInstruction = 6,
    /// Bus error on data access
    BusErrorData = 7,
    /// Syscall instruction executed
    Syscall = 8,
    /// Breakpoint instruction executed
    Breakpoint = 9,
    /// Reserved or illegal instruction
    ReservedInstruction = 10,
    /// Coprocessor unusable
    CoprocessorUnusable = 11,
    /// Arithmetic overflow
    Overflow = 12,
    /// Trap instruction condition met
    Trap = 13,
}

impl ExceptionCause {
    /// Whether this exception loads Context.BadVPN2 and EntryHi.VPN2
    pub fn is_tlb(self) -> bool {
        matches!(
            self,
            ExceptionCause::TlbModified | ExceptionCause::TlbLoad | ExceptionCause::TlbStore
        )
    }
}

/// A guest exception raised by instruction execution
///
/// Instruction handlers return this as their error value; the step loop
/// delivers it through the CP0 exception path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exception {
    pub cause: ExceptionCause,
    /// Faulting virtual address, copied into BadVAddr
    pub bad_vaddr: Option<u32>,
    /// TLB refill (no matching entry); selects the refill vector offset
    pub refill: bool,
    /// Unit number for Coprocessor Unusable (Cause.CE)
    pub coprocessor: u8,
}

impl Exception {
    pub fn new(cause: ExceptionCause) -> Self {
        Self {
            cause,
            bad_vaddr: None,
            refill: false,
            coprocessor: 0,
        }
    }

    /// Exception with a faulting virtual address
    pub fn with_address(cause: ExceptionCause, vaddr: u32) -> Self {
        Self {
            bad_vaddr: Some(vaddr),
            ..Self::new(cause)
        }
    }

    /// TLB refill (no entry matched `vaddr`)
    pub fn refill(cause: ExceptionCause, vaddr: u32) -> Self {
        Self {
            refill: true,
            ..Self::with_address(cause, vaddr)
        }
    }

    pub fn coprocessor_unusable(unit: u8) -> Self {
        Self {
            coprocessor: unit & 0x3,
            ..Self::new(ExceptionCause::CoprocessorUnusable)
        }
    }
}
