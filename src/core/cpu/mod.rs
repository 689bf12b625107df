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

use serde::Serialize;

use crate::core::config::MachineConfig;
use crate::core::error::Result;
use crate::core::interrupt::InterruptLines;
use crate::core::memory::PhysicalBus;

/// CPU (MIPS III, R4000/R10000 programming model) emulation implementation
///
/// # Specifications
/// - Architecture: MIPS III integer subset, 64-bit registers
/// - Addressing: 32-bit compatibility segments (kuseg/kseg0/kseg1/ksseg/kseg3)
/// - Registers: 32 general-purpose registers + HI/LO
/// - Coprocessor 0 with a software-managed TLB
///
/// # Example
/// ```
/// use speedracer::core::config::MachineConfig;
/// use speedracer::core::cpu::CPU;
///
/// let mut cpu = CPU::new(&MachineConfig::default()).unwrap();
/// cpu.reset();
/// assert_eq!(cpu.reg(0), 0); // r0 is always 0
/// assert_eq!(cpu.pc(), 0xBFC0_0000);
/// ```
pub struct CPU {
    /// General purpose registers (r0-r31)
    ///
    /// r0 is hardwired to always return 0
    regs: [u64; 32],

    /// Address of the instruction about to execute
    pc: u32,

    /// Fall-through address for the instruction at `pc`
    next_pc: u32,

    /// HI register (multiplication high half / division remainder)
    hi: u64,

    /// LO register (multiplication low half / division quotient)
    lo: u64,

    /// Coprocessor 0 (System Control Unit)
    cop0: COP0,

    /// Translation lookaside buffer
    tlb: Tlb,

    /// Branch target to apply after the instruction at `pc` retires
    ///
    /// `Some` means the instruction at `pc` sits in a delay slot.
    branch_pending: Option<u32>,

    /// Redirect requested by the instruction currently executing
    branch_request: Option<u32>,

    /// Set while the executing instruction is in a delay slot
    in_branch_delay: bool,

    /// Link bit for LL/SC
    ll_bit: bool,

    /// Count increment per step
    count_per_step: u32,

    /// Address the PC is set to on reset
    reset_vector: u32,

    /// Current instruction (for debugging)
    current_instruction: u32,

    /// External interrupt lines latched at each step boundary
    interrupt_lines: Option<InterruptLines>,
}

// Module declarations
mod cop0;
mod decode;
mod disassembler;
mod instructions;
mod mmu;
#[cfg(test)]
mod tests;
mod tracer;

// Re-exports
pub use cop0::{Exception, ExceptionCause, Mode, Status, COP0};
pub use decode::{decode, DecodeError, Instruction, LoadKind, StoreKind, TrapCond};
pub use disassembler::Disassembler;
pub use mmu::{AccessKind, Tlb, TlbEntry, TlbPage, TranslationFault, SUPPORTED_PAGE_MASKS};
pub use tracer::CpuTracer;

/// Result of executing one instruction: a guest exception is the error
pub(crate) type ExecResult<T = ()> = std::result::Result<T, Exception>;

/// Sign-extend a 32-bit value into a 64-bit register
#[inline(always)]
pub(crate) fn sext32(value: u32) -> u64 {
    value as i32 as i64 as u64
}

/// Outcome of a single [`CPU::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    /// The instruction at the old PC retired normally
    Retired,
    /// Execution was redirected to an exception vector
    Exception(ExceptionCause),
}

/// Serializable snapshot of the CPU state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuState {
    pub pc: u32,
    pub next_pc: u32,
    pub branch_pending: Option<u32>,
    pub gpr: [u64; 32],
    pub hi: u64,
    pub lo: u64,
    pub cop0: Cop0State,
}

/// Named CP0 registers included in a [`CpuState`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cop0State {
    pub index: u32,
    pub random: u32,
    pub entry_lo0: u32,
    pub entry_lo1: u32,
    pub context: u32,
    pub page_mask: u32,
    pub wired: u32,
    pub bad_vaddr: u32,
    pub count: u32,
    pub entry_hi: u32,
    pub compare: u32,
    pub status: u32,
    pub cause: u32,
    pub epc: u64,
    pub prid: u32,
    pub error_epc: u64,
}

impl CPU {
    /// Create a new CPU for the given machine configuration
    ///
    /// The CPU starts in the reset state:
    /// - All general purpose registers and HI/LO: 0
    /// - PC: the configured reset vector (0xBFC00000 by default)
    /// - Status: BEV only
    /// - TLB: every entry invalid
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not validate, in particular for a
    /// zero-sized TLB.
    ///
    /// # Example
    /// ```
    /// use speedracer::core::config::MachineConfig;
    /// use speedracer::core::cpu::CPU;
    ///
    /// let config = MachineConfig { tlb_size: 0, ..Default::default() };
    /// assert!(CPU::new(&config).is_err());
    /// ```
    pub fn new(config: &MachineConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            regs: [0u64; 32],
            pc: config.reset_vector,
            next_pc: config.reset_vector.wrapping_add(4),
            hi: 0,
            lo: 0,
            cop0: COP0::new(config.tlb_size, config.prid),
            tlb: Tlb::new(config.tlb_size)?,
            branch_pending: None,
            branch_request: None,
            in_branch_delay: false,
            ll_bit: false,
            count_per_step: config.count_per_step,
            reset_vector: config.reset_vector,
            current_instruction: 0,
            interrupt_lines: None,
        })
    }

    /// Reset CPU to initial state
    ///
    /// This mimics the behavior of a cold reset. Connected interrupt lines
    /// stay connected.
    pub fn reset(&mut self) {
        self.regs = [0u64; 32];
        self.pc = self.reset_vector;
        self.next_pc = self.reset_vector.wrapping_add(4);
        self.hi = 0;
        self.lo = 0;
        self.cop0.reset();
        self.tlb.reset();
        self.branch_pending = None;
        self.branch_request = None;
        self.in_branch_delay = false;
        self.ll_bit = false;
        self.current_instruction = 0;
    }

    /// Read from general purpose register
    ///
    /// # Arguments
    /// - `index`: Register number (0-31)
    ///
    /// # Returns
    /// Register value. r0 always returns 0.
    #[inline(always)]
    pub fn reg(&self, index: u8) -> u64 {
        if index == 0 {
            0
        } else {
            self.regs[index as usize & 0x1F]
        }
    }

    /// Write to general purpose register
    ///
    /// Writes to r0 are ignored (r0 is always 0).
    ///
    /// # Example
    /// ```
    /// use speedracer::core::config::MachineConfig;
    /// use speedracer::core::cpu::CPU;
    ///
    /// let mut cpu = CPU::new(&MachineConfig::default()).unwrap();
    /// cpu.set_reg(1, 0x12345678);
    /// assert_eq!(cpu.reg(1), 0x12345678);
    ///
    /// cpu.set_reg(0, 0xDEADBEEF);
    /// assert_eq!(cpu.reg(0), 0);
    /// ```
    #[inline(always)]
    pub fn set_reg(&mut self, index: u8, value: u64) {
        if index != 0 {
            self.regs[index as usize & 0x1F] = value;
        }
    }

    /// Write a 32-bit result, sign-extended to 64 bits
    #[inline(always)]
    pub(crate) fn set_reg32(&mut self, index: u8, value: u32) {
        self.set_reg(index, sext32(value));
    }

    /// Get current PC value
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Redirect execution to `pc`, dropping any pending delay-slot branch
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
        self.next_pc = pc.wrapping_add(4);
        self.branch_pending = None;
    }

    pub fn next_pc(&self) -> u32 {
        self.next_pc
    }

    pub fn hi(&self) -> u64 {
        self.hi
    }

    pub fn lo(&self) -> u64 {
        self.lo
    }

    /// Branch target waiting on the delay slot at `pc`, if any
    pub fn branch_pending(&self) -> Option<u32> {
        self.branch_pending
    }

    /// Check if the instruction at `pc` is a branch delay slot
    pub fn in_delay_slot(&self) -> bool {
        self.branch_pending.is_some()
    }

    /// Raw encoding of the most recently fetched instruction
    pub fn current_instruction(&self) -> u32 {
        self.current_instruction
    }

    pub fn cop0(&self) -> &COP0 {
        &self.cop0
    }

    pub fn cop0_mut(&mut self) -> &mut COP0 {
        &mut self.cop0
    }

    pub fn tlb(&self) -> &Tlb {
        &self.tlb
    }

    /// Connect the external interrupt lines
    ///
    /// Their level is copied into Cause.IP2..IP6 at the start of every step.
    pub fn connect_interrupt_lines(&mut self, lines: InterruptLines) {
        self.interrupt_lines = Some(lines);
    }

    /// Execute one instruction
    ///
    /// This is the main CPU execution step. It performs:
    /// 1. Interrupt line latch and interrupt check
    /// 2. Instruction fetch through the MMU
    /// 3. Decode and execution
    /// 4. PC update (with delay slot handling)
    /// 5. Count advance
    ///
    /// Guest faults never escape as errors: they are delivered through the
    /// exception vector and reported in the returned [`StepEvent`].
    ///
    /// # Example
    ///
    /// ```
    /// use speedracer::core::config::MachineConfig;
    /// use speedracer::core::cpu::{StepEvent, CPU};
    /// use speedracer::core::memory::Bus;
    ///
    /// let mut cpu = CPU::new(&MachineConfig::default()).unwrap();
    /// let mut bus = Bus::new();
    /// bus.load_prom_bytes(&[0x00, 0x00, 0x00, 0x00]).unwrap(); // nop
    ///
    /// assert_eq!(cpu.step(&mut bus), StepEvent::Retired);
    /// assert_eq!(cpu.pc(), 0xBFC0_0004);
    /// ```
    pub fn step<B: PhysicalBus + ?Sized>(&mut self, bus: &mut B) -> StepEvent {
        if let Some(lines) = &self.interrupt_lines {
            let level = lines.level();
            self.cop0.latch_lines(level);
        }

        let event = if self.cop0.interrupt_ready() {
            self.in_branch_delay = self.branch_pending.is_some();
            self.raise(Exception::new(ExceptionCause::Interrupt));
            StepEvent::Exception(ExceptionCause::Interrupt)
        } else {
            let delay_target = self.branch_pending.take();
            self.in_branch_delay = delay_target.is_some();
            self.next_pc = self.pc.wrapping_add(4);
            self.branch_request = None;

            match self.execute_next(bus) {
                Ok(()) => {
                    self.pc = delay_target.unwrap_or(self.next_pc);
                    self.next_pc = self.pc.wrapping_add(4);
                    self.branch_pending = self.branch_request.take();
                    StepEvent::Retired
                }
                Err(exception) => {
                    self.raise(exception);
                    StepEvent::Exception(exception.cause)
                }
            }
        };

        self.cop0.tick(self.count_per_step);
        event
    }

    /// Enter the exception vector for `exception`
    ///
    /// `pc` must still hold the address of the faulting instruction and
    /// `in_branch_delay` must say whether it is a delay slot.
    pub(crate) fn raise(&mut self, exception: Exception) {
        let status = self.cop0.status();
        let exl_was_set = status.contains(Status::EXL);

        let mut cause = self.cop0.cause() & !(COP0::CAUSE_EXC_CODE_MASK | COP0::CAUSE_CE_MASK);
        cause |= (exception.cause as u32) << 2;
        if exception.cause == ExceptionCause::CoprocessorUnusable {
            cause |= (exception.coprocessor as u32) << 28;
        }

        // A nested exception keeps the original EPC and BD
        let mut epc = self.cop0.read(COP0::EPC);
        if !exl_was_set {
            if self.in_branch_delay {
                epc = sext32(self.pc.wrapping_sub(4));
                cause |= COP0::CAUSE_BD;
            } else {
                epc = sext32(self.pc);
                cause &= !COP0::CAUSE_BD;
            }
            self.cop0.write(COP0::EPC, epc);
        }
        self.cop0.set_raw(COP0::CAUSE, cause);
        self.cop0.set_status(status | Status::EXL);

        if let Some(vaddr) = exception.bad_vaddr {
            self.cop0.set_raw(COP0::BAD_VADDR, vaddr);

            if exception.cause.is_tlb() {
                let context = self.cop0.read32(COP0::CONTEXT);
                let bad_vpn2 = ((vaddr >> 13) << 4) & COP0::CONTEXT_BAD_VPN2_MASK;
                self.cop0.set_raw(
                    COP0::CONTEXT,
                    (context & !COP0::CONTEXT_BAD_VPN2_MASK) | bad_vpn2,
                );

                let asid = self.cop0.asid() as u32;
                self.cop0
                    .set_raw(COP0::ENTRY_HI, (vaddr & 0xFFFF_E000) | asid);
            }
        }

        let base = if status.contains(Status::BEV) {
            0xBFC0_0200
        } else {
            0x8000_0000
        };
        let offset = if exception.refill && !exl_was_set {
            0x000
        } else {
            0x180
        };
        let handler = base + offset;

        if exception.cause == ExceptionCause::Interrupt {
            log::debug!(
                "INTERRUPT: IP=0x{:02X}, EPC=0x{:08X}, handler=0x{:08X}",
                self.cop0.hw_pending(),
                epc as u32,
                handler
            );
        } else {
            log::warn!(
                "EXCEPTION: cause={:?}, EPC=0x{:08X}, BadVAddr={:X?}, handler=0x{:08X}, in_delay={}, instruction=0x{:08X}",
                exception.cause,
                epc as u32,
                exception.bad_vaddr,
                handler,
                self.in_branch_delay,
                self.current_instruction
            );
        }

        self.pc = handler;
        self.next_pc = handler.wrapping_add(4);
        self.branch_pending = None;
        self.branch_request = None;
        self.in_branch_delay = false;
    }

    /// Read the instruction word at `pc` without side effects
    ///
    /// Returns `None` if the fetch would fault.
    pub fn peek_instruction<B: PhysicalBus + ?Sized>(&self, bus: &B) -> Option<u32> {
        if self.pc & 0x3 != 0 {
            return None;
        }
        let paddr = self
            .tlb
            .translate(self.pc, AccessKind::Fetch, &self.cop0)
            .ok()?;
        bus.fetch32(paddr).ok()
    }

    /// Capture a serializable snapshot of the architectural state
    pub fn state(&self) -> CpuState {
        let c = &self.cop0;
        CpuState {
            pc: self.pc,
            next_pc: self.next_pc,
            branch_pending: self.branch_pending,
            gpr: std::array::from_fn(|i| self.reg(i as u8)),
            hi: self.hi,
            lo: self.lo,
            cop0: Cop0State {
                index: c.read32(COP0::INDEX),
                random: c.read32(COP0::RANDOM),
                entry_lo0: c.read32(COP0::ENTRY_LO0),
                entry_lo1: c.read32(COP0::ENTRY_LO1),
                context: c.read32(COP0::CONTEXT),
                page_mask: c.read32(COP0::PAGE_MASK),
                wired: c.read32(COP0::WIRED),
                bad_vaddr: c.read32(COP0::BAD_VADDR),
                count: c.read32(COP0::COUNT),
                entry_hi: c.read32(COP0::ENTRY_HI),
                compare: c.read32(COP0::COMPARE),
                status: c.read32(COP0::STATUS),
                cause: c.read32(COP0::CAUSE),
                epc: c.read(COP0::EPC),
                prid: c.read32(COP0::PRID),
                error_epc: c.read(COP0::ERROR_EPC),
            },
        }
    }

    /// Dump all CPU registers for debugging
    ///
    /// Prints a formatted dump of all CPU state including:
    /// - Program counter (PC) and pending branch
    /// - HI and LO registers
    /// - All 32 general-purpose registers
    /// - The exception and TLB registers of COP0
    pub fn dump_registers(&self) {
        println!("CPU Registers:");
        match self.branch_pending {
            Some(target) => println!(
                "PC: 0x{:08X}  (delay slot, branch to 0x{:08X})",
                self.pc, target
            ),
            None => println!("PC: 0x{:08X}", self.pc),
        }
        println!("HI: 0x{:016X}  LO: 0x{:016X}", self.hi, self.lo);
        println!();

        // Print general-purpose registers in rows of 4
        for i in 0..32 {
            if i % 4 == 0 && i > 0 {
                println!();
            }
            print!("r{:2}: 0x{:016X}  ", i, self.reg(i));
        }
        println!("\n");

        let c = &self.cop0;
        println!("COP0 Registers:");
        println!("Status:   0x{:08X}", c.read32(COP0::STATUS));
        println!("Cause:    0x{:08X}", c.read32(COP0::CAUSE));
        println!("EPC:      0x{:016X}", c.read(COP0::EPC));
        println!("ErrorEPC: 0x{:016X}", c.read(COP0::ERROR_EPC));
        println!("BadVAddr: 0x{:08X}", c.read32(COP0::BAD_VADDR));
        println!(
            "Count:    0x{:08X}  Compare: 0x{:08X}",
            c.read32(COP0::COUNT),
            c.read32(COP0::COMPARE)
        );
        println!(
            "EntryHi:  0x{:08X}  PageMask: 0x{:08X}",
            c.read32(COP0::ENTRY_HI),
            c.read32(COP0::PAGE_MASK)
        );
        println!(
            "EntryLo0: 0x{:08X}  EntryLo1: 0x{:08X}",
            c.read32(COP0::ENTRY_LO0),
            c.read32(COP0::ENTRY_LO1)
        );
        println!(
            "Index:    0x{:08X}  Random: {}  Wired: {}",
            c.read32(COP0::INDEX),
            c.random(),
            c.wired()
        );
        println!("PRId:     0x{:08X}", c.read32(COP0::PRID));
    }
}
