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

//! CPU execution tracer for debugging
//!
//! Logs CPU execution state to a file for analysis and debugging.

use super::{Disassembler, CPU};
use crate::core::error::Result;
use crate::core::memory::PhysicalBus;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// CPU execution tracer
///
/// Records CPU state before each instruction. Each line shows:
/// - Program counter (marked `*` when it is a delay slot)
/// - Raw instruction encoding
/// - Disassembled instruction
/// - Values of selected registers
///
/// # Example
/// ```no_run
/// use speedracer::core::config::MachineConfig;
/// use speedracer::core::cpu::{CpuTracer, CPU};
/// use speedracer::core::memory::Bus;
///
/// let mut cpu = CPU::new(&MachineConfig::default()).unwrap();
/// let mut bus = Bus::new();
/// let mut tracer = CpuTracer::new("trace.log").unwrap();
///
/// tracer.trace(&cpu, &bus).unwrap();
/// cpu.step(&mut bus);
/// ```
pub struct CpuTracer {
    /// Enable/disable tracing
    enabled: bool,
    /// Output file handle
    output: BufWriter<File>,
    /// Registers printed after the disassembly
    regs: Vec<u8>,
}

impl CpuTracer {
    /// Registers shown by default: v0, a0, a1, t0, sp, ra
    pub const DEFAULT_REGS: [u8; 6] = [2, 4, 5, 8, 29, 31];

    /// Create a new CPU tracer
    ///
    /// Opens a file for writing trace output. If the file exists, it will be
    /// overwritten.
    ///
    /// # Errors
    ///
    /// `EmulatorError::Io` if file creation fails
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let output = File::create(path)?;
        Ok(Self {
            enabled: true,
            output: BufWriter::new(output),
            regs: Self::DEFAULT_REGS.to_vec(),
        })
    }

    /// Choose which registers each line shows (up to 8)
    pub fn with_regs(mut self, regs: &[u8]) -> Self {
        self.regs = regs.iter().take(8).map(|r| r & 0x1F).collect();
        self
    }

    /// Enable or disable tracing
    ///
    /// When disabled, trace() calls return immediately without writing.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Trace the instruction about to execute
    ///
    /// The instruction is fetched through the MMU without side effects. If
    /// the fetch would fault, the line says so instead of a disassembly.
    pub fn trace<B: PhysicalBus + ?Sized>(&mut self, cpu: &CPU, bus: &B) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let pc = cpu.pc();
        let marker = if cpu.in_delay_slot() { '*' } else { ' ' };

        match cpu.peek_instruction(bus) {
            Some(instruction) => write!(
                self.output,
                "PC=0x{:08X}{} [0x{:08X}] {:32} |",
                pc,
                marker,
                instruction,
                Disassembler::disassemble(instruction, pc)
            )?,
            None => write!(
                self.output,
                "PC=0x{:08X}{} [--------] {:32} |",
                pc, marker, "<fetch fault>"
            )?,
        }

        for &reg in &self.regs {
            write!(self.output, " r{}={:016X}", reg, cpu.reg(reg))?;
        }
        writeln!(self.output)?;

        Ok(())
    }

    /// Flush the output buffer
    ///
    /// Forces any buffered trace data to be written to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::MachineConfig;
    use crate::core::memory::Bus;

    fn setup() -> (CPU, Bus) {
        let cpu = CPU::new(&MachineConfig::default()).unwrap();
        let mut bus = Bus::new();
        // lui r8, 0x1234 ; nop
        bus.load_prom_bytes(&[0x3C, 0x08, 0x12, 0x34, 0x00, 0x00, 0x00, 0x00])
            .unwrap();
        (cpu, bus)
    }

    #[test]
    fn test_tracer_enable_disable() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut tracer = CpuTracer::new(file.path()).unwrap();
        assert!(tracer.is_enabled());

        tracer.set_enabled(false);
        assert!(!tracer.is_enabled());

        tracer.set_enabled(true);
        assert!(tracer.is_enabled());
    }

    #[test]
    fn test_tracer_basic_trace() {
        let (mut cpu, mut bus) = setup();
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut tracer = CpuTracer::new(file.path()).unwrap();

        tracer.trace(&cpu, &bus).unwrap();
        cpu.step(&mut bus);
        tracer.trace(&cpu, &bus).unwrap();
        tracer.flush().unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("PC=0xBFC00000"));
        assert!(lines[0].contains("lui r8, 0x1234"));
        assert!(lines[1].contains("nop"));
        assert!(lines[1].contains("r8=0000000012340000"));
    }

    #[test]
    fn test_tracer_disabled_writes_nothing() {
        let (cpu, bus) = setup();
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut tracer = CpuTracer::new(file.path()).unwrap();
        tracer.set_enabled(false);

        tracer.trace(&cpu, &bus).unwrap();
        tracer.flush().unwrap();

        assert!(std::fs::read_to_string(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_tracer_with_custom_regs() {
        let (mut cpu, bus) = setup();
        cpu.set_reg(4, 0x12345678);
        cpu.set_reg(5, 0xABCDEF00);

        let file = tempfile::NamedTempFile::new().unwrap();
        let mut tracer = CpuTracer::new(file.path()).unwrap().with_regs(&[4, 5]);
        tracer.trace(&cpu, &bus).unwrap();
        tracer.flush().unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.contains("r4=0000000012345678"));
        assert!(contents.contains("r5=00000000ABCDEF00"));
        assert!(!contents.contains("r31="));
    }

    #[test]
    fn test_tracer_fetch_fault() {
        let (mut cpu, bus) = setup();
        // KUSEG with an empty TLB
        cpu.set_pc(0x0040_0000);

        let file = tempfile::NamedTempFile::new().unwrap();
        let mut tracer = CpuTracer::new(file.path()).unwrap();
        tracer.trace(&cpu, &bus).unwrap();
        tracer.flush().unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.contains("<fetch fault>"));
    }
}
