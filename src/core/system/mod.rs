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

//! System integration module
//!
//! This module ties the CPU, the physical bus and the interrupt lines
//! together and provides the bounded execution loop.

use super::config::MachineConfig;
use super::cpu::{CpuState, CpuTracer, StepEvent, CPU};
use super::error::Result;
use super::interrupt::InterruptLines;
use super::memory::Bus;
use serde::Serialize;

/// Totals reported by [`System::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Steps taken (retired instructions plus exception entries)
    pub steps: u64,
    /// Instructions that retired normally
    pub retired: u64,
    /// Exception and interrupt entries
    pub exceptions: u64,
}

/// Octane class machine
///
/// Owns the CPU and the bus, and hands out the interrupt line handle that
/// devices use to signal the CPU.
///
/// # Components
/// - CPU: MIPS core with CP0 and TLB
/// - Bus: RAM, PROM and MMIO devices
/// - InterruptLines: level-triggered IP2..IP6 inputs
///
/// # Example
/// ```no_run
/// use speedracer::core::config::MachineConfig;
/// use speedracer::core::system::System;
///
/// let mut system = System::new(&MachineConfig::default()).unwrap();
/// system.load_prom("ip30prom.rev4.9.bin").unwrap();
/// let summary = system.run(1000);
/// println!("retired {} instructions", summary.retired);
/// ```
pub struct System {
    /// CPU instance
    cpu: CPU,
    /// Physical bus
    bus: Bus,
    /// Device interrupt lines (shared with the CPU)
    lines: InterruptLines,
    /// Steps executed since reset
    steps: u64,
    /// Exception entries since reset
    exceptions: u64,
    /// CPU tracer for debugging (optional)
    tracer: Option<CpuTracer>,
    /// Maximum instructions to trace (0 = unlimited)
    trace_limit: usize,
    /// Number of instructions traced so far
    trace_count: usize,
}

impl System {
    /// Create a new System for the given machine configuration
    ///
    /// # Errors
    ///
    /// Returns the configuration error if the machine cannot be built,
    /// e.g. for a zero-sized TLB.
    pub fn new(config: &MachineConfig) -> Result<Self> {
        let mut cpu = CPU::new(config)?;
        let bus = Bus::with_config(config);
        let lines = InterruptLines::new();
        cpu.connect_interrupt_lines(lines.clone());

        log::info!(
            "System created: {} TLB entries, {} KiB RAM, reset vector 0x{:08X}",
            config.tlb_size,
            config.ram_size / 1024,
            config.reset_vector
        );

        Ok(Self {
            cpu,
            bus,
            lines,
            steps: 0,
            exceptions: 0,
            tracer: None,
            trace_limit: 0,
            trace_count: 0,
        })
    }

    /// Load a PROM image from file
    ///
    /// # Returns
    ///
    /// Number of bytes loaded
    ///
    /// # Errors
    ///
    /// `PromNotFound` if the file cannot be opened, `PromTooLarge` if it
    /// does not fit the PROM window.
    pub fn load_prom(&mut self, path: &str) -> Result<usize> {
        self.bus.load_prom(path)
    }

    /// Load a PROM image from memory
    pub fn load_prom_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.bus.load_prom_bytes(data)
    }

    /// Reset the system to initial state
    ///
    /// Clears RAM but preserves the loaded PROM. Every interrupt line is
    /// lowered.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.bus.reset();
        self.lines.clear();
        self.steps = 0;
        self.exceptions = 0;
        self.trace_count = 0;
    }

    /// Execute one CPU step
    ///
    /// Guest faults are reported in the returned event; they never stop the
    /// system.
    pub fn step(&mut self) -> StepEvent {
        self.trace_step();

        let event = self.cpu.step(&mut self.bus);
        self.steps += 1;
        if let StepEvent::Exception(_) = event {
            self.exceptions += 1;
        }
        event
    }

    /// Execute up to `max_instructions` steps
    ///
    /// # Example
    ///
    /// ```
    /// use speedracer::core::config::MachineConfig;
    /// use speedracer::core::system::System;
    ///
    /// let mut system = System::new(&MachineConfig::default()).unwrap();
    /// system.load_prom_bytes(&[0u8; 64]).unwrap(); // nops
    ///
    /// let summary = system.run(10);
    /// assert_eq!(summary.retired, 10);
    /// assert_eq!(system.pc(), 0xBFC0_0028);
    /// ```
    pub fn run(&mut self, max_instructions: u64) -> RunSummary {
        let mut summary = RunSummary::default();
        for _ in 0..max_instructions {
            match self.step() {
                StepEvent::Retired => summary.retired += 1,
                StepEvent::Exception(_) => summary.exceptions += 1,
            }
            summary.steps += 1;
        }

        if let Some(tracer) = self.tracer.as_mut() {
            if let Err(e) = tracer.flush() {
                log::warn!("Failed to flush trace: {}", e);
            }
        }

        log::debug!(
            "Ran {} steps ({} exceptions), pc=0x{:08X}",
            summary.steps,
            summary.exceptions,
            self.cpu.pc()
        );
        summary
    }

    fn trace_step(&mut self) {
        let Some(tracer) = self.tracer.as_mut() else {
            return;
        };

        if self.trace_limit == 0 || self.trace_count < self.trace_limit {
            if let Err(e) = tracer.trace(&self.cpu, &self.bus) {
                log::warn!("Failed to write trace: {}", e);
            }
            self.trace_count += 1;

            // Flush every 100 instructions to ensure data is written
            if self.trace_count.is_multiple_of(100) {
                let _ = tracer.flush();
            }
        } else if tracer.is_enabled() {
            log::info!(
                "Trace limit reached ({} instructions), disabling tracer",
                self.trace_limit
            );
            let _ = tracer.flush();
            tracer.set_enabled(false);
        }
    }

    /// Get current PC value
    pub fn pc(&self) -> u32 {
        self.cpu.pc()
    }

    /// Steps executed since reset
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Exception entries since reset
    pub fn exceptions(&self) -> u64 {
        self.exceptions
    }

    pub fn cpu(&self) -> &CPU {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut CPU {
        &mut self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Handle for driving the external interrupt lines
    ///
    /// The handle is `Send`, so a device thread may keep its own clone.
    pub fn interrupt_lines(&self) -> InterruptLines {
        self.lines.clone()
    }

    /// Serializable snapshot of the CPU state
    pub fn state(&self) -> CpuState {
        self.cpu.state()
    }

    /// Enable CPU execution tracing
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the trace file to write
    /// * `limit` - Maximum number of instructions to trace (0 = unlimited)
    pub fn enable_tracing(&mut self, path: &str, limit: usize) -> Result<()> {
        self.tracer = Some(CpuTracer::new(path)?);
        self.trace_limit = limit;
        self.trace_count = 0;
        log::info!(
            "CPU tracing enabled: {} (limit: {})",
            path,
            if limit == 0 {
                "unlimited".to_string()
            } else {
                limit.to_string()
            }
        );
        Ok(())
    }

    /// Disable CPU execution tracing
    pub fn disable_tracing(&mut self) {
        if let Some(mut tracer) = self.tracer.take() {
            let _ = tracer.flush();
            log::info!(
                "CPU tracing disabled (traced {} instructions)",
                self.trace_count
            );
            self.trace_limit = 0;
            self.trace_count = 0;
        }
    }

    pub fn is_tracing(&self) -> bool {
        self.tracer.is_some()
    }

    pub fn trace_count(&self) -> usize {
        self.trace_count
    }
}

#[cfg(test)]
mod tests;
