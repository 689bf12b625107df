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

//! SGI Octane class MIPS emulator core library
//!
//! This library provides the processor core of a MIPS R4000/R10000 style
//! machine: the CPU with branch delay slots, the CP0 exception and timer
//! state, the software-managed TLB, and a physical bus for RAM, PROM and
//! memory-mapped devices.
//!
//! # Example
//!
//! ```
//! use speedracer::core::config::MachineConfig;
//! use speedracer::core::cpu::CPU;
//! use speedracer::core::memory::Bus;
//!
//! let config = MachineConfig::default();
//! let mut cpu = CPU::new(&config).unwrap();
//! let mut bus = Bus::with_config(&config);
//!
//! // lui t0, 0x1234 ; addi t0, t0, 0x5678
//! bus.load_prom_bytes(&[0x3C, 0x08, 0x12, 0x34, 0x21, 0x08, 0x56, 0x78])
//!     .unwrap();
//!
//! cpu.step(&mut bus);
//! cpu.step(&mut bus);
//! assert_eq!(cpu.reg(8), 0x1234_5678);
//! assert_eq!(cpu.pc(), 0xBFC0_0008);
//! ```

pub mod core;
