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

//! Core emulation components
//!
//! This module contains the processor core and what it plugs into:
//! - CPU (MIPS R4000/R10000 programming model, 32-bit addressing)
//! - CP0 (System Control Coprocessor) and the software-managed TLB
//! - Physical memory bus with MMIO dispatch
//! - External interrupt lines
//! - System integration

pub mod config;
pub mod cpu;
pub mod error;
pub mod interrupt;
pub mod memory;
pub mod system;

// Re-export commonly used types
pub use config::MachineConfig;
pub use cpu::CPU;
pub use error::{EmulatorError, Result};
pub use interrupt::InterruptLines;
pub use memory::{Bus, PhysicalBus};
pub use system::System;
