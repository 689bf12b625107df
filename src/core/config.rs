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

//! Machine configuration
//!
//! Construction-time parameters for the CPU core and the physical bus.
//! Every field has a default matching an Octane-class machine, so a config
//! file only needs to list what it overrides:
//!
//! ```toml
//! tlb_size = 48
//! count_per_step = 2
//! ram_size = 0x0400_0000
//! ```
//!
//! Configuration problems are reported by [`MachineConfig::validate`] so that
//! a bad machine fails construction instead of misbehaving at run time.

use crate::core::error::{EmulatorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest TLB the 6-bit Index/Random/Wired fields can address
pub const MAX_TLB_SIZE: usize = 64;

/// Machine configuration
///
/// # Example
///
/// ```
/// use speedracer::core::config::MachineConfig;
///
/// let config: MachineConfig = toml::from_str("tlb_size = 48").unwrap();
/// assert_eq!(config.tlb_size, 48);
/// assert_eq!(config.count_per_step, 1);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Number of TLB entries (each maps an even/odd page pair)
    pub tlb_size: usize,

    /// CP0 Count increment applied per retired step
    pub count_per_step: u32,

    /// Main RAM size in bytes, mapped at physical address 0
    pub ram_size: usize,

    /// PROM window size in bytes, mapped at physical 0x1FC00000
    pub prom_size: usize,

    /// Virtual address of the first instruction after reset
    pub reset_vector: u32,

    /// Value reported by the read-only PRId register
    pub prid: u32,
}

impl MachineConfig {
    /// Default TLB size (R10000)
    pub const DEFAULT_TLB_SIZE: usize = 64;

    /// Default reset vector (PROM entry, KSEG1)
    pub const DEFAULT_RESET_VECTOR: u32 = 0xBFC0_0000;

    /// Default PRId: implementation 0x09 (R10000), revision 0
    pub const DEFAULT_PRID: u32 = 0x0000_0900;

    /// Load a configuration from a TOML file
    ///
    /// The result is validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns `EmulatorError::Io` if the file cannot be read,
    /// `EmulatorError::ConfigParse` on malformed TOML, or the
    /// [`validate`](Self::validate) error for out-of-range values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        log::debug!("Loaded machine config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Check the configuration for values the core cannot be built with
    pub fn validate(&self) -> Result<()> {
        if self.tlb_size == 0 {
            return Err(EmulatorError::ZeroSizedTlb);
        }
        if self.tlb_size > MAX_TLB_SIZE {
            return Err(EmulatorError::TlbTooLarge(self.tlb_size));
        }
        if self.count_per_step == 0 {
            return Err(EmulatorError::ZeroCountScale);
        }
        if self.ram_size == 0 || self.ram_size > 0x1FC0_0000 {
            return Err(EmulatorError::InvalidMemorySize {
                name: "RAM",
                size: self.ram_size,
            });
        }
        if self.prom_size == 0 || self.prom_size > 0x0040_0000 {
            return Err(EmulatorError::InvalidMemorySize {
                name: "PROM",
                size: self.prom_size,
            });
        }
        if self.reset_vector & 0x3 != 0 {
            return Err(EmulatorError::Config(format!(
                "reset vector 0x{:08X} is not word aligned",
                self.reset_vector
            )));
        }
        Ok(())
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            tlb_size: Self::DEFAULT_TLB_SIZE,
            count_per_step: 1,
            ram_size: 8 * 1024 * 1024,
            prom_size: 1024 * 1024,
            reset_vector: Self::DEFAULT_RESET_VECTOR,
            prid: Self::DEFAULT_PRID,
        }
    }
}
