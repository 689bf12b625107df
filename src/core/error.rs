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

/// Emulator error types
///
/// These are host-level failures only. Anything the guest can cause at run
/// time (bad opcodes, TLB misses, unmapped physical addresses) is delivered
/// to the guest as a CPU exception instead.
use thiserror::Error;

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Main error type for the emulator
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("PROM file not found: {0}")]
    PromNotFound(String),

    #[error("PROM image too large: {got} bytes (PROM window is {max} bytes)")]
    PromTooLarge { max: usize, got: usize },

    #[error("TLB must have at least one entry")]
    ZeroSizedTlb,

    #[error("TLB size {0} exceeds the 6-bit Index field (max 64)")]
    TlbTooLarge(usize),

    #[error("Invalid {name} size: {size} bytes")]
    InvalidMemorySize { name: &'static str, size: usize },

    #[error("count_per_step must be non-zero")]
    ZeroCountScale,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
