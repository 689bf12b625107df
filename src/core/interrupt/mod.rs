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

//! External interrupt lines
//!
//! Devices drive the five hardware interrupt inputs IP2..IP6 of Cause.
//! The lines are level triggered: a line stays asserted until the device
//! lowers it, and the CPU copies their state into Cause.IP only at the
//! start of each step.
//!
//! ## Line Assignment
//!
//! ```text
//! Line | Cause bit | Use
//! -----|-----------|----------------------------------
//! 0-1  | IP0-IP1   | Software interrupts (CP0 writable, not lines)
//! 2-6  | IP2-IP6   | External device lines
//! 7    | IP7       | Count/Compare timer (internal)
//! ```
//!
//! [`InterruptLines`] is a cheap cloneable handle around a shared atomic,
//! so a device running on another thread can raise a line while the CPU
//! keeps executing.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Lowest line number a device may drive
pub const FIRST_LINE: u8 = 2;

/// Highest line number a device may drive
pub const LAST_LINE: u8 = 6;

/// Bits of the line set devices can drive (IP2..IP6)
pub const LINE_MASK: u8 = 0x7C;

/// Shared, level-triggered interrupt line set
///
/// # Example
///
/// ```
/// use speedracer::core::interrupt::InterruptLines;
///
/// let lines = InterruptLines::new();
/// let device = lines.clone();
///
/// device.raise(3);
/// assert_eq!(lines.level(), 1 << 3);
///
/// device.lower(3);
/// assert_eq!(lines.level(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InterruptLines {
    level: Arc<AtomicU8>,
}

impl InterruptLines {
    /// Create a line set with every line deasserted
    pub fn new() -> Self {
        Self::default()
    }

    /// Assert a device line (2..=6)
    ///
    /// Lines outside that range are ignored with a warning.
    pub fn raise(&self, line: u8) {
        if let Some(bit) = Self::line_bit(line) {
            let old = self.level.fetch_or(bit, Ordering::AcqRel);
            if old & bit == 0 {
                log::trace!("IRQ line {} raised", line);
            }
        }
    }

    /// Deassert a device line (2..=6)
    pub fn lower(&self, line: u8) {
        if let Some(bit) = Self::line_bit(line) {
            let old = self.level.fetch_and(!bit, Ordering::AcqRel);
            if old & bit != 0 {
                log::trace!("IRQ line {} lowered", line);
            }
        }
    }

    /// Drive a line to the given level
    pub fn set_level(&self, line: u8, asserted: bool) {
        if asserted {
            self.raise(line);
        } else {
            self.lower(line);
        }
    }

    /// Current line set, bit N = line N (only bits 2..=6 can be set)
    pub fn level(&self) -> u8 {
        self.level.load(Ordering::Acquire) & LINE_MASK
    }

    /// Check whether a single line is asserted
    pub fn is_raised(&self, line: u8) -> bool {
        Self::line_bit(line).is_some_and(|bit| self.level() & bit != 0)
    }

    /// Deassert every line
    pub fn clear(&self) {
        self.level.store(0, Ordering::Release);
    }

    fn line_bit(line: u8) -> Option<u8> {
        if (FIRST_LINE..=LAST_LINE).contains(&line) {
            Some(1 << line)
        } else {
            log::warn!("Ignoring interrupt line {} (devices drive 2-6)", line);
            None
        }
    }
}
