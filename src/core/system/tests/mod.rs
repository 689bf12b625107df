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

//! System module tests
//!
//! Tests are grouped by what they exercise: construction and reset,
//! bounded execution, and the interrupt line path into the CPU.

mod execution;

use super::*;

/// Build a system whose PROM holds `words` from the reset vector on
pub(super) fn system_with_prom(words: &[u32]) -> System {
    let mut system = System::new(&MachineConfig::default()).unwrap();
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
    system.load_prom_bytes(&bytes).unwrap();
    system
}
