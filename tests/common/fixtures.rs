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

//! Test fixtures for common test scenarios

use speedracer::core::config::MachineConfig;
use speedracer::core::system::System;

/// Big-endian PROM image for a list of instruction words
#[allow(dead_code)]
pub fn prom_image(program: &[u32]) -> Vec<u8> {
    program.iter().flat_map(|word| word.to_be_bytes()).collect()
}

#[allow(dead_code)]
pub fn create_test_system() -> System {
    System::new(&MachineConfig::default()).expect("default machine must build")
}

/// System booting `program` from the reset vector
#[allow(dead_code)]
pub fn system_with_program(program: &[u32]) -> System {
    let mut system = create_test_system();
    system
        .load_prom_bytes(&prom_image(program))
        .expect("Failed to load PROM image");
    system.reset();
    system
}

/// Step until the first exception, returning the 1-based step it happened on
#[allow(dead_code)]
pub fn step_until_exception(system: &mut System, max_steps: usize) -> Option<usize> {
    (1..=max_steps).find(|_| system.step() != speedracer::core::cpu::StepEvent::Retired)
}
