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

//! Hand-assembled guest programs
//!
//! All programs start at the reset vector (0xBFC00000) in kernel mode with
//! Status.BEV set. PROM bytes past the end of a program read as 0xFF, so
//! each program ends in a self loop.

/// Where the PROM image is looked up for the PROM boot tests
#[allow(dead_code)]
pub fn get_prom_path() -> Option<String> {
    std::env::var("SPEEDRACER_PROM").ok().or_else(|| {
        let default_path = "roms/ip30prom.rev4.9.bin";
        if std::path::Path::new(default_path).exists() {
            Some(default_path.to_string())
        } else {
            None
        }
    })
}

#[allow(dead_code)]
pub fn is_prom_available() -> bool {
    get_prom_path().is_some()
}

const NOP: u32 = 0x0000_0000;

/// `j .` at 0xBFC00000 + `offset`, followed by its delay slot
fn spin(offset: u32) -> [u32; 2] {
    let target = 0xBFC0_0000 + offset;
    [(0x02 << 26) | ((target >> 2) & 0x03FF_FFFF), NOP]
}

/// LUI/ADDI boot sequence; $t0 ends up 0x12345678
#[allow(dead_code)]
pub fn test_program_boot() -> Vec<u32> {
    vec![
        0x3C08_1234, // LUI   $t0, 0x1234
        0x2108_5678, // ADDI  $t0, $t0, 0x5678
    ]
}

/// Branch over one instruction; $3 stays 0 and $4 = 0x99
#[allow(dead_code)]
pub fn test_program_branch() -> Vec<u32> {
    let mut program = vec![
        0x2401_0001, // ADDIU $1, $0, 1
        0x2402_0001, // ADDIU $2, $0, 1
        0x1022_0002, // BEQ   $1, $2, +2
        0x2405_0007, // ADDIU $5, $0, 7     ; delay slot, executed
        0x2403_0042, // ADDIU $3, $0, 0x42  ; skipped
        0x2404_0099, // ADDIU $4, $0, 0x99  ; branch target
    ];
    program.extend(spin(24));
    program
}

/// Map virtual 0x00400000 to physical 0x10000 through TLBWI, then load
/// from it into $t0
#[allow(dead_code)]
pub fn test_program_tlb_map() -> Vec<u32> {
    let mut program = vec![
        0x3C1A_0040, // LUI   $k0, 0x0040
        0x409A_5000, // MTC0  $k0, EntryHi
        0x341B_0416, // ORI   $k1, $0, 0x0416   ; PFN 0x10, C=2, D, V
        0x409B_1000, // MTC0  $k1, EntryLo0
        0x4080_1800, // MTC0  $0, EntryLo1
        0x4080_2800, // MTC0  $0, PageMask
        0x4080_0000, // MTC0  $0, Index
        0x4200_0002, // TLBWI
        0x8F48_0000, // LW    $t0, 0($k0)
        0xAF48_0004, // SW    $t0, 4($k0)
    ];
    program.extend(spin(40));
    program
}

/// Load through an unmapped KUSEG address
#[allow(dead_code)]
pub fn test_program_tlb_miss() -> Vec<u32> {
    let mut program = vec![
        0x3C1A_0040, // LUI   $k0, 0x0040
        0x8F48_0000, // LW    $t0, 0($k0)
    ];
    program.extend(spin(8));
    program
}

/// Arm the timer for Count == 5 and enable IM7
#[allow(dead_code)]
pub fn test_program_timer() -> Vec<u32> {
    let mut program = vec![
        0x3408_0005, // ORI   $t0, $0, 5
        0x4088_5800, // MTC0  $t0, Compare
        0x3C09_0040, // LUI   $t1, 0x0040       ; BEV
        0x3529_8001, // ORI   $t1, $t1, 0x8001  ; IM7 | IE
        0x4089_6000, // MTC0  $t1, Status
    ];
    program.extend(spin(20));
    program
}

/// Enable IM2 and spin waiting for a device interrupt
#[allow(dead_code)]
pub fn test_program_wait_for_device() -> Vec<u32> {
    let mut program = vec![
        0x3C09_0040, // LUI   $t1, 0x0040       ; BEV
        0x3529_0401, // ORI   $t1, $t1, 0x0401  ; IM2 | IE
        0x4089_6000, // MTC0  $t1, Status
    ];
    program.extend(spin(12));
    program
}
