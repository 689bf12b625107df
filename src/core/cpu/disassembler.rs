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

//! MIPS instruction disassembler for debugging
//!
//! Converts binary instruction encodings to human-readable assembly mnemonics.

use std::fmt;

use super::decode::{decode, Instruction, LoadKind, StoreKind, TrapCond};

/// Instruction disassembler
///
/// # Example
/// ```
/// use speedracer::core::cpu::Disassembler;
///
/// let instruction = 0x00000000; // NOP
/// let disasm = Disassembler::disassemble(instruction, 0xBFC00000);
/// assert_eq!(disasm, "nop");
/// ```
pub struct Disassembler;

impl Disassembler {
    /// Disassemble a single instruction to human-readable format
    ///
    /// # Arguments
    ///
    /// * `instruction` - The 32-bit instruction to disassemble
    /// * `pc` - Address of the instruction (used for branch and jump targets)
    ///
    /// # Example
    /// ```
    /// use speedracer::core::cpu::Disassembler;
    ///
    /// let instruction = 0x3C011234; // LUI r1, 0x1234
    /// let disasm = Disassembler::disassemble(instruction, 0xBFC00000);
    /// assert_eq!(disasm, "lui r1, 0x1234");
    ///
    /// // beq r0, r0, -1 branches back onto itself
    /// assert_eq!(Disassembler::disassemble(0x1000FFFF, 0xBFC00010), "beq r0, r0, 0xBFC00010");
    /// ```
    pub fn disassemble(instruction: u32, pc: u32) -> String {
        match decode(instruction) {
            Ok(decoded) => render(&decoded, Some(pc)),
            Err(_) => format!("illegal 0x{:08X}", instruction),
        }
    }
}

impl fmt::Display for Instruction {
    /// Formats with raw branch offsets and jump fields, since no PC is known
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self, None))
    }
}

fn branch_target(pc: Option<u32>, offset: i16) -> String {
    match pc {
        Some(pc) => {
            let target = pc
                .wrapping_add(4)
                .wrapping_add(((offset as i32) << 2) as u32);
            format!("0x{:08X}", target)
        }
        None => format!("{}", offset),
    }
}

fn jump_target(pc: Option<u32>, target: u32) -> String {
    match pc {
        Some(pc) => format!(
            "0x{:08X}",
            (pc.wrapping_add(4) & 0xF000_0000) | (target << 2)
        ),
        None => format!("0x{:07X}", target << 2),
    }
}

fn trap_suffix(cond: TrapCond) -> &'static str {
    match cond {
        TrapCond::Ge => "ge",
        TrapCond::Geu => "geu",
        TrapCond::Lt => "lt",
        TrapCond::Ltu => "ltu",
        TrapCond::Eq => "eq",
        TrapCond::Ne => "ne",
    }
}

fn load_mnemonic(kind: LoadKind) -> &'static str {
    match kind {
        LoadKind::Lb => "lb",
        LoadKind::Lbu => "lbu",
        LoadKind::Lh => "lh",
        LoadKind::Lhu => "lhu",
        LoadKind::Lw => "lw",
        LoadKind::Lwu => "lwu",
        LoadKind::Ld => "ld",
        LoadKind::Lwl => "lwl",
        LoadKind::Lwr => "lwr",
        LoadKind::Ldl => "ldl",
        LoadKind::Ldr => "ldr",
        LoadKind::Ll => "ll",
    }
}

fn store_mnemonic(kind: StoreKind) -> &'static str {
    match kind {
        StoreKind::Sb => "sb",
        StoreKind::Sh => "sh",
        StoreKind::Sw => "sw",
        StoreKind::Sd => "sd",
        StoreKind::Swl => "swl",
        StoreKind::Swr => "swr",
        StoreKind::Sdl => "sdl",
        StoreKind::Sdr => "sdr",
        StoreKind::Sc => "sc",
    }
}

fn render(instruction: &Instruction, pc: Option<u32>) -> String {
    use Instruction::*;

    match *instruction {
        Sll {
            rd: 0,
            rt: 0,
            sa: 0,
        } => "nop".to_string(),
        Sll { rd, rt, sa } => format!("sll r{}, r{}, {}", rd, rt, sa),
        Srl { rd, rt, sa } => format!("srl r{}, r{}, {}", rd, rt, sa),
        Sra { rd, rt, sa } => format!("sra r{}, r{}, {}", rd, rt, sa),
        Sllv { rd, rt, rs } => format!("sllv r{}, r{}, r{}", rd, rt, rs),
        Srlv { rd, rt, rs } => format!("srlv r{}, r{}, r{}", rd, rt, rs),
        Srav { rd, rt, rs } => format!("srav r{}, r{}, r{}", rd, rt, rs),
        Dsll { rd, rt, sa } => format!("dsll r{}, r{}, {}", rd, rt, sa),
        Dsrl { rd, rt, sa } => format!("dsrl r{}, r{}, {}", rd, rt, sa),
        Dsra { rd, rt, sa } => format!("dsra r{}, r{}, {}", rd, rt, sa),
        Dsll32 { rd, rt, sa } => format!("dsll32 r{}, r{}, {}", rd, rt, sa),
        Dsrl32 { rd, rt, sa } => format!("dsrl32 r{}, r{}, {}", rd, rt, sa),
        Dsra32 { rd, rt, sa } => format!("dsra32 r{}, r{}, {}", rd, rt, sa),
        Dsllv { rd, rt, rs } => format!("dsllv r{}, r{}, r{}", rd, rt, rs),
        Dsrlv { rd, rt, rs } => format!("dsrlv r{}, r{}, r{}", rd, rt, rs),
        Dsrav { rd, rt, rs } => format!("dsrav r{}, r{}, r{}", rd, rt, rs),

        Jr { rs } => format!("jr r{}", rs),
        Jalr { rd, rs } => format!("jalr r{}, r{}", rd, rs),

        Syscall { code } => format!("syscall 0x{:X}", code),
        Break { code } => format!("break 0x{:X}", code),
        Sync => "sync".to_string(),

        Mfhi { rd } => format!("mfhi r{}", rd),
        Mthi { rs } => format!("mthi r{}", rs),
        Mflo { rd } => format!("mflo r{}", rd),
        Mtlo { rs } => format!("mtlo r{}", rs),
        Mult { rs, rt } => format!("mult r{}, r{}", rs, rt),
        Multu { rs, rt } => format!("multu r{}, r{}", rs, rt),
        Div { rs, rt } => format!("div r{}, r{}", rs, rt),
        Divu { rs, rt } => format!("divu r{}, r{}", rs, rt),
        Dmult { rs, rt } => format!("dmult r{}, r{}", rs, rt),
        Dmultu { rs, rt } => format!("dmultu r{}, r{}", rs, rt),
        Ddiv { rs, rt } => format!("ddiv r{}, r{}", rs, rt),
        Ddivu { rs, rt } => format!("ddivu r{}, r{}", rs, rt),

        Add { rd, rs, rt } => format!("add r{}, r{}, r{}", rd, rs, rt),
        Addu { rd, rs, rt } => format!("addu r{}, r{}, r{}", rd, rs, rt),
        Sub { rd, rs, rt } => format!("sub r{}, r{}, r{}", rd, rs, rt),
        Subu { rd, rs, rt } => format!("subu r{}, r{}, r{}", rd, rs, rt),
        And { rd, rs, rt } => format!("and r{}, r{}, r{}", rd, rs, rt),
        Or { rd, rs, rt } => format!("or r{}, r{}, r{}", rd, rs, rt),
        Xor { rd, rs, rt } => format!("xor r{}, r{}, r{}", rd, rs, rt),
        Nor { rd, rs, rt } => format!("nor r{}, r{}, r{}", rd, rs, rt),
        Slt { rd, rs, rt } => format!("slt r{}, r{}, r{}", rd, rs, rt),
        Sltu { rd, rs, rt } => format!("sltu r{}, r{}, r{}", rd, rs, rt),
        Dadd { rd, rs, rt } => format!("dadd r{}, r{}, r{}", rd, rs, rt),
        Daddu { rd, rs, rt } => format!("daddu r{}, r{}, r{}", rd, rs, rt),
        Dsub { rd, rs, rt } => format!("dsub r{}, r{}, r{}", rd, rs, rt),
        Dsubu { rd, rs, rt } => format!("dsubu r{}, r{}, r{}", rd, rs, rt),

        Trap { cond, rs, rt } => format!("t{} r{}, r{}", trap_suffix(cond), rs, rt),
        TrapImm { cond, rs, imm } => format!("t{}i r{}, {}", trap_suffix(cond), rs, imm),

        Bltz {
            rs,
            offset,
            link,
            likely,
        } => format!(
            "bltz{}{} r{}, {}",
            if link { "al" } else { "" },
            if likely { "l" } else { "" },
            rs,
            branch_target(pc, offset)
        ),
        Bgez {
            rs,
            offset,
            link,
            likely,
        } => format!(
            "bgez{}{} r{}, {}",
            if link { "al" } else { "" },
            if likely { "l" } else { "" },
            rs,
            branch_target(pc, offset)
        ),
        Beq {
            rs,
            rt,
            offset,
            likely,
        } => format!(
            "beq{} r{}, r{}, {}",
            if likely { "l" } else { "" },
            rs,
            rt,
            branch_target(pc, offset)
        ),
        Bne {
            rs,
            rt,
            offset,
            likely,
        } => format!(
            "bne{} r{}, r{}, {}",
            if likely { "l" } else { "" },
            rs,
            rt,
            branch_target(pc, offset)
        ),
        Blez { rs, offset, likely } => format!(
            "blez{} r{}, {}",
            if likely { "l" } else { "" },
            rs,
            branch_target(pc, offset)
        ),
        Bgtz { rs, offset, likely } => format!(
            "bgtz{} r{}, {}",
            if likely { "l" } else { "" },
            rs,
            branch_target(pc, offset)
        ),

        J { target } => format!("j {}", jump_target(pc, target)),
        Jal { target } => format!("jal {}", jump_target(pc, target)),

        Addi { rt, rs, imm } => format!("addi r{}, r{}, {}", rt, rs, imm),
        Addiu { rt, rs, imm } => format!("addiu r{}, r{}, {}", rt, rs, imm),
        Daddi { rt, rs, imm } => format!("daddi r{}, r{}, {}", rt, rs, imm),
        Daddiu { rt, rs, imm } => format!("daddiu r{}, r{}, {}", rt, rs, imm),
        Slti { rt, rs, imm } => format!("slti r{}, r{}, {}", rt, rs, imm),
        Sltiu { rt, rs, imm } => format!("sltiu r{}, r{}, {}", rt, rs, imm),
        Andi { rt, rs, imm } => format!("andi r{}, r{}, 0x{:04X}", rt, rs, imm),
        Ori { rt, rs, imm } => format!("ori r{}, r{}, 0x{:04X}", rt, rs, imm),
        Xori { rt, rs, imm } => format!("xori r{}, r{}, 0x{:04X}", rt, rs, imm),
        Lui { rt, imm } => format!("lui r{}, 0x{:04X}", rt, imm),

        Load {
            kind,
            rt,
            base,
            offset,
        } => format!("{} r{}, {}(r{})", load_mnemonic(kind), rt, offset, base),
        Store {
            kind,
            rt,
            base,
            offset,
        } => format!("{} r{}, {}(r{})", store_mnemonic(kind), rt, offset, base),
        Cache => "cache".to_string(),

        Mfc0 { rt, rd } => format!("mfc0 r{}, cop0r{}", rt, rd),
        Dmfc0 { rt, rd } => format!("dmfc0 r{}, cop0r{}", rt, rd),
        Mtc0 { rt, rd } => format!("mtc0 r{}, cop0r{}", rt, rd),
        Dmtc0 { rt, rd } => format!("dmtc0 r{}, cop0r{}", rt, rd),
        Tlbr => "tlbr".to_string(),
        Tlbwi => "tlbwi".to_string(),
        Tlbwr => "tlbwr".to_string(),
        Tlbp => "tlbp".to_string(),
        Eret => "eret".to_string(),
        Wait => "wait".to_string(),

        Coprocessor { unit } => format!("cop{}", unit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_alu() {
        // addiu r29, r29, -16
        assert_eq!(
            Disassembler::disassemble(0x27BD_FFF0, 0),
            "addiu r29, r29, -16"
        );
        // or r4, r5, r0
        assert_eq!(Disassembler::disassemble(0x00A0_2025, 0), "or r4, r5, r0");
        // dsll32 r2, r3, 4
        assert_eq!(
            Disassembler::disassemble(0x0003_113C, 0),
            "dsll32 r2, r3, 4"
        );
    }

    #[test]
    fn test_disassemble_memory() {
        // lw r8, 4(r29)
        assert_eq!(Disassembler::disassemble(0x8FA8_0004, 0), "lw r8, 4(r29)");
        // sd r31, -8(r29)
        assert_eq!(Disassembler::disassemble(0xFFBF_FFF8, 0), "sd r31, -8(r29)");
    }

    #[test]
    fn test_disassemble_jumps_use_pc() {
        // jal 0x00100000 from KSEG1
        assert_eq!(
            Disassembler::disassemble(0x0C04_0000, 0xBFC0_0000),
            "jal 0xB0100000"
        );
        // bnel r1, r0, +2
        assert_eq!(
            Disassembler::disassemble(0x5420_0002, 0x8000_0000),
            "bnel r1, r0, 0x8000000C"
        );
        // bgezal r0 (bal)
        assert_eq!(
            Disassembler::disassemble(0x0411_0001, 0x8000_0000),
            "bgezal r0, 0x80000008"
        );
    }

    #[test]
    fn test_disassemble_cop0() {
        assert_eq!(Disassembler::disassemble(0x4200_0018, 0), "eret");
        assert_eq!(Disassembler::disassemble(0x4200_0002, 0), "tlbwi");
        // mtc0 r8, $12
        assert_eq!(
            Disassembler::disassemble(0x4088_6000, 0),
            "mtc0 r8, cop0r12"
        );
    }

    #[test]
    fn test_disassemble_illegal() {
        assert_eq!(
            Disassembler::disassemble(0xEC00_0000, 0),
            "illegal 0xEC000000"
        );
    }

    #[test]
    fn test_display_without_pc() {
        let beq = Instruction::Beq {
            rs: 1,
            rt: 2,
            offset: -3,
            likely: false,
        };
        assert_eq!(beq.to_string(), "beq r1, r2, -3");
    }
}
