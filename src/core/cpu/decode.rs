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

//! Instruction decoding
//!
//! [`decode`] turns a raw instruction word into the closed [`Instruction`]
//! enum. Every encoding outside the supported MIPS III integer subset is a
//! [`DecodeError`], which the CPU delivers as a Reserved Instruction
//! exception.

use thiserror::Error;

/// Decode failure for a raw instruction word
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("reserved opcode 0x{opcode:02X} (word 0x{word:08X})")]
    Opcode { word: u32, opcode: u8 },

    #[error("reserved SPECIAL function 0x{funct:02X} (word 0x{word:08X})")]
    Special { word: u32, funct: u8 },

    #[error("reserved REGIMM rt 0x{rt:02X} (word 0x{word:08X})")]
    RegImm { word: u32, rt: u8 },

    #[error("reserved COP0 encoding (word 0x{word:08X})")]
    Cop0 { word: u32 },
}

/// Memory load variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Lb,
    Lbu,
    Lh,
    Lhu,
    Lw,
    Lwu,
    Ld,
    Lwl,
    Lwr,
    Ldl,
    Ldr,
    Ll,
}

/// Memory store variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sb,
    Sh,
    Sw,
    Sd,
    Swl,
    Swr,
    Sdl,
    Sdr,
    Sc,
}

/// Trap conditions shared by the register and immediate forms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapCond {
    Ge,
    Geu,
    Lt,
    Ltu,
    Eq,
    Ne,
}

/// Decoded instruction
///
/// Register fields are GPR numbers (0-31). Branch offsets are the raw
/// 16-bit word offsets; the handlers shift and sign-extend them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // SPECIAL shifts
    Sll { rd: u8, rt: u8, sa: u8 },
    Srl { rd: u8, rt: u8, sa: u8 },
    Sra { rd: u8, rt: u8, sa: u8 },
    Sllv { rd: u8, rt: u8, rs: u8 },
    Srlv { rd: u8, rt: u8, rs: u8 },
    Srav { rd: u8, rt: u8, rs: u8 },
    Dsll { rd: u8, rt: u8, sa: u8 },
    Dsrl { rd: u8, rt: u8, sa: u8 },
    Dsra { rd: u8, rt: u8, sa: u8 },
    Dsll32 { rd: u8, rt: u8, sa: u8 },
    Dsrl32 { rd: u8, rt: u8, sa: u8 },
    Dsra32 { rd: u8, rt: u8, sa: u8 },
    Dsllv { rd: u8, rt: u8, rs: u8 },
    Dsrlv { rd: u8, rt: u8, rs: u8 },
    Dsrav { rd: u8, rt: u8, rs: u8 },

    // Register jumps
    Jr { rs: u8 },
    Jalr { rd: u8, rs: u8 },

    Syscall { code: u32 },
    Break { code: u32 },
    Sync,

    // HI/LO
    Mfhi { rd: u8 },
    Mthi { rs: u8 },
    Mflo { rd: u8 },
    Mtlo { rs: u8 },
    Mult { rs: u8, rt: u8 },
    Multu { rs: u8, rt: u8 },
    Div { rs: u8, rt: u8 },
    Divu { rs: u8, rt: u8 },
    Dmult { rs: u8, rt: u8 },
    Dmultu { rs: u8, rt: u8 },
    Ddiv { rs: u8, rt: u8 },
    Ddivu { rs: u8, rt: u8 },

    // Three-register ALU
    Add { rd: u8, rs: u8, rt: u8 },
    Addu { rd: u8, rs: u8, rt: u8 },
    Sub { rd: u8, rs: u8, rt: u8 },
    Subu { rd: u8, rs: u8, rt: u8 },
    And { rd: u8, rs: u8, rt: u8 },
    Or { rd: u8, rs: u8, rt: u8 },
    Xor { rd: u8, rs: u8, rt: u8 },
    Nor { rd: u8, rs: u8, rt: u8 },
    Slt { rd: u8, rs: u8, rt: u8 },
    Sltu { rd: u8, rs: u8, rt: u8 },
    Dadd { rd: u8, rs: u8, rt: u8 },
    Daddu { rd: u8, rs: u8, rt: u8 },
    Dsub { rd: u8, rs: u8, rt: u8 },
    Dsubu { rd: u8, rs: u8, rt: u8 },

    // Traps
    Trap { cond: TrapCond, rs: u8, rt: u8 },
    TrapImm { cond: TrapCond, rs: u8, imm: i16 },

    // Branches (`likely` annuls the delay slot when not taken)
    Bltz {
        rs: u8,
        offset: i16,
        link: bool,
        likely: bool,
    },
    Bgez {
        rs: u8,
        offset: i16,
        link: bool,
        likely: bool,
    },
    Beq {
        rs: u8,
        rt: u8,
        offset: i16,
        likely: bool,
    },
    Bne {
        rs: u8,
        rt: u8,
        offset: i16,
        likely: bool,
    },
    Blez { rs: u8, offset: i16, likely: bool },
    Bgtz { rs: u8, offset: i16, likely: bool },

    // Jumps
    J { target: u32 },
    Jal { target: u32 },

    // Immediate ALU
    Addi { rt: u8, rs: u8, imm: i16 },
    Addiu { rt: u8, rs: u8, imm: i16 },
    Daddi { rt: u8, rs: u8, imm: i16 },
    Daddiu { rt: u8, rs: u8, imm: i16 },
    Slti { rt: u8, rs: u8, imm: i16 },
    Sltiu { rt: u8, rs: u8, imm: i16 },
    Andi { rt: u8, rs: u8, imm: u16 },
    Ori { rt: u8, rs: u8, imm: u16 },
    Xori { rt: u8, rs: u8, imm: u16 },
    Lui { rt: u8, imm: u16 },

    // Memory
    Load {
        kind: LoadKind,
        rt: u8,
        base: u8,
        offset: i16,
    },
    Store {
        kind: StoreKind,
        rt: u8,
        base: u8,
        offset: i16,
    },
    Cache,

    // COP0
    Mfc0 { rt: u8, rd: u8 },
    Dmfc0 { rt: u8, rd: u8 },
    Mtc0 { rt: u8, rd: u8 },
    Dmtc0 { rt: u8, rd: u8 },
    Tlbr,
    Tlbwi,
    Tlbwr,
    Tlbp,
    Eret,
    Wait,

    /// Any COP1/COP2/COP3 operation or coprocessor load/store
    Coprocessor { unit: u8 },
}

/// Decode R-type instruction
///
/// Format: | op (6) | rs (5) | rt (5) | rd (5) | shamt (5) | funct (6) |
///
/// # Returns
///
/// Tuple of (rs, rt, rd, shamt, funct)
#[inline(always)]
pub(super) fn decode_r_type(instr: u32) -> (u8, u8, u8, u8, u8) {
    let rs = ((instr >> 21) & 0x1F) as u8;
    let rt = ((instr >> 16) & 0x1F) as u8;
    let rd = ((instr >> 11) & 0x1F) as u8;
    let shamt = ((instr >> 6) & 0x1F) as u8;
    let funct = (instr & 0x3F) as u8;
    (rs, rt, rd, shamt, funct)
}

/// Decode I-type instruction
///
/// Format: | op (6) | rs (5) | rt (5) | immediate (16) |
///
/// # Returns
///
/// Tuple of (op, rs, rt, imm)
#[inline(always)]
pub(super) fn decode_i_type(instr: u32) -> (u8, u8, u8, u16) {
    let op = ((instr >> 26) & 0x3F) as u8;
    let rs = ((instr >> 21) & 0x1F) as u8;
    let rt = ((instr >> 16) & 0x1F) as u8;
    let imm = (instr & 0xFFFF) as u16;
    (op, rs, rt, imm)
}

/// Decode J-type instruction
///
/// Format: | op (6) | target (26) |
#[inline(always)]
pub(super) fn decode_j_type(instr: u32) -> (u8, u32) {
    let op = ((instr >> 26) & 0x3F) as u8;
    let target = instr & 0x03FF_FFFF;
    (op, target)
}

/// Decode a raw instruction word
///
/// # Example
///
/// ```
/// use speedracer::core::cpu::{decode, Instruction};
///
/// // lui $t0, 0x1234
/// assert_eq!(
///     decode(0x3C08_1234),
///     Ok(Instruction::Lui { rt: 8, imm: 0x1234 })
/// );
/// assert!(decode(0xFC00_0000).is_err()); // opcode 0x3F is reserved
/// ```
pub fn decode(word: u32) -> Result<Instruction, DecodeError> {
    use Instruction::*;

    let (op, rs, rt, imm) = decode_i_type(word);
    let simm = imm as i16;

    let load = |kind| Load {
        kind,
        rt,
        base: rs,
        offset: simm,
    };
    let store = |kind| Store {
        kind,
        rt,
        base: rs,
        offset: simm,
    };

    let instruction = match op {
        0x00 => return decode_special(word),
        0x01 => return decode_regimm(word),
        0x02 => J {
            target: decode_j_type(word).1,
        },
        0x03 => Jal {
            target: decode_j_type(word).1,
        },
        0x04 => Beq {
            rs,
            rt,
            offset: simm,
            likely: false,
        },
        0x05 => Bne {
            rs,
            rt,
            offset: simm,
            likely: false,
        },
        0x06 => Blez {
            rs,
            offset: simm,
            likely: false,
        },
        0x07 => Bgtz {
            rs,
            offset: simm,
            likely: false,
        },
        0x08 => Addi { rt, rs, imm: simm },
        0x09 => Addiu { rt, rs, imm: simm },
        0x0A => Slti { rt, rs, imm: simm },
        0x0B => Sltiu { rt, rs, imm: simm },
        0x0C => Andi { rt, rs, imm },
        0x0D => Ori { rt, rs, imm },
        0x0E => Xori { rt, rs, imm },
        0x0F => Lui { rt, imm },
        0x10 => return decode_cop0(word),
        0x11 => Coprocessor { unit: 1 },
        0x12 => Coprocessor { unit: 2 },
        0x13 => Coprocessor { unit: 3 },
        0x14 => Beq {
            rs,
            rt,
            offset: simm,
            likely: true,
        },
        0x15 => Bne {
            rs,
            rt,
            offset: simm,
            likely: true,
        },
        0x16 => Blez {
            rs,
            offset: simm,
            likely: true,
        },
        0x17 => Bgtz {
            rs,
            offset: simm,
            likely: true,
        },
        0x18 => Daddi { rt, rs, imm: simm },
        0x19 => Daddiu { rt, rs, imm: simm },
        0x1A => load(LoadKind::Ldl),
        0x1B => load(LoadKind::Ldr),
        0x20 => load(LoadKind::Lb),
        0x21 => load(LoadKind::Lh),
        0x22 => load(LoadKind::Lwl),
        0x23 => load(LoadKind::Lw),
        0x24 => load(LoadKind::Lbu),
        0x25 => load(LoadKind::Lhu),
        0x26 => load(LoadKind::Lwr),
        0x27 => load(LoadKind::Lwu),
        0x28 => store(StoreKind::Sb),
        0x29 => store(StoreKind::Sh),
        0x2A => store(StoreKind::Swl),
        0x2B => store(StoreKind::Sw),
        0x2C => store(StoreKind::Sdl),
        0x2D => store(StoreKind::Sdr),
        0x2E => store(StoreKind::Swr),
        0x2F => Cache,
        0x30 => load(LoadKind::Ll),
        // LWC1/LWC2, LDC1/LDC2, SWC1/SWC2, SDC1/SDC2
        0x31 | 0x35 | 0x39 | 0x3D => Coprocessor { unit: 1 },
        0x32 | 0x36 | 0x3A | 0x3E => Coprocessor { unit: 2 },
        0x37 => load(LoadKind::Ld),
        0x38 => store(StoreKind::Sc),
        0x3F => store(StoreKind::Sd),
        _ => return Err(DecodeError::Opcode { word, opcode: op }),
    };

    Ok(instruction)
}

fn decode_special(word: u32) -> Result<Instruction, DecodeError> {
    use Instruction::*;

    let (rs, rt, rd, sa, funct) = decode_r_type(word);

    let instruction = match funct {
        0x00 => Sll { rd, rt, sa },
        0x02 => Srl { rd, rt, sa },
        0x03 => Sra { rd, rt, sa },
        0x04 => Sllv { rd, rt, rs },
        0x06 => Srlv { rd, rt, rs },
        0x07 => Srav { rd, rt, rs },
        0x08 => Jr { rs },
        0x09 => Jalr { rd, rs },
        0x0C => Syscall {
            code: (word >> 6) & 0x000F_FFFF,
        },
        0x0D => Break {
            code: (word >> 6) & 0x000F_FFFF,
        },
        0x0F => Sync,
        0x10 => Mfhi { rd },
        0x11 => Mthi { rs },
        0x12 => Mflo { rd },
        0x13 => Mtlo { rs },
        0x14 => Dsllv { rd, rt, rs },
        0x16 => Dsrlv { rd, rt, rs },
        0x17 => Dsrav { rd, rt, rs },
        0x18 => Mult { rs, rt },
        0x19 => Multu { rs, rt },
        0x1A => Div { rs, rt },
        0x1B => Divu { rs, rt },
        0x1C => Dmult { rs, rt },
        0x1D => Dmultu { rs, rt },
        0x1E => Ddiv { rs, rt },
        0x1F => Ddivu { rs, rt },
        0x20 => Add { rd, rs, rt },
        0x21 => Addu { rd, rs, rt },
        0x22 => Sub { rd, rs, rt },
        0x23 => Subu { rd, rs, rt },
        0x24 => And { rd, rs, rt },
        0x25 => Or { rd, rs, rt },
        0x26 => Xor { rd, rs, rt },
        0x27 => Nor { rd, rs, rt },
        0x2A => Slt { rd, rs, rt },
        0x2B => Sltu { rd, rs, rt },
        0x2C => Dadd { rd, rs, rt },
        0x2D => Daddu { rd, rs, rt },
        0x2E => Dsub { rd, rs, rt },
        0x2F => Dsubu { rd, rs, rt },
        0x30 => Trap {
            cond: TrapCond::Ge,
            rs,
            rt,
        },
        0x31 => Trap {
            cond: TrapCond::Geu,
            rs,
            rt,
        },
        0x32 => Trap {
            cond: TrapCond::Lt,
            rs,
            rt,
        },
        0x33 => Trap {
            cond: TrapCond::Ltu,
            rs,
            rt,
        },
        0x34 => Trap {
            cond: TrapCond::Eq,
            rs,
            rt,
        },
        0x36 => Trap {
            cond: TrapCond::Ne,
            rs,
            rt,
        },
        0x38 => Dsll { rd, rt, sa },
        0x3A => Dsrl { rd, rt, sa },
        0x3B => Dsra { rd, rt, sa },
        0x3C => Dsll32 { rd, rt, sa },
        0x3E => Dsrl32 { rd, rt, sa },
        0x3F => Dsra32 { rd, rt, sa },
        _ => return Err(DecodeError::Special { word, funct }),
    };

    Ok(instruction)
}

fn decode_regimm(word: u32) -> Result<Instruction, DecodeError> {
    use Instruction::*;

    let (_, rs, rt, imm) = decode_i_type(word);
    let offset = imm as i16;

    let instruction = match rt {
        0x00 => Bltz {
            rs,
            offset,
            link: false,
            likely: false,
        },
        0x01 => Bgez {
            rs,
            offset,
            link: false,
            likely: false,
        },
        0x02 => Bltz {
            rs,
            offset,
            link: false,
            likely: true,
        },
        0x03 => Bgez {
            rs,
            offset,
            link: false,
            likely: true,
        },
        0x08 => TrapImm {
            cond: TrapCond::Ge,
            rs,
            imm: offset,
        },
        0x09 => TrapImm {
            cond: TrapCond::Geu,
            rs,
            imm: offset,
        },
        0x0A => TrapImm {
            cond: TrapCond::Lt,
            rs,
            imm: offset,
        },
        0x0B => TrapImm {
            cond: TrapCond::Ltu,
            rs,
            imm: offset,
        },
        0x0C => TrapImm {
            cond: TrapCond::Eq,
            rs,
            imm: offset,
        },
        0x0E => TrapImm {
            cond: TrapCond::Ne,
            rs,
            imm: offset,
        },
        0x10 => Bltz {
            rs,
            offset,
            link: true,
            likely: false,
        },
        0x11 => Bgez {
            rs,
            offset,
            link: true,
            likely: false,
        },
        0x12 => Bltz {
            rs,
            offset,
            link: true,
            likely: true,
        },
        0x13 => Bgez {
            rs,
            offset,
            link: true,
            likely: true,
        },
        _ => return Err(DecodeError::RegImm { word, rt }),
    };

    Ok(instruction)
}

fn decode_cop0(word: u32) -> Result<Instruction, DecodeError> {
    use Instruction::*;

    let (sub_op, rt, rd, _, funct) = decode_r_type(word);

    let instruction = match sub_op {
        0x00 => Mfc0 { rt, rd },
        0x01 => Dmfc0 { rt, rd },
        0x04 => Mtc0 { rt, rd },
        0x05 => Dmtc0 { rt, rd },
        // CO bit set: function field selects the operation
        0x10..=0x1F => match funct {
            0x01 => Tlbr,
            0x02 => Tlbwi,
            0x06 => Tlbwr,
            0x08 => Tlbp,
            0x18 => Eret,
            0x20 => Wait,
            _ => return Err(DecodeError::Cop0 { word }),
        },
        _ => return Err(DecodeError::Cop0 { word }),
    };

    Ok(instruction)
}
