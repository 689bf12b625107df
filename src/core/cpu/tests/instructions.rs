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

use super::*;
use crate::core::cpu::decode::{LoadKind, StoreKind};

/// Physical/virtual pair for data used by load/store tests
const DATA_PADDR: u64 = 0x2000;
const DATA_VADDR: u32 = 0x8000_2000;

fn data_cpu() -> (CPU, Bus) {
    let mut cpu = test_cpu();
    let bus = Bus::new();
    cpu.set_reg(4, DATA_VADDR as u64);
    (cpu, bus)
}

// === Arithmetic ===

#[test]
fn test_addu_wraps_and_sign_extends() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, 0x7FFF_FFFF);
    cpu.set_reg(2, 1);

    cpu.op_addu(1, 2, 3).unwrap();

    assert_eq!(cpu.reg(3), 0xFFFF_FFFF_8000_0000);
}

#[test]
fn test_add_without_overflow() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, 100);
    cpu.set_reg(2, (-30i64) as u64);

    cpu.op_add(1, 2, 3).unwrap();

    assert_eq!(cpu.reg(3), 70);
}

#[test]
fn test_add_overflow_raises() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, 0x7FFF_FFFF);
    cpu.set_reg(2, 1);
    cpu.set_reg(3, 0xDEAD);

    let err = cpu.op_add(1, 2, 3).unwrap_err();

    assert_eq!(err.cause, ExceptionCause::Overflow);
    assert_eq!(cpu.reg(3), 0xDEAD);
}

#[test]
fn test_addiu_negative_immediate() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, 5);

    cpu.op_addiu(1, 2, -10).unwrap();

    assert_eq!(cpu.reg(2), (-5i64) as u64);
}

#[test]
fn test_sub_overflow_raises() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, 0xFFFF_FFFF_8000_0000);
    cpu.set_reg(2, 1);

    let err = cpu.op_sub(1, 2, 3).unwrap_err();
    assert_eq!(err.cause, ExceptionCause::Overflow);

    cpu.op_subu(1, 2, 3).unwrap();
    assert_eq!(cpu.reg(3), 0x7FFF_FFFF);
}

#[test]
fn test_doubleword_add() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, 0x0000_0001_FFFF_FFFF);
    cpu.set_reg(2, 1);

    cpu.op_daddu(1, 2, 3).unwrap();
    assert_eq!(cpu.reg(3), 0x0000_0002_0000_0000);

    cpu.op_daddiu(1, 4, -1).unwrap();
    assert_eq!(cpu.reg(4), 0x0000_0001_FFFF_FFFE);

    cpu.set_reg(5, i64::MAX as u64);
    let err = cpu.op_dadd(5, 2, 6).unwrap_err();
    assert_eq!(err.cause, ExceptionCause::Overflow);

    let err = cpu.op_daddi(5, 6, 1).unwrap_err();
    assert_eq!(err.cause, ExceptionCause::Overflow);
}

#[test]
fn test_doubleword_sub() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, 0);
    cpu.set_reg(2, 1);

    cpu.op_dsubu(1, 2, 3).unwrap();
    assert_eq!(cpu.reg(3), u64::MAX);

    cpu.set_reg(4, i64::MIN as u64);
    let err = cpu.op_dsub(4, 2, 5).unwrap_err();
    assert_eq!(err.cause, ExceptionCause::Overflow);
}

#[test]
fn test_set_less_than() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, (-1i64) as u64);
    cpu.set_reg(2, 1);

    cpu.op_slt(1, 2, 3).unwrap();
    assert_eq!(cpu.reg(3), 1);

    cpu.op_sltu(1, 2, 3).unwrap();
    assert_eq!(cpu.reg(3), 0);

    cpu.op_slti(2, 3, -1).unwrap();
    assert_eq!(cpu.reg(3), 0);

    // Immediate is sign-extended before the unsigned compare
    cpu.op_sltiu(2, 3, -1).unwrap();
    assert_eq!(cpu.reg(3), 1);
}

// === Logical ===

#[test]
fn test_logical_register_ops() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, 0xF0F0_F0F0_0000_FFFF);
    cpu.set_reg(2, 0x0FF0_0000_FFFF_00FF);

    cpu.op_and(1, 2, 3).unwrap();
    assert_eq!(cpu.reg(3), 0x00F0_0000_0000_00FF);

    cpu.op_or(1, 2, 3).unwrap();
    assert_eq!(cpu.reg(3), 0xFFF0_F0F0_FFFF_FFFF);

    cpu.op_xor(1, 2, 3).unwrap();
    assert_eq!(cpu.reg(3), 0xFF00_F0F0_FFFF_FF00);

    cpu.op_nor(1, 2, 3).unwrap();
    assert_eq!(cpu.reg(3), 0x000F_0F0F_0000_0000);
}

#[test]
fn test_logical_immediates_zero_extend() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, u64::MAX);

    cpu.op_andi(1, 2, 0x8001).unwrap();
    assert_eq!(cpu.reg(2), 0x8001);

    cpu.op_ori(0, 2, 0xFFFF).unwrap();
    assert_eq!(cpu.reg(2), 0xFFFF);

    cpu.op_xori(1, 2, 0x00FF).unwrap();
    assert_eq!(cpu.reg(2), 0xFFFF_FFFF_FFFF_FF00);
}

#[test]
fn test_lui_sign_extends() {
    let mut cpu = test_cpu();

    cpu.op_lui(1, 0x8000).unwrap();
    assert_eq!(cpu.reg(1), 0xFFFF_FFFF_8000_0000);

    cpu.op_lui(1, 0x1234).unwrap();
    assert_eq!(cpu.reg(1), 0x1234_0000);
}

// === Shifts ===

#[test]
fn test_word_shifts_sign_extend() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, 0x0000_0000_4000_0001);

    cpu.op_sll(1, 2, 1).unwrap();
    assert_eq!(cpu.reg(2), 0xFFFF_FFFF_8000_0002);

    cpu.set_reg(1, 0xFFFF_FFFF_8000_0000);
    cpu.op_srl(1, 2, 4).unwrap();
    assert_eq!(cpu.reg(2), 0x0800_0000);

    cpu.op_sra(1, 2, 4).unwrap();
    assert_eq!(cpu.reg(2), 0xFFFF_FFFF_F800_0000);
}

#[test]
fn test_variable_shifts_use_low_bits() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, 0x8000_0000);
    cpu.set_reg(2, 33);

    cpu.op_srlv(2, 1, 3).unwrap();
    assert_eq!(cpu.reg(3), 0x4000_0000);

    cpu.set_reg(1, 1);
    cpu.op_sllv(2, 1, 3).unwrap();
    assert_eq!(cpu.reg(3), 2);

    cpu.set_reg(1, 0xFFFF_FFFF_FFFF_FF00);
    cpu.op_srav(2, 1, 3).unwrap();
    assert_eq!(cpu.reg(3), 0xFFFF_FFFF_FFFF_FF80);
}

#[test]
fn test_doubleword_shifts() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, 0x8000_0000_0000_0001);

    cpu.op_dsll(1, 2, 4).unwrap();
    assert_eq!(cpu.reg(2), 0x0000_0000_0000_0010);

    cpu.op_dsrl(1, 2, 63).unwrap();
    assert_eq!(cpu.reg(2), 1);

    cpu.op_dsra(1, 2, 60).unwrap();
    assert_eq!(cpu.reg(2), 0xFFFF_FFFF_FFFF_FFF8);

    cpu.set_reg(3, 64 + 8);
    cpu.op_dsllv(3, 1, 2).unwrap();
    assert_eq!(cpu.reg(2), 0x0000_0000_0000_0100);

    cpu.op_dsrlv(3, 1, 2).unwrap();
    assert_eq!(cpu.reg(2), 0x0080_0000_0000_0000);

    cpu.op_dsrav(3, 1, 2).unwrap();
    assert_eq!(cpu.reg(2), 0xFF80_0000_0000_0000);
}

#[test]
fn test_dsll32_through_decode() {
    // dsll32 r2, r1, 0
    let (mut cpu, mut bus) = setup(&[0x0001_103C]);
    cpu.set_reg(1, 0x1234_5678);

    run(&mut cpu, &mut bus, 1);

    assert_eq!(cpu.reg(2), 0x1234_5678_0000_0000);
}

// === Multiply / divide ===

#[test]
fn test_mult_signed() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, (-2i64) as u64);
    cpu.set_reg(2, 0x4000_0000);

    cpu.op_mult(1, 2).unwrap();

    // -0x80000000: LO = 0x80000000, HI = 0xFFFFFFFF, both sign-extended
    assert_eq!(cpu.lo(), 0xFFFF_FFFF_8000_0000);
    assert_eq!(cpu.hi(), u64::MAX);
}

#[test]
fn test_multu() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, 0xFFFF_FFFF);
    cpu.set_reg(2, 2);

    cpu.op_multu(1, 2).unwrap();

    assert_eq!(cpu.lo(), 0xFFFF_FFFF_FFFF_FFFE);
    assert_eq!(cpu.hi(), 1);
}

#[test]
fn test_div_and_remainder_signs() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, (-7i64) as u64);
    cpu.set_reg(2, 2);

    cpu.op_div(1, 2).unwrap();

    assert_eq!(cpu.lo() as i64, -3);
    assert_eq!(cpu.hi() as i64, -1);
}

#[test]
fn test_div_by_zero() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, 42);

    cpu.op_div(1, 0).unwrap();
    assert_eq!(cpu.lo(), u64::MAX);
    assert_eq!(cpu.hi(), 42);

    cpu.set_reg(1, (-42i64) as u64);
    cpu.op_div(1, 0).unwrap();
    assert_eq!(cpu.lo(), 1);
    assert_eq!(cpu.hi() as i64, -42);

    cpu.op_divu(1, 0).unwrap();
    assert_eq!(cpu.lo(), u64::MAX);
    assert_eq!(cpu.hi(), 0xFFFF_FFFF_FFFF_FFD6);
}

#[test]
fn test_div_overflow_case() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, 0xFFFF_FFFF_8000_0000);
    cpu.set_reg(2, u64::MAX);

    cpu.op_div(1, 2).unwrap();

    assert_eq!(cpu.lo(), 0xFFFF_FFFF_8000_0000);
    assert_eq!(cpu.hi(), 0);
}

#[test]
fn test_doubleword_multiply_divide() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, u64::MAX);
    cpu.set_reg(2, 2);

    cpu.op_dmultu(1, 2).unwrap();
    assert_eq!(cpu.lo(), 0xFFFF_FFFF_FFFF_FFFE);
    assert_eq!(cpu.hi(), 1);

    cpu.op_dmult(1, 2).unwrap();
    assert_eq!(cpu.lo() as i64, -2);
    assert_eq!(cpu.hi(), u64::MAX);

    cpu.set_reg(3, 100);
    cpu.set_reg(4, 7);
    cpu.op_ddivu(3, 4).unwrap();
    assert_eq!((cpu.lo(), cpu.hi()), (14, 2));

    cpu.op_ddiv(3, 0).unwrap();
    assert_eq!((cpu.lo(), cpu.hi()), (u64::MAX, 100));

    cpu.set_reg(5, i64::MIN as u64);
    cpu.op_ddiv(5, 1).unwrap();
    assert_eq!(cpu.lo(), i64::MIN as u64);
}

#[test]
fn test_hi_lo_moves() {
    let mut cpu = test_cpu();
    cpu.set_reg(1, 0x1111_2222_3333_4444);
    cpu.set_reg(2, 0x5555);

    cpu.op_mthi(1).unwrap();
    cpu.op_mtlo(2).unwrap();
    cpu.op_mfhi(3).unwrap();
    cpu.op_mflo(4).unwrap();

    assert_eq!(cpu.reg(3), 0x1111_2222_3333_4444);
    assert_eq!(cpu.reg(4), 0x5555);
}

// === Loads ===

#[test]
fn test_loads_extend_correctly() {
    let (mut cpu, mut bus) = data_cpu();
    bus.write32(DATA_PADDR, 0x8081_8283).unwrap();

    cpu.op_load(LoadKind::Lb, 1, 4, 0, &bus).unwrap();
    assert_eq!(cpu.reg(1), 0xFFFF_FFFF_FFFF_FF80);

    cpu.op_load(LoadKind::Lbu, 1, 4, 1, &bus).unwrap();
    assert_eq!(cpu.reg(1), 0x81);

    cpu.op_load(LoadKind::Lh, 1, 4, 2, &bus).unwrap();
    assert_eq!(cpu.reg(1), 0xFFFF_FFFF_FFFF_8283);

    cpu.op_load(LoadKind::Lhu, 1, 4, 2, &bus).unwrap();
    assert_eq!(cpu.reg(1), 0x8283);

    cpu.op_load(LoadKind::Lw, 1, 4, 0, &bus).unwrap();
    assert_eq!(cpu.reg(1), 0xFFFF_FFFF_8081_8283);

    cpu.op_load(LoadKind::Lwu, 1, 4, 0, &bus).unwrap();
    assert_eq!(cpu.reg(1), 0x8081_8283);
}

#[test]
fn test_ld_is_big_endian() {
    let (mut cpu, mut bus) = data_cpu();
    bus.write32(DATA_PADDR + 8, 0x0102_0304).unwrap();
    bus.write32(DATA_PADDR + 12, 0x0506_0708).unwrap();

    cpu.op_load(LoadKind::Ld, 1, 4, 8, &bus).unwrap();

    assert_eq!(cpu.reg(1), 0x0102_0304_0506_0708);
}

#[test]
fn test_misaligned_loads_raise_address_error() {
    let (mut cpu, bus) = data_cpu();

    let err = cpu.op_load(LoadKind::Lh, 1, 4, 1, &bus).unwrap_err();
    assert_eq!(err.cause, ExceptionCause::AddressErrorLoad);
    assert_eq!(err.bad_vaddr, Some(DATA_VADDR + 1));

    let err = cpu.op_load(LoadKind::Ld, 1, 4, 4, &bus).unwrap_err();
    assert_eq!(err.cause, ExceptionCause::AddressErrorLoad);
}

#[test]
fn test_unaligned_word_pair() {
    let (mut cpu, mut bus) = data_cpu();
    bus.write32(DATA_PADDR, 0x0011_2233).unwrap();
    bus.write32(DATA_PADDR + 4, 0x4455_6677).unwrap();

    // lwl r1, 1(r4); lwr r1, 4(r4) loads the word at DATA + 1
    cpu.op_load(LoadKind::Lwl, 1, 4, 1, &bus).unwrap();
    cpu.op_load(LoadKind::Lwr, 1, 4, 4, &bus).unwrap();

    assert_eq!(cpu.reg(1), 0x1122_3344);
}

#[test]
fn test_unaligned_doubleword_pair() {
    let (mut cpu, mut bus) = data_cpu();
    bus.write64(DATA_PADDR, 0x0001_0203_0405_0607).unwrap();
    bus.write64(DATA_PADDR + 8, 0x0809_0A0B_0C0D_0E0F).unwrap();

    cpu.op_load(LoadKind::Ldl, 1, 4, 3, &bus).unwrap();
    cpu.op_load(LoadKind::Ldr, 1, 4, 10, &bus).unwrap();

    assert_eq!(cpu.reg(1), 0x0304_0506_0708_090A);
}

#[test]
fn test_load_to_r0_is_discarded() {
    let (mut cpu, mut bus) = data_cpu();
    bus.write32(DATA_PADDR, 0x1234_5678).unwrap();

    cpu.op_load(LoadKind::Lw, 0, 4, 0, &bus).unwrap();

    assert_eq!(cpu.reg(0), 0);
}

// === Stores ===

#[test]
fn test_narrow_stores() {
    let (mut cpu, mut bus) = data_cpu();
    bus.write32(DATA_PADDR, 0xAAAA_AAAA).unwrap();
    cpu.set_reg(1, 0x1122_3344_5566_7788);

    cpu.op_store(StoreKind::Sb, 1, 4, 1, &mut bus).unwrap();
    assert_eq!(bus.read32(DATA_PADDR).unwrap(), 0xAA88_AAAA);

    cpu.op_store(StoreKind::Sh, 1, 4, 2, &mut bus).unwrap();
    assert_eq!(bus.read32(DATA_PADDR).unwrap(), 0xAA88_7788);
}

#[test]
fn test_sw_and_sd() {
    let (mut cpu, mut bus) = data_cpu();
    cpu.set_reg(1, 0x1122_3344_5566_7788);

    cpu.op_store(StoreKind::Sw, 1, 4, 0, &mut bus).unwrap();
    assert_eq!(bus.read32(DATA_PADDR).unwrap(), 0x5566_7788);

    cpu.op_store(StoreKind::Sd, 1, 4, 8, &mut bus).unwrap();
    assert_eq!(bus.read32(DATA_PADDR + 8).unwrap(), 0x1122_3344);
    assert_eq!(bus.read32(DATA_PADDR + 12).unwrap(), 0x5566_7788);
}

#[test]
fn test_misaligned_store_raises_address_error() {
    let (mut cpu, mut bus) = data_cpu();

    let err = cpu.op_store(StoreKind::Sw, 1, 4, 2, &mut bus).unwrap_err();

    assert_eq!(err.cause, ExceptionCause::AddressErrorStore);
    assert_eq!(err.bad_vaddr, Some(DATA_VADDR + 2));
}

#[test]
fn test_unaligned_word_store_pair() {
    let (mut cpu, mut bus) = data_cpu();
    bus.write32(DATA_PADDR, 0xAAAA_AAAA).unwrap();
    bus.write32(DATA_PADDR + 4, 0xBBBB_BBBB).unwrap();
    cpu.set_reg(1, 0x1122_3344);

    // swl r1, 1(r4); swr r1, 4(r4) stores the word at DATA + 1
    cpu.op_store(StoreKind::Swl, 1, 4, 1, &mut bus).unwrap();
    cpu.op_store(StoreKind::Swr, 1, 4, 4, &mut bus).unwrap();

    assert_eq!(bus.read32(DATA_PADDR).unwrap(), 0xAA11_2233);
    assert_eq!(bus.read32(DATA_PADDR + 4).unwrap(), 0x44BB_BBBB);
}

#[test]
fn test_store_to_bus_hole_is_bus_error() {
    let mut cpu = test_cpu();
    let mut bus = Bus::new();
    cpu.set_reg(4, 0xB000_0000);

    let err = cpu.op_store(StoreKind::Sw, 1, 4, 0, &mut bus).unwrap_err();

    assert_eq!(err.cause, ExceptionCause::BusErrorData);
}

// === Load linked / store conditional ===

#[test]
fn test_ll_sets_link_state() {
    let (mut cpu, mut bus) = data_cpu();
    bus.write32(DATA_PADDR, 0x8000_0001).unwrap();

    cpu.op_load(LoadKind::Ll, 1, 4, 0, &bus).unwrap();

    assert_eq!(cpu.reg(1), 0xFFFF_FFFF_8000_0001);
    assert!(cpu.ll_bit);
    assert_eq!(cpu.cop0().read(COP0::LL_ADDR), DATA_PADDR >> 4);
}

#[test]
fn test_sc_succeeds_after_ll() {
    let (mut cpu, mut bus) = data_cpu();

    cpu.op_load(LoadKind::Ll, 1, 4, 0, &bus).unwrap();
    cpu.set_reg(2, 0x55);
    cpu.op_store(StoreKind::Sc, 2, 4, 0, &mut bus).unwrap();

    assert_eq!(cpu.reg(2), 1);
    assert_eq!(bus.read32(DATA_PADDR).unwrap(), 0x55);
}

#[test]
fn test_sc_fails_without_link() {
    let (mut cpu, mut bus) = data_cpu();
    bus.write32(DATA_PADDR, 0x1234).unwrap();
    cpu.set_reg(2, 0x55);

    cpu.op_store(StoreKind::Sc, 2, 4, 0, &mut bus).unwrap();

    assert_eq!(cpu.reg(2), 0);
    assert_eq!(bus.read32(DATA_PADDR).unwrap(), 0x1234);
}

#[test]
fn test_eret_breaks_link() {
    let (mut cpu, mut bus) = data_cpu();
    cpu.op_load(LoadKind::Ll, 1, 4, 0, &bus).unwrap();
    let status = cpu.cop0().status() | Status::EXL;
    cpu.cop0_mut().write(COP0::STATUS, status.bits() as u64);
    cpu.cop0_mut().write(COP0::EPC, CODE_VADDR as u64);

    cpu.op_eret().unwrap();
    cpu.set_reg(2, 0x55);
    cpu.op_store(StoreKind::Sc, 2, 4, 0, &mut bus).unwrap();

    assert_eq!(cpu.reg(2), 0);
}

#[test]
fn test_ll_sc_loop_through_decode() {
    // ll r1, 0(r4); addiu r1, r1, 1; sc r1, 0(r4)
    let (mut cpu, mut bus) = setup(&[0xC081_0000, asm::addiu(1, 1, 1), 0xE081_0000]);
    cpu.set_reg(4, DATA_VADDR as u64);
    bus.write32(DATA_PADDR, 41).unwrap();

    run(&mut cpu, &mut bus, 3);

    assert_eq!(cpu.reg(1), 1);
    assert_eq!(bus.read32(DATA_PADDR).unwrap(), 42);
}
