//! # ALU (Arithmetic Logic Unit) Instructions
//!
//! Addition and subtraction honour the decimal flag. In decimal mode the
//! result is corrected nibble by nibble. Carry and overflow come from the
//! decimal computation on every level; Z and N come from the binary result on
//! the NMOS 6502 and from the decimal result on the 65SC02 and later.

use crate::{AddressingMode, MemoryBus, ProcessorLevel, CPU};

/// Executes ADC (Add with Carry).
///
/// Adds the operand plus the carry flag to the accumulator.
///
/// # Arguments
///
/// * `cpu` - Mutable reference to the CPU
/// * `mode` - Addressing mode from the instruction table
///
/// Flag Behavior:
/// - C: set if the sum exceeds 0xFF (binary) or 99 (decimal)
/// - V: set if the operands share a sign and the result does not
/// - Z, N: from the result
pub(crate) fn execute_adc<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    let value = cpu.read_operand(mode);
    if cpu.registers.p.decimal {
        add_decimal(cpu, value);
    } else {
        add_binary(cpu, value);
    }
}

/// Executes SBC (Subtract with Carry). Carry clear means borrow.
///
/// # Arguments
///
/// * `cpu` - Mutable reference to the CPU
/// * `mode` - Addressing mode from the instruction table
///
/// Flag Behavior:
/// - C: set if no borrow was needed
/// - V: set if the operands differ in sign and the result's sign differs from A
/// - Z, N: from the result
pub(crate) fn execute_sbc<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    let value = cpu.read_operand(mode);
    if cpu.registers.p.decimal {
        subtract_decimal(cpu, value);
    } else {
        subtract_binary(cpu, value);
    }
}

fn add_binary<M: MemoryBus>(cpu: &mut CPU<M>, value: u8) {
    let a = cpu.registers.a;
    let sum = a as u16 + value as u16 + u16::from(cpu.registers.p.carry);
    let result = sum as u8;

    cpu.registers.p.carry = sum > 0xFF;
    cpu.registers.p.overflow = (!(a ^ value) & (a ^ result) & 0x80) != 0;
    cpu.registers.a = result;
    cpu.update_zero_negative_flags(result);
}

fn subtract_binary<M: MemoryBus>(cpu: &mut CPU<M>, value: u8) {
    let a = cpu.registers.a;
    let difference = a as i16 - value as i16 - i16::from(!cpu.registers.p.carry);
    let result = difference as u8;

    cpu.registers.p.carry = difference >= 0;
    cpu.registers.p.overflow = ((a ^ value) & (a ^ result) & 0x80) != 0;
    cpu.registers.a = result;
    cpu.update_zero_negative_flags(result);
}

fn add_decimal<M: MemoryBus>(cpu: &mut CPU<M>, value: u8) {
    let a = cpu.registers.a;
    let carry = u16::from(cpu.registers.p.carry);

    if cpu.level == ProcessorLevel::Nmos6502 {
        cpu.update_zero_negative_flags((a as u16 + value as u16 + carry) as u8);
    }

    let mut low = (a & 0x0F) as u16 + (value & 0x0F) as u16 + carry;
    if low > 0x09 {
        low += 0x06;
    }
    let mut high = (a >> 4) as u16 + (value >> 4) as u16 + u16::from(low > 0x0F);

    // Overflow is judged on the high nibble before its decimal adjustment.
    cpu.registers.p.overflow = (!(a as u16 ^ value as u16) & (a as u16 ^ (high << 4)) & 0x80) != 0;

    if high > 0x09 {
        high += 0x06;
    }
    cpu.registers.p.carry = high > 0x0F;

    let result = ((high << 4) | (low & 0x0F)) as u8;
    cpu.registers.a = result;

    if cpu.level >= ProcessorLevel::Cmos65SC02 {
        cpu.update_zero_negative_flags(result);
    }
}

fn subtract_decimal<M: MemoryBus>(cpu: &mut CPU<M>, value: u8) {
    let a = cpu.registers.a;
    let borrow = i16::from(!cpu.registers.p.carry);
    let difference = a as i16 - value as i16 - borrow;

    if cpu.level == ProcessorLevel::Nmos6502 {
        cpu.update_zero_negative_flags(difference as u8);
    }

    cpu.registers.p.carry = difference >= 0;
    cpu.registers.p.overflow = ((a ^ value) & (a ^ difference as u8) & 0x80) != 0;

    let mut low = (a & 0x0F) as i16 - (value & 0x0F) as i16 - borrow;
    let mut high = (a >> 4) as i16 - (value >> 4) as i16;
    if low < 0 {
        low -= 0x06;
        high -= 1;
    }
    if high < 0 {
        high -= 0x06;
    }

    let result = (((high << 4) | (low & 0x0F)) & 0xFF) as u8;
    cpu.registers.a = result;

    if cpu.level >= ProcessorLevel::Cmos65SC02 {
        cpu.update_zero_negative_flags(result);
    }
}

/// Executes AND (Logical AND with the accumulator).
pub(crate) fn execute_and<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    let result = cpu.registers.a & cpu.read_operand(mode);
    cpu.registers.a = result;
    cpu.update_zero_negative_flags(result);
}

/// Executes ORA (Logical inclusive OR with the accumulator).
pub(crate) fn execute_ora<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    let result = cpu.registers.a | cpu.read_operand(mode);
    cpu.registers.a = result;
    cpu.update_zero_negative_flags(result);
}

/// Executes EOR (Exclusive OR with the accumulator).
pub(crate) fn execute_eor<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    let result = cpu.registers.a ^ cpu.read_operand(mode);
    cpu.registers.a = result;
    cpu.update_zero_negative_flags(result);
}

/// Executes CMP (Compare Accumulator).
///
/// # Arguments
///
/// * `cpu` - Mutable reference to the CPU
/// * `mode` - Addressing mode from the instruction table
///
/// Flag Behavior:
/// - C: set if A >= operand
/// - Z: set if A == operand
/// - N: bit 7 of A - operand
pub(crate) fn execute_cmp<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    let register = cpu.registers.a;
    compare(cpu, register, mode);
}

/// Executes CPX (Compare X Register). Flags as for CMP.
pub(crate) fn execute_cpx<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    let register = cpu.registers.x;
    compare(cpu, register, mode);
}

/// Executes CPY (Compare Y Register). Flags as for CMP.
pub(crate) fn execute_cpy<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    let register = cpu.registers.y;
    compare(cpu, register, mode);
}

/// C = register >= operand; Z and N from the difference.
fn compare<M: MemoryBus>(cpu: &mut CPU<M>, register: u8, mode: AddressingMode) {
    let value = cpu.read_operand(mode);
    cpu.registers.p.carry = register >= value;
    cpu.update_zero_negative_flags(register.wrapping_sub(value));
}

/// Executes BIT (Test bits against the accumulator).
///
/// Flag Behavior:
/// - Z: set if A AND operand is zero
/// - N, V: copied from bits 7 and 6 of the operand, except for the
///   immediate form, which only affects Z
pub(crate) fn execute_bit<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    let value = cpu.read_operand(mode);
    cpu.registers.p.zero = cpu.registers.a & value == 0;
    if mode != AddressingMode::Immediate {
        cpu.registers.p.negative = value & 0x80 != 0;
        cpu.registers.p.overflow = value & 0x40 != 0;
    }
}
