//! # Shift and Rotate Instructions
//!
//! ASL, LSR, ROL and ROR on the accumulator or memory. The bit shifted out
//! lands in C; Z and N come from the result.

use crate::{AddressingMode, MemoryBus, CPU};

/// Executes ASL (Arithmetic Shift Left). Bit 0 becomes 0.
///
/// # Arguments
///
/// * `cpu` - Mutable reference to the CPU
/// * `mode` - Accumulator or a memory addressing mode
pub(crate) fn execute_asl<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    cpu.modify_operand(mode, |cpu, value| {
        cpu.registers.p.carry = value & 0x80 != 0;
        let result = value << 1;
        cpu.update_zero_negative_flags(result);
        result
    });
}

/// Executes LSR (Logical Shift Right). N is always cleared.
pub(crate) fn execute_lsr<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    cpu.modify_operand(mode, |cpu, value| {
        cpu.registers.p.carry = value & 0x01 != 0;
        let result = value >> 1;
        cpu.update_zero_negative_flags(result);
        result
    });
}

/// Rotate left through carry.
pub(crate) fn execute_rol<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    cpu.modify_operand(mode, |cpu, value| {
        let carry_in = u8::from(cpu.registers.p.carry);
        cpu.registers.p.carry = value & 0x80 != 0;
        let result = (value << 1) | carry_in;
        cpu.update_zero_negative_flags(result);
        result
    });
}

/// Rotate right through carry.
pub(crate) fn execute_ror<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    cpu.modify_operand(mode, |cpu, value| {
        let carry_in = u8::from(cpu.registers.p.carry);
        cpu.registers.p.carry = value & 0x01 != 0;
        let result = (value >> 1) | (carry_in << 7);
        cpu.update_zero_negative_flags(result);
        result
    });
}
