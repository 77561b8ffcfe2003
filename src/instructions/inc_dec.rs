//! # Increment and Decrement Instructions
//!
//! INC and DEC work on memory, or on the accumulator on the 65SC02 and later.
//! All of them wrap and set Z and N from the result.

use crate::{AddressingMode, MemoryBus, CPU};

/// Executes INC (Increment Memory, or A on the 65SC02 and later).
pub(crate) fn execute_inc<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    cpu.modify_operand(mode, |cpu, value| {
        let result = value.wrapping_add(1);
        cpu.update_zero_negative_flags(result);
        result
    });
}

/// Executes DEC (Decrement Memory, or A on the 65SC02 and later).
pub(crate) fn execute_dec<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    cpu.modify_operand(mode, |cpu, value| {
        let result = value.wrapping_sub(1);
        cpu.update_zero_negative_flags(result);
        result
    });
}

pub(crate) fn execute_inx<M: MemoryBus>(cpu: &mut CPU<M>) {
    cpu.registers.x = cpu.registers.x.wrapping_add(1);
    cpu.update_zero_negative_flags(cpu.registers.x);
}

pub(crate) fn execute_iny<M: MemoryBus>(cpu: &mut CPU<M>) {
    cpu.registers.y = cpu.registers.y.wrapping_add(1);
    cpu.update_zero_negative_flags(cpu.registers.y);
}

pub(crate) fn execute_dex<M: MemoryBus>(cpu: &mut CPU<M>) {
    cpu.registers.x = cpu.registers.x.wrapping_sub(1);
    cpu.update_zero_negative_flags(cpu.registers.x);
}

pub(crate) fn execute_dey<M: MemoryBus>(cpu: &mut CPU<M>) {
    cpu.registers.y = cpu.registers.y.wrapping_sub(1);
    cpu.update_zero_negative_flags(cpu.registers.y);
}
