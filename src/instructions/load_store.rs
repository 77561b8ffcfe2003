//! # Load and Store Instructions
//!
//! Loads set Z and N from the loaded value and pay the page-crossing penalty
//! on indexed reads. Stores affect no flags and never pay it.

use crate::{AddressingMode, MemoryBus, CPU};

/// Executes LDA (Load Accumulator).
///
/// # Arguments
///
/// * `cpu` - Mutable reference to the CPU
/// * `mode` - Addressing mode from the instruction table
pub(crate) fn execute_lda<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    let value = cpu.read_operand(mode);
    cpu.registers.a = value;
    cpu.update_zero_negative_flags(value);
}

/// Executes LDX (Load X Register).
pub(crate) fn execute_ldx<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    let value = cpu.read_operand(mode);
    cpu.registers.x = value;
    cpu.update_zero_negative_flags(value);
}

/// Executes LDY (Load Y Register).
pub(crate) fn execute_ldy<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    let value = cpu.read_operand(mode);
    cpu.registers.y = value;
    cpu.update_zero_negative_flags(value);
}

/// Executes STA (Store Accumulator).
pub(crate) fn execute_sta<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    cpu.write_operand(mode, cpu.registers.a);
}

pub(crate) fn execute_stx<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    cpu.write_operand(mode, cpu.registers.x);
}

pub(crate) fn execute_sty<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    cpu.write_operand(mode, cpu.registers.y);
}

/// Executes STZ (Store Zero), 65SC02 and later.
pub(crate) fn execute_stz<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    cpu.write_operand(mode, 0);
}
