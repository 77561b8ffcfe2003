//! # Stack Operations
//!
//! The stack lives at $0100-$01FF and grows downward. A push writes to
//! $0100 | S and then decrements S; a pull increments S and then reads.

use crate::{MemoryBus, CPU};

/// Executes PHA (Push Accumulator).
pub(crate) fn execute_pha<M: MemoryBus>(cpu: &mut CPU<M>) {
    cpu.push_byte(cpu.registers.a);
}

pub(crate) fn execute_phx<M: MemoryBus>(cpu: &mut CPU<M>) {
    cpu.push_byte(cpu.registers.x);
}

pub(crate) fn execute_phy<M: MemoryBus>(cpu: &mut CPU<M>) {
    cpu.push_byte(cpu.registers.y);
}

/// Executes PHP. The pushed copy has B set; P itself is left alone.
pub(crate) fn execute_php<M: MemoryBus>(cpu: &mut CPU<M>) {
    let mut pushed = cpu.registers.p;
    pushed.break_command = true;
    cpu.push_byte(pushed.to_byte());
}

/// Executes PLA (Pull Accumulator). Sets Z and N.
pub(crate) fn execute_pla<M: MemoryBus>(cpu: &mut CPU<M>) {
    let value = cpu.pop_byte();
    cpu.registers.a = value;
    cpu.update_zero_negative_flags(value);
}

pub(crate) fn execute_plx<M: MemoryBus>(cpu: &mut CPU<M>) {
    let value = cpu.pop_byte();
    cpu.registers.x = value;
    cpu.update_zero_negative_flags(value);
}

pub(crate) fn execute_ply<M: MemoryBus>(cpu: &mut CPU<M>) {
    let value = cpu.pop_byte();
    cpu.registers.y = value;
    cpu.update_zero_negative_flags(value);
}

/// Executes PLP. The reserved bit always reads back as set.
pub(crate) fn execute_plp<M: MemoryBus>(cpu: &mut CPU<M>) {
    cpu.registers.p = crate::StatusRegister::load(cpu.pop_byte());
}
