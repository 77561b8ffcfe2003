//! # Register Transfer Instructions
//!
//! All transfers set Z and N from the copied value, except TXS.

use crate::{MemoryBus, CPU};

pub(crate) fn execute_tax<M: MemoryBus>(cpu: &mut CPU<M>) {
    cpu.registers.x = cpu.registers.a;
    cpu.update_zero_negative_flags(cpu.registers.x);
}

pub(crate) fn execute_tay<M: MemoryBus>(cpu: &mut CPU<M>) {
    cpu.registers.y = cpu.registers.a;
    cpu.update_zero_negative_flags(cpu.registers.y);
}

pub(crate) fn execute_txa<M: MemoryBus>(cpu: &mut CPU<M>) {
    cpu.registers.a = cpu.registers.x;
    cpu.update_zero_negative_flags(cpu.registers.a);
}

pub(crate) fn execute_tya<M: MemoryBus>(cpu: &mut CPU<M>) {
    cpu.registers.a = cpu.registers.y;
    cpu.update_zero_negative_flags(cpu.registers.a);
}

pub(crate) fn execute_tsx<M: MemoryBus>(cpu: &mut CPU<M>) {
    cpu.registers.x = cpu.registers.s;
    cpu.update_zero_negative_flags(cpu.registers.x);
}

/// Executes TXS. Flags are not affected.
pub(crate) fn execute_txs<M: MemoryBus>(cpu: &mut CPU<M>) {
    cpu.registers.s = cpu.registers.x;
}
