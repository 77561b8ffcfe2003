//! # Status Flag Instructions
//!
//! CLC, SEC, CLI, SEI, CLD, SED and CLV. None of them touch other flags.

use crate::opcodes::Operation;
use crate::{MemoryBus, CPU};

/// Executes one of the flag set/clear instructions.
///
/// # Arguments
///
/// * `cpu` - Mutable reference to the CPU
/// * `operation` - Which flag instruction to run; anything else is ignored
pub(crate) fn execute_flag<M: MemoryBus>(cpu: &mut CPU<M>, operation: Operation) {
    let p = &mut cpu.registers.p;
    match operation {
        Operation::Clc => p.carry = false,
        Operation::Sec => p.carry = true,
        Operation::Cli => p.interrupt_disable = false,
        Operation::Sei => p.interrupt_disable = true,
        Operation::Cld => p.decimal = false,
        Operation::Sed => p.decimal = true,
        Operation::Clv => p.overflow = false,
        _ => {}
    }
}
