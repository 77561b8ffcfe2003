//! # Bit Manipulation Instructions (65SC02 and later)
//!
//! - TSB / TRB: test the accumulator against memory, then set or reset those bits
//! - RMB / SMB: reset or set a single bit of a page-zero byte (65C02 only)

use crate::{AddressingMode, MemoryBus, CPU};

/// Executes TSB (Test and Set Bits). Z is set if A AND memory is zero.
pub(crate) fn execute_tsb<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    cpu.modify_operand(mode, |cpu, value| {
        cpu.registers.p.zero = cpu.registers.a & value == 0;
        value | cpu.registers.a
    });
}

/// Executes TRB (Test and Reset Bits). Z is set if A AND memory is zero.
pub(crate) fn execute_trb<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    cpu.modify_operand(mode, |cpu, value| {
        cpu.registers.p.zero = cpu.registers.a & value == 0;
        value & !cpu.registers.a
    });
}

/// Executes RMBn (Reset Memory Bit). No flags are affected.
///
/// # Arguments
///
/// * `cpu` - Mutable reference to the CPU
/// * `bit` - Bit number 0-7, from bits 4-6 of the opcode
pub(crate) fn execute_rmb<M: MemoryBus>(cpu: &mut CPU<M>, bit: u8) {
    cpu.modify_operand(AddressingMode::ZeroPage, |_, value| value & !(1 << bit));
}

/// Executes SMBn (Set Memory Bit). No flags are affected.
pub(crate) fn execute_smb<M: MemoryBus>(cpu: &mut CPU<M>, bit: u8) {
    cpu.modify_operand(AddressingMode::ZeroPage, |_, value| value | (1 << bit));
}
