//! # Control Flow Instructions
//!
//! - BRK: software interrupt through the IRQ vector
//! - JMP: absolute, indirect, and (65SC02+) absolute indexed indirect
//! - JSR / RTS: subroutine call and return
//! - RTI: return from interrupt
//! - NOP

use crate::addressing::Access;
use crate::cpu::IRQ_VECTOR;
use crate::{AddressingMode, MemoryBus, ProcessorLevel, CPU};

/// Executes the BRK (Force Interrupt) instruction.
///
/// BRK is followed by a padding byte, so the return address pushed is the
/// opcode address plus two.
///
/// 1. Push the return address, high byte first
/// 2. Push P with the B flag set (P itself is not modified)
/// 3. Set I; on the 65SC02 and later also clear D
/// 4. Load PC from the IRQ vector at $FFFE/F
pub(crate) fn execute_brk<M: MemoryBus>(cpu: &mut CPU<M>) {
    let return_address = cpu.registers.pc.wrapping_add(1);
    cpu.push_word(return_address);

    let mut pushed = cpu.registers.p;
    pushed.break_command = true;
    cpu.push_byte(pushed.to_byte());

    cpu.registers.p.interrupt_disable = true;
    if cpu.level >= ProcessorLevel::Cmos65SC02 {
        cpu.registers.p.decimal = false;
    }
    cpu.registers.pc = cpu.get_word(IRQ_VECTOR);
}

/// Executes the JMP (Jump) instruction.
///
/// JMP ($xxFF) reproduces the NMOS page-wrap bug on the 6502 only; see
/// [`AddressingMode::Indirect`].
pub(crate) fn execute_jmp<M: MemoryBus>(cpu: &mut CPU<M>, mode: AddressingMode) {
    cpu.registers.pc = cpu.effective_address(mode, Access::Read);
}

/// Executes JSR. Pushes the address of the last byte of the JSR instruction.
pub(crate) fn execute_jsr<M: MemoryBus>(cpu: &mut CPU<M>) {
    let target = cpu.fetch_word();
    cpu.push_word(cpu.registers.pc.wrapping_sub(1));
    cpu.registers.pc = target;
}

/// Executes RTS. Pulls the return address and resumes one byte past it.
pub(crate) fn execute_rts<M: MemoryBus>(cpu: &mut CPU<M>) {
    cpu.registers.pc = cpu.pop_word().wrapping_add(1);
}

/// Executes RTI: pull P (reserved bit forced on), then pull PC.
pub(crate) fn execute_rti<M: MemoryBus>(cpu: &mut CPU<M>) {
    super::stack::execute_plp(cpu);
    cpu.registers.pc = cpu.pop_word();
}

/// Executes NOP. Only the base cycles are charged.
pub(crate) fn execute_nop() {}
