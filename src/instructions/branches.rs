//! # Branch Instructions
//!
//! All branches use a signed 8-bit displacement relative to the address of the
//! next instruction.
//!
//! Cycle timing, on top of the base cost:
//! - +0 if the branch is not taken
//! - +1 if the branch is taken
//! - +1 more if the target is on a different page from the next instruction
//!
//! BBR and BBS (65C02) test one bit of a page-zero byte before branching.

use crate::{MemoryBus, CPU};

/// Fetches the displacement and branches if `condition` holds.
///
/// Shared by BCC, BCS, BEQ, BNE, BMI, BPL, BVC, BVS and BRA.
///
/// # Arguments
///
/// * `cpu` - Mutable reference to the CPU, with PC at the displacement byte
/// * `condition` - Whether the branch is taken
pub(crate) fn branch<M: MemoryBus>(cpu: &mut CPU<M>, condition: bool) {
    let displacement = cpu.fetch_byte() as i8;
    if condition {
        take_branch(cpu, displacement);
    }
}

fn take_branch<M: MemoryBus>(cpu: &mut CPU<M>, displacement: i8) {
    let next = cpu.registers.pc;
    let target = next.wrapping_add_signed(displacement as i16);

    cpu.registers.cycles += 1;
    if (next & 0xFF00) != (target & 0xFF00) {
        cpu.registers.cycles += 1;
    }
    cpu.registers.pc = target;
}

/// Executes BBRn (Branch on Bit Reset).
///
/// # Arguments
///
/// * `cpu` - Mutable reference to the CPU
/// * `bit` - Bit of the page-zero byte to test
pub(crate) fn execute_bbr<M: MemoryBus>(cpu: &mut CPU<M>, bit: u8) {
    test_bit_and_branch(cpu, bit, false);
}

/// Executes BBSn (Branch on Bit Set).
pub(crate) fn execute_bbs<M: MemoryBus>(cpu: &mut CPU<M>, bit: u8) {
    test_bit_and_branch(cpu, bit, true);
}

fn test_bit_and_branch<M: MemoryBus>(cpu: &mut CPU<M>, bit: u8, branch_if_set: bool) {
    let address = cpu.fetch_byte() as u16;
    let value = cpu.memory.read(address);
    let displacement = cpu.fetch_byte() as i8;
    if (value & (1 << bit) != 0) == branch_if_set {
        take_branch(cpu, displacement);
    }
}
