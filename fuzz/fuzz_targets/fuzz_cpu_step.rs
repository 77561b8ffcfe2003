//! Fuzz target for CPU step execution.
//!
//! Builds an arbitrary CPU state, memory contents and processor level, then
//! executes a handful of instructions looking for panics.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sim6502::{Memory, ProcessorLevel, CPU};

#[derive(Debug, Arbitrary)]
struct FuzzCpuState {
    level: u8,
    a: u8,
    x: u8,
    y: u8,
    sp: u8,
    status: u8,
}

#[derive(Debug, Arbitrary)]
struct FuzzMemory {
    /// Bytes at the PC location
    program: [u8; 16],
    zero_page: [u8; 256],
    stack_page: [u8; 256],
    main_memory: [u8; 256],
    /// Locks the program bytes, so stores into them are rejected
    lock_program: bool,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    cpu_state: FuzzCpuState,
    memory: FuzzMemory,
    steps: u8,
}

fuzz_target!(|input: FuzzInput| {
    let mut memory = Memory::new();

    memory.poke(0xFFFC, 0x00);
    memory.poke(0xFFFD, 0x80);
    memory.poke(0xFFFE, 0x00);
    memory.poke(0xFFFF, 0x90);

    for (i, &byte) in input.memory.zero_page.iter().enumerate() {
        memory.poke(i as u16, byte);
    }
    for (i, &byte) in input.memory.stack_page.iter().enumerate() {
        memory.poke(0x0100 + i as u16, byte);
    }
    for (i, &byte) in input.memory.main_memory.iter().enumerate() {
        memory.poke(0x4000 + i as u16, byte);
    }
    if input.memory.lock_program {
        memory.load_rom_bytes(&input.memory.program, 0x8000).unwrap();
    } else {
        memory.load_bytes(&input.memory.program, 0x8000).unwrap();
    }
    let program_before = input.memory.program;

    let level = ProcessorLevel::try_from(input.cpu_state.level % 3).unwrap();
    let mut cpu = CPU::new(level, memory).unwrap();
    cpu.reset();
    cpu.set_a(input.cpu_state.a);
    cpu.set_x(input.cpu_state.x);
    cpu.set_y(input.cpu_state.y);
    cpu.set_sp(input.cpu_state.sp);
    cpu.set_status(input.cpu_state.status);

    for _ in 0..input.steps % 16 {
        let before = cpu.cycles();
        if cpu.step().is_err() {
            break;
        }
        assert!(cpu.cycles() > before);
    }

    if input.memory.lock_program {
        for (i, &byte) in program_before.iter().enumerate() {
            assert_eq!(cpu.memory().peek(0x8000 + i as u16), byte);
        }
    }
});
