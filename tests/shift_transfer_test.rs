//! Tests for shifts and rotates, increments and decrements, register
//! transfers and the flag instructions.

use sim6502::{Memory, MemoryBus, ProcessorLevel, CPU};

/// Helper function to create a CPU with reset vector at 0x8000
fn setup_cpu() -> CPU<Memory> {
    let mut memory = Memory::new();
    memory.write(0xFFFC, 0x00);
    memory.write(0xFFFD, 0x80);
    let mut cpu = CPU::new(ProcessorLevel::Nmos6502, memory).unwrap();
    cpu.reset();
    cpu
}

fn load(cpu: &mut CPU<Memory>, address: u16, bytes: &[u8]) {
    for (i, &byte) in bytes.iter().enumerate() {
        cpu.memory_mut().write(address + i as u16, byte);
    }
}

// ========== Shifts and Rotates ==========

#[test]
fn test_asl_accumulator() {
    let mut cpu = setup_cpu();
    load(&mut cpu, 0x8000, &[0x0A]);
    cpu.set_a(0x81);

    cpu.step().unwrap();

    assert_eq!(cpu.a(), 0x02);
    assert!(cpu.flag_c());
    assert!(!cpu.flag_n());
    assert_eq!(cpu.cycles(), 2);
}

#[test]
fn test_asl_zero_page() {
    let mut cpu = setup_cpu();
    load(&mut cpu, 0x8000, &[0x06, 0x10]);
    cpu.memory_mut().write(0x0010, 0x40);

    cpu.step().unwrap();

    assert_eq!(cpu.memory().peek(0x0010), 0x80);
    assert!(cpu.flag_n());
    assert!(!cpu.flag_c());
    assert_eq!(cpu.cycles(), 5);
}

#[test]
fn test_lsr_to_zero() {
    let mut cpu = setup_cpu();
    load(&mut cpu, 0x8000, &[0x4A]);
    cpu.set_a(0x01);

    cpu.step().unwrap();

    assert_eq!(cpu.a(), 0x00);
    assert!(cpu.flag_z());
    assert!(cpu.flag_c());
}

#[test]
fn test_rol_and_ror_through_carry() {
    let mut cpu = setup_cpu();
    load(&mut cpu, 0x8000, &[0x2A, 0x6A, 0x6A]); // ROL A ; ROR A ; ROR A
    cpu.set_a(0x80);
    cpu.set_flag_c(true);

    cpu.step().unwrap();
    assert_eq!(cpu.a(), 0x01);
    assert!(cpu.flag_c());

    cpu.step().unwrap();
    assert_eq!(cpu.a(), 0x80);
    assert!(cpu.flag_c());
    assert!(cpu.flag_n());

    cpu.step().unwrap();
    assert_eq!(cpu.a(), 0xC0);
    assert!(!cpu.flag_c());
}

#[test]
fn test_rmw_absolute_x_has_fixed_cost_across_pages() {
    let mut cpu = setup_cpu();
    load(&mut cpu, 0x8000, &[0x1E, 0xFF, 0x20]); // ASL $20FF,X
    cpu.memory_mut().write(0x2100, 0x01);
    cpu.set_x(0x01);

    cpu.step().unwrap();

    assert_eq!(cpu.memory().peek(0x2100), 0x02);
    assert_eq!(cpu.cycles(), 7);
}

// ========== Increment and Decrement ==========

#[test]
fn test_inc_memory_wraps_to_zero() {
    let mut cpu = setup_cpu();
    load(&mut cpu, 0x8000, &[0xE6, 0x10]);
    cpu.memory_mut().write(0x0010, 0xFF);

    cpu.step().unwrap();

    assert_eq!(cpu.memory().peek(0x0010), 0x00);
    assert!(cpu.flag_z());
    assert_eq!(cpu.cycles(), 5);
}

#[test]
fn test_dec_absolute_x() {
    let mut cpu = setup_cpu();
    load(&mut cpu, 0x8000, &[0xDE, 0xFF, 0x20]); // DEC $20FF,X
    cpu.set_x(0x01);

    cpu.step().unwrap();

    assert_eq!(cpu.memory().peek(0x2100), 0xFF);
    assert!(cpu.flag_n());
    assert_eq!(cpu.cycles(), 7);
}

#[test]
fn test_register_increments_wrap() {
    let mut cpu = setup_cpu();
    load(&mut cpu, 0x8000, &[0xE8, 0x88, 0xC8, 0xCA]); // INX ; DEY ; INY ; DEX
    cpu.set_x(0xFF);
    cpu.set_y(0x00);

    cpu.step().unwrap();
    assert_eq!(cpu.x(), 0x00);
    assert!(cpu.flag_z());

    cpu.step().unwrap();
    assert_eq!(cpu.y(), 0xFF);
    assert!(cpu.flag_n());

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.y(), 0x00);
    assert_eq!(cpu.x(), 0xFF);
    assert_eq!(cpu.cycles(), 8);
}

// ========== Transfers ==========

#[test]
fn test_transfers_update_flags() {
    let mut cpu = setup_cpu();
    load(&mut cpu, 0x8000, &[0xAA, 0xA8, 0x8A, 0x98]); // TAX ; TAY ; TXA ; TYA
    cpu.set_a(0x80);

    cpu.step().unwrap();
    assert_eq!(cpu.x(), 0x80);
    assert!(cpu.flag_n());

    cpu.step().unwrap();
    assert_eq!(cpu.y(), 0x80);

    cpu.set_x(0x00);
    cpu.step().unwrap();
    assert_eq!(cpu.a(), 0x00);
    assert!(cpu.flag_z());

    cpu.step().unwrap();
    assert_eq!(cpu.a(), 0x80);
    assert!(!cpu.flag_z());
}

#[test]
fn test_txs_leaves_flags_and_tsx_sets_them() {
    let mut cpu = setup_cpu();
    load(&mut cpu, 0x8000, &[0x9A, 0xA2, 0x01, 0xBA]); // TXS ; LDX #1 ; TSX
    cpu.set_x(0x00);
    let status = cpu.status();

    cpu.step().unwrap();
    assert_eq!(cpu.sp(), 0x00);
    assert_eq!(cpu.status(), status);

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.x(), 0x00);
    assert!(cpu.flag_z());
}

// ========== Flag Instructions ==========

#[test]
fn test_set_and_clear_flags() {
    let mut cpu = setup_cpu();
    load(&mut cpu, 0x8000, &[0x38, 0x78, 0xF8, 0x18, 0x58, 0xD8, 0xB8]);
    cpu.set_flag_v(true);

    cpu.step().unwrap();
    cpu.step().unwrap();
    cpu.step().unwrap();
    assert!(cpu.flag_c());
    assert!(cpu.flag_i());
    assert!(cpu.flag_d());

    for _ in 0..4 {
        cpu.step().unwrap();
    }
    assert!(!cpu.flag_c());
    assert!(!cpu.flag_i());
    assert!(!cpu.flag_d());
    assert!(!cpu.flag_v());
    assert_eq!(cpu.cycles(), 14);
}
