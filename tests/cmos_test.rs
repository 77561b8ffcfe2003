//! Tests for the 65SC02 and 65C02 additions and for illegal opcode handling.
//!
//! Undefined opcodes stop an NMOS 6502 with an error. On the CMOS parts they
//! are one-byte NOPs costing one cycle.

use std::cell::RefCell;
use std::rc::Rc;

use sim6502::{BusAccess, BusObserver, ExecutionError, Memory, MemoryBus, ProcessorLevel, CPU};

/// Helper function to create a CPU with reset vector at 0x8000
fn setup_cpu(level: ProcessorLevel) -> CPU<Memory> {
    let mut memory = Memory::new();
    memory.write(0xFFFC, 0x00);
    memory.write(0xFFFD, 0x80);
    let mut cpu = CPU::new(level, memory).unwrap();
    cpu.reset();
    cpu
}

fn load(cpu: &mut CPU<Memory>, address: u16, bytes: &[u8]) {
    for (i, &byte) in bytes.iter().enumerate() {
        cpu.memory_mut().write(address + i as u16, byte);
    }
}

struct ReadLog(Rc<RefCell<Vec<u16>>>);

impl BusObserver for ReadLog {
    fn reading_byte(&mut self, _bus: &mut BusAccess<'_>, address: u16, _value: u8) {
        self.0.borrow_mut().push(address);
    }
}

// ========== TSB / TRB ==========

#[test]
fn test_tsb_sets_bits_and_tests_against_accumulator() {
    let mut cpu = setup_cpu(ProcessorLevel::Cmos65SC02);
    load(&mut cpu, 0x8000, &[0x04, 0x10]); // TSB $10
    cpu.memory_mut().write(0x0010, 0xF0);
    cpu.set_a(0x0F);

    cpu.step().unwrap();

    assert_eq!(cpu.memory().peek(0x0010), 0xFF);
    assert!(cpu.flag_z());
    assert_eq!(cpu.a(), 0x0F);
    assert_eq!(cpu.cycles(), 5);
}

#[test]
fn test_trb_clears_bits() {
    let mut cpu = setup_cpu(ProcessorLevel::Cmos65SC02);
    load(&mut cpu, 0x8000, &[0x1C, 0x00, 0x20]); // TRB $2000
    cpu.memory_mut().write(0x2000, 0xFF);
    cpu.set_a(0x0F);

    cpu.step().unwrap();

    assert_eq!(cpu.memory().peek(0x2000), 0xF0);
    assert!(!cpu.flag_z());
    assert_eq!(cpu.cycles(), 6);
}

// ========== RMB / SMB ==========

#[test]
fn test_rmb_and_smb() {
    let mut cpu = setup_cpu(ProcessorLevel::Cmos65C02);
    load(&mut cpu, 0x8000, &[0x37, 0x10, 0xB7, 0x11]); // RMB3 $10 ; SMB3 $11
    cpu.memory_mut().write(0x0010, 0xFF);
    cpu.memory_mut().write(0x0011, 0x00);
    let status = cpu.status();

    cpu.step().unwrap();
    cpu.step().unwrap();

    assert_eq!(cpu.memory().peek(0x0010), 0xF7);
    assert_eq!(cpu.memory().peek(0x0011), 0x08);
    assert_eq!(cpu.status(), status);
    assert_eq!(cpu.cycles(), 10);
}

#[test]
fn test_rmb_is_a_single_byte_nop_on_65sc02() {
    let mut cpu = setup_cpu(ProcessorLevel::Cmos65SC02);
    load(&mut cpu, 0x8000, &[0x37, 0x10]);
    cpu.memory_mut().write(0x0010, 0xFF);

    cpu.step().unwrap();

    assert_eq!(cpu.memory().peek(0x0010), 0xFF);
    assert_eq!(cpu.pc(), 0x8001);
}

// ========== Accumulator INC / DEC ==========

#[test]
fn test_inc_and_dec_accumulator() {
    let mut cpu = setup_cpu(ProcessorLevel::Cmos65SC02);
    load(&mut cpu, 0x8000, &[0x1A, 0x3A]); // INC A ; DEC A
    cpu.set_a(0xFF);

    cpu.step().unwrap();
    assert_eq!(cpu.a(), 0x00);
    assert!(cpu.flag_z());

    cpu.step().unwrap();
    assert_eq!(cpu.a(), 0xFF);
    assert!(cpu.flag_n());
    assert_eq!(cpu.cycles(), 4);
}

// ========== (zp) Mode ==========

#[test]
fn test_sta_zero_page_indirect() {
    let mut cpu = setup_cpu(ProcessorLevel::Cmos65SC02);
    load(&mut cpu, 0x8000, &[0x92, 0xFF]); // STA ($FF)
    cpu.memory_mut().write(0x00FF, 0x00);
    cpu.memory_mut().write(0x0000, 0x40);
    cpu.set_a(0x99);

    cpu.step().unwrap();

    assert_eq!(cpu.memory().peek(0x4000), 0x99);
    assert_eq!(cpu.cycles(), 5);
}

// ========== Undefined CMOS Opcodes ==========

#[test]
fn test_undefined_opcodes_with_operand_slots_are_single_byte_nops() {
    let opcodes = [0x02, 0x22, 0x42, 0x62, 0x82, 0xC2, 0xE2, 0x44, 0x54, 0xD4, 0xF4, 0x5C, 0xDC, 0xFC];
    for level in [ProcessorLevel::Cmos65SC02, ProcessorLevel::Cmos65C02] {
        for opcode in opcodes {
            let mut cpu = setup_cpu(level);
            load(&mut cpu, 0x8000, &[opcode, 0xA9]);

            cpu.step().unwrap();

            assert_eq!(cpu.pc(), 0x8001, "{level} ${opcode:02X}");
            assert_eq!(cpu.cycles(), 1, "{level} ${opcode:02X}");
        }
    }
}

#[test]
fn test_undefined_opcode_runs_following_byte_as_next_instruction() {
    let mut cpu = setup_cpu(ProcessorLevel::Cmos65SC02);
    load(&mut cpu, 0x8000, &[0x02, 0xA9, 0x2A]); // ??? ; LDA #$2A

    cpu.step().unwrap();
    cpu.step().unwrap();

    assert_eq!(cpu.a(), 0x2A);
    assert_eq!(cpu.pc(), 0x8003);
    assert_eq!(cpu.cycles(), 3);
}

#[test]
fn test_undefined_opcode_reads_only_the_opcode() {
    let mut cpu = setup_cpu(ProcessorLevel::Cmos65C02);
    load(&mut cpu, 0x8000, &[0x44, 0x10]);
    let reads = Rc::new(RefCell::new(Vec::new()));
    cpu.memory_mut().add_observer(Box::new(ReadLog(Rc::clone(&reads))));

    cpu.step().unwrap();

    assert_eq!(*reads.borrow(), vec![0x8000]);
}

// ========== Illegal Opcodes ==========

#[test]
fn test_illegal_opcode_is_fatal_on_nmos() {
    let mut cpu = setup_cpu(ProcessorLevel::Nmos6502);
    load(&mut cpu, 0x8000, &[0xEA, 0x02]);
    cpu.step().unwrap();

    let error = cpu.step().unwrap_err();

    assert_eq!(
        error,
        ExecutionError::IllegalInstruction {
            address: 0x8001,
            opcode: 0x02,
            cycles: 2,
        }
    );
    assert!(error.to_string().contains("$02"));
}

#[test]
fn test_illegal_opcode_is_one_cycle_nop_on_cmos() {
    for level in [ProcessorLevel::Cmos65SC02, ProcessorLevel::Cmos65C02] {
        for opcode in [0x03, 0x0B, 0x13, 0xFB] {
            let mut cpu = setup_cpu(level);
            load(&mut cpu, 0x8000, &[opcode]);

            cpu.step().unwrap();

            assert_eq!(cpu.pc(), 0x8001, "{level} ${opcode:02X}");
            assert_eq!(cpu.cycles(), 1, "{level} ${opcode:02X}");
        }
    }
}

#[test]
fn test_wai_is_a_nop_on_65sc02() {
    let mut cpu = setup_cpu(ProcessorLevel::Cmos65SC02);
    load(&mut cpu, 0x8000, &[0xCB]);

    cpu.step().unwrap();

    assert_eq!(cpu.pc(), 0x8001);
}
