//! Tests for the lockable memory bus: write protection, notifications,
//! image loading and in-place changes made by observers.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use sim6502::{BusAccess, BusObserver, Memory, MemoryBus, MemoryError, ProcessorLevel, CPU};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BusEvent {
    Read(u16, u8),
    Write(u16, u8),
    Rejected(u16, u8),
}

type EventLog = Rc<RefCell<Vec<BusEvent>>>;

struct Recorder(EventLog);

impl BusObserver for Recorder {
    fn reading_byte(&mut self, _bus: &mut BusAccess<'_>, address: u16, value: u8) {
        self.0.borrow_mut().push(BusEvent::Read(address, value));
    }

    fn writing_byte(&mut self, address: u16, value: u8) {
        self.0.borrow_mut().push(BusEvent::Write(address, value));
    }

    fn invalid_write_attempt(&mut self, address: u16, value: u8) {
        self.0.borrow_mut().push(BusEvent::Rejected(address, value));
    }
}

fn recorded_memory() -> (Memory, EventLog) {
    let log = EventLog::default();
    let mut memory = Memory::new();
    memory.add_observer(Box::new(Recorder(Rc::clone(&log))));
    (memory, log)
}

/// Writes `bytes` to a uniquely named file in the temp directory.
fn temp_image(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("sim6502-{}-{name}.bin", std::process::id()));
    fs::write(&path, bytes).unwrap();
    path
}

// ========== Notifications ==========

#[test]
fn test_write_and_read_notify_once() {
    let (mut memory, log) = recorded_memory();

    memory.set_byte(0x0200, 0x42);
    let value = memory.get_byte(0x0200);

    assert_eq!(value, 0x42);
    assert_eq!(*log.borrow(), vec![BusEvent::Write(0x0200, 0x42), BusEvent::Read(0x0200, 0x42)]);
}

#[test]
fn test_locked_write_is_rejected_with_one_notification() {
    let (mut memory, log) = recorded_memory();
    memory.load_rom_bytes(&[0xAA, 0xBB], 0xC000).unwrap();

    memory.set_byte(0xC000, 0x11);

    assert_eq!(memory.peek(0xC000), 0xAA);
    assert_eq!(*log.borrow(), vec![BusEvent::Rejected(0xC000, 0x11)]);
}

#[test]
fn test_peek_and_poke_are_silent() {
    let (mut memory, log) = recorded_memory();
    memory.lock_memory(0x1000, 1);

    memory.poke(0x1000, 0x77);

    assert_eq!(memory.peek(0x1000), 0x77);
    assert!(log.borrow().is_empty());
}

#[test]
fn test_cpu_store_to_rom_is_rejected_and_execution_continues() {
    let (mut memory, log) = recorded_memory();
    memory.poke(0xFFFC, 0x00);
    memory.poke(0xFFFD, 0x80);
    memory.poke(0x8000, 0x8D); // STA $C000
    memory.poke(0x8001, 0x00);
    memory.poke(0x8002, 0xC0);
    memory.poke(0x8003, 0xEA);
    memory.load_rom_bytes(&[0x55], 0xC000).unwrap();
    let mut cpu = CPU::new(ProcessorLevel::Nmos6502, memory).unwrap();
    cpu.reset();
    cpu.set_a(0x99);

    cpu.step().unwrap();
    cpu.step().unwrap();

    assert_eq!(cpu.memory().peek(0xC000), 0x55);
    assert!(log.borrow().contains(&BusEvent::Rejected(0xC000, 0x99)));
    assert_eq!(cpu.pc(), 0x8004);
}

// ========== Observer Access ==========

/// Clears an input location once it has been read, like a console latch.
struct ConsumeOnRead(u16);

impl BusObserver for ConsumeOnRead {
    fn reading_byte(&mut self, bus: &mut BusAccess<'_>, address: u16, value: u8) {
        if address == self.0 && value != 0 {
            bus.set(address, 0);
        }
    }
}

#[test]
fn test_observer_can_change_memory_during_read() {
    let mut memory = Memory::new();
    memory.add_observer(Box::new(ConsumeOnRead(0xF004)));
    memory.write(0xF004, 0x41);

    assert_eq!(memory.read(0xF004), 0x41);
    assert_eq!(memory.read(0xF004), 0x00);
}

#[test]
fn test_observer_writes_honour_locks() {
    let mut memory = Memory::new();
    memory.add_observer(Box::new(ConsumeOnRead(0xF004)));
    memory.load_rom_bytes(&[0x41], 0xF004).unwrap();

    assert_eq!(memory.read(0xF004), 0x41);
    assert_eq!(memory.peek(0xF004), 0x41);
}

// ========== Image Loading ==========

#[test]
fn test_load_rom_file_locks_its_range() {
    let path = temp_image("rom", &[0x01, 0x02, 0x03]);
    let mut memory = Memory::new();

    let length = memory.load_rom(&path, 0xF000).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(length, 3);
    assert_eq!(memory.peek(0xF002), 0x03);
    assert!(memory.is_locked(0xF000));
    assert!(memory.is_locked(0xF002));
    assert!(!memory.is_locked(0xF003));
    assert!(!memory.is_locked(0xEFFF));
}

#[test]
fn test_load_ram_file_stays_writable() {
    let path = temp_image("ram", &[0xDE, 0xAD]);
    let mut memory = Memory::new();

    memory.load_ram(&path, 0x0400).unwrap();
    fs::remove_file(&path).unwrap();
    memory.write(0x0400, 0x00);

    assert_eq!(memory.peek(0x0400), 0x00);
    assert_eq!(memory.peek(0x0401), 0xAD);
}

#[test]
fn test_image_ending_at_top_of_memory_fits() {
    let mut memory = Memory::new();

    assert_eq!(memory.load_rom_bytes(&[0xFF; 0x1000], 0xF000).unwrap(), 0x1000);
    assert!(memory.is_locked(0xFFFF));
}

#[test]
fn test_image_too_large() {
    let mut memory = Memory::new();

    let error = memory.load_bytes(&[0x00; 0x1001], 0xF000).unwrap_err();

    assert!(matches!(
        error,
        MemoryError::ImageTooLarge {
            length: 0x1001,
            offset: 0xF000,
            available: 0x1000,
        }
    ));
    assert_eq!(memory.peek(0xF000), 0x00);
}

#[test]
fn test_missing_image_file() {
    let mut memory = Memory::new();

    let error = memory.load_rom("/nonexistent/sim6502/rom.bin", 0xC000).unwrap_err();

    assert!(matches!(error, MemoryError::Io { .. }));
    assert!(error.to_string().contains("rom.bin"));
}

// ========== Initialise ==========

#[test]
fn test_clear_memory_and_locking() {
    let mut memory = Memory::new();
    memory.load_rom_bytes(&[0x12, 0x34], 0x9000).unwrap();

    memory.clear_locking();
    memory.write(0x9000, 0x56);
    assert_eq!(memory.peek(0x9000), 0x56);

    memory.clear_memory();
    assert_eq!(memory.peek(0x9001), 0x00);
}
