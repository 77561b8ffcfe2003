//! Tests for the real-time scheduler, driven by a manual clock.
//!
//! At 1 MHz with a 10 ms poll interval each tick grants 10,000 cycles, plus
//! another 10,000 for every whole interval the host has fallen behind.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use sim6502::{
    ExecutionError, ExecutionObserver, ManualClock, Memory, PacingConfig, ProcessorLevel, Registers,
    RunFlag, Scheduler, SchedulerState, TimeSource, CPU,
};

const PROGRAM_START: u16 = 0x0200;

/// Helper function to create a CPU that executes NOPs from 0x0200
fn setup_cpu(level: ProcessorLevel) -> CPU<Memory> {
    let mut memory = Memory::new();
    for address in PROGRAM_START..0xF000 {
        memory.poke(address, 0xEA);
    }
    let mut cpu = CPU::new(level, memory).unwrap();
    cpu.start(PROGRAM_START);
    cpu
}

fn setup_scheduler() -> (Scheduler<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let pacing = PacingConfig::new(1.0, Duration::from_millis(10));
    (Scheduler::new(pacing, clock.clone()), clock)
}

#[derive(Default)]
struct Counts {
    starting: Cell<u32>,
    finished: Cell<u32>,
    polling: Cell<u32>,
}

struct Counter(Rc<Counts>);

impl ExecutionObserver for Counter {
    fn starting(&mut self) {
        self.0.starting.set(self.0.starting.get() + 1);
    }

    fn finished(&mut self) {
        self.0.finished.set(self.0.finished.get() + 1);
    }

    fn polling(&mut self) {
        self.0.polling.set(self.0.polling.get() + 1);
    }
}

struct StopAt {
    address: u16,
    run_flag: RunFlag,
}

impl ExecutionObserver for StopAt {
    fn executing_instruction(&mut self, _registers: &Registers, address: u16, _opcode: u8) {
        if address == self.address {
            self.run_flag.stop();
        }
    }
}

fn count_events(cpu: &mut CPU<Memory>) -> Rc<Counts> {
    let counts = Rc::new(Counts::default());
    cpu.add_observer(Box::new(Counter(Rc::clone(&counts))));
    counts
}

// ========== Cycle Budget ==========

#[test]
fn test_tick_grants_one_interval_of_cycles() {
    let mut cpu = setup_cpu(ProcessorLevel::Nmos6502);
    let (mut scheduler, _clock) = setup_scheduler();

    let report = scheduler.tick(&mut cpu).unwrap();

    assert_eq!(report.allowed_cycles, 10_000);
    assert_eq!(report.executed_cycles, 10_000);
    assert!(!report.finished);
    assert_eq!(cpu.cycles(), 10_000);
    assert_eq!(scheduler.state(), SchedulerState::Running);
    assert_eq!(scheduler.jiffies(), 1);
}

#[test]
fn test_overshoot_carries_into_next_interval() {
    let mut cpu = setup_cpu(ProcessorLevel::Nmos6502);
    // JMP $0200: three cycles per instruction.
    cpu.memory_mut().poke(0x0200, 0x4C);
    cpu.memory_mut().poke(0x0201, 0x00);
    cpu.memory_mut().poke(0x0202, 0x02);
    let (mut scheduler, clock) = setup_scheduler();

    let first = scheduler.tick(&mut cpu).unwrap();
    clock.advance(Duration::from_millis(10));
    let second = scheduler.tick(&mut cpu).unwrap();

    assert_eq!(first.executed_cycles, 10_002);
    assert_eq!(second.allowed_cycles, 10_000);
    assert_eq!(second.executed_cycles, 9_999);
    assert_eq!(cpu.cycles(), 20_001);
}

#[test]
fn test_missed_intervals_are_caught_up() {
    let mut cpu = setup_cpu(ProcessorLevel::Cmos65C02);
    let (mut scheduler, clock) = setup_scheduler();

    scheduler.tick(&mut cpu).unwrap();
    clock.advance(Duration::from_millis(50));
    let report = scheduler.tick(&mut cpu).unwrap();

    assert_eq!(report.allowed_cycles, 50_000);
    assert_eq!(report.executed_cycles, 50_000);
    assert_eq!(cpu.cycles(), 60_000);
}

#[test]
fn test_partial_interval_delay_is_not_caught_up() {
    let mut cpu = setup_cpu(ProcessorLevel::Cmos65C02);
    let (mut scheduler, clock) = setup_scheduler();

    scheduler.tick(&mut cpu).unwrap();
    clock.advance(Duration::from_millis(19));
    let report = scheduler.tick(&mut cpu).unwrap();

    assert_eq!(report.allowed_cycles, 10_000);
}

// ========== Lifecycle ==========

#[test]
fn test_start_notifies_once() {
    let mut cpu = setup_cpu(ProcessorLevel::Nmos6502);
    let counts = count_events(&mut cpu);
    let (mut scheduler, _clock) = setup_scheduler();

    scheduler.start(&mut cpu);
    scheduler.start(&mut cpu);
    scheduler.tick(&mut cpu).unwrap();

    assert_eq!(counts.starting.get(), 1);
    assert_eq!(counts.polling.get(), 1);
}

#[test]
fn test_run_finishes_exactly_once() {
    let mut cpu = setup_cpu(ProcessorLevel::Nmos6502);
    let counts = count_events(&mut cpu);
    let run_flag = cpu.run_flag();
    // The NOP at this address begins at cycle 25,000.
    cpu.add_observer(Box::new(StopAt {
        address: PROGRAM_START + 12_500,
        run_flag,
    }));
    let (mut scheduler, clock) = setup_scheduler();

    let summary = scheduler.run(&mut cpu).unwrap();

    assert_eq!(summary.cycles, 25_002);
    assert_eq!(summary.jiffies, 3);
    assert_eq!(summary.elapsed, Duration::from_millis(20));
    assert_eq!(clock.now(), Duration::from_millis(20));
    assert_eq!(counts.starting.get(), 1);
    assert_eq!(counts.polling.get(), 3);
    assert_eq!(counts.finished.get(), 1);
    assert_eq!(scheduler.state(), SchedulerState::Finished);

    let report = scheduler.tick(&mut cpu).unwrap();
    assert!(report.finished);
    assert_eq!(report.executed_cycles, 0);
    assert_eq!(counts.finished.get(), 1);
    assert_eq!(counts.polling.get(), 3);
}

#[test]
fn test_stop_before_first_tick_finishes_immediately() {
    let mut cpu = setup_cpu(ProcessorLevel::Nmos6502);
    let counts = count_events(&mut cpu);
    cpu.set_proceed(false);
    let (mut scheduler, _clock) = setup_scheduler();

    let report = scheduler.tick(&mut cpu).unwrap();

    assert!(report.finished);
    assert_eq!(report.executed_cycles, 0);
    assert_eq!(counts.finished.get(), 1);
}

#[test]
fn test_fatal_error_finishes_and_propagates() {
    let mut cpu = setup_cpu(ProcessorLevel::Nmos6502);
    cpu.memory_mut().poke(0x0204, 0x02);
    let counts = count_events(&mut cpu);
    let (mut scheduler, _clock) = setup_scheduler();

    let error = scheduler.run(&mut cpu).unwrap_err();

    assert_eq!(
        error,
        ExecutionError::IllegalInstruction {
            address: 0x0204,
            opcode: 0x02,
            cycles: 8,
        }
    );
    assert_eq!(scheduler.state(), SchedulerState::Finished);
    assert_eq!(counts.finished.get(), 1);
}

// ========== Statistics ==========

#[test]
fn test_elapsed_is_frozen_after_finish() {
    let mut cpu = setup_cpu(ProcessorLevel::Nmos6502);
    cpu.set_proceed(false);
    let (mut scheduler, clock) = setup_scheduler();
    clock.advance(Duration::from_millis(5));

    scheduler.tick(&mut cpu).unwrap();
    clock.advance(Duration::from_secs(1));

    assert_eq!(scheduler.elapsed(), Duration::ZERO);
    assert_eq!(scheduler.summary(&cpu).effective_speed_mhz(), 0.0);
}

#[test]
fn test_effective_speed() {
    let mut cpu = setup_cpu(ProcessorLevel::Nmos6502);
    let (mut scheduler, clock) = setup_scheduler();

    scheduler.tick(&mut cpu).unwrap();
    clock.advance(Duration::from_millis(10));
    scheduler.tick(&mut cpu).unwrap();
    clock.advance(Duration::from_millis(10));

    let summary = scheduler.summary(&cpu);
    assert_eq!(summary.cycles, 20_000);
    assert_eq!(summary.elapsed, Duration::from_millis(20));
    assert!((summary.effective_speed_mhz() - 1.0).abs() < 1e-9);
}
