//! # Notifications
//!
//! Observers receive synchronous, ordered callbacks from the CPU, the scheduler
//! and the memory bus. Every callback runs to completion on the emulation thread
//! before the next instruction starts, so an observer always sees a consistent
//! machine.
//!
//! The only way an observer can stop a run is to clear the shared [`RunFlag`].
//! The scheduler checks it between instructions, never in the middle of one.

use std::cell::Cell;
use std::rc::Rc;

use crate::cpu::Registers;
use crate::memory::BusAccess;

/// The `proceed` flag: cleared to request that execution stops.
///
/// Clones share the same flag, so an observer can hold one and stop the CPU
/// that notifies it.
///
/// ```
/// use sim6502::RunFlag;
///
/// let flag = RunFlag::new();
/// let handle = flag.clone();
/// handle.stop();
/// assert!(!flag.proceed());
/// ```
#[derive(Debug, Clone)]
pub struct RunFlag(Rc<Cell<bool>>);

impl RunFlag {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn proceed(&self) -> bool {
        self.0.get()
    }

    pub fn set(&self, proceed: bool) {
        self.0.set(proceed);
    }

    pub fn stop(&self) {
        self.set(false);
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Callbacks raised by the CPU and the scheduler.
///
/// All methods default to doing nothing.
pub trait ExecutionObserver {
    /// The scheduler has started running.
    fn starting(&mut self) {}

    /// Execution has stopped. Raised exactly once per run.
    fn finished(&mut self) {}

    /// A scheduler tick is about to grant a new cycle budget.
    fn polling(&mut self) {}

    /// An opcode has been fetched from `address` and is about to run.
    /// `registers.pc` already points past the opcode byte.
    fn executing_instruction(&mut self, _registers: &Registers, _address: u16, _opcode: u8) {}

    /// The instruction fetched from `address` has completed.
    fn executed_instruction(&mut self, _registers: &Registers, _address: u16, _opcode: u8) {}
}

/// Callbacks raised by [`Memory`](crate::Memory) on every bus access.
pub trait BusObserver {
    /// A byte has been read. `bus` allows the observer to react in place,
    /// e.g. an input port clearing itself once consumed.
    fn reading_byte(&mut self, _bus: &mut BusAccess<'_>, _address: u16, _value: u8) {}

    /// A byte has been stored.
    fn writing_byte(&mut self, _address: u16, _value: u8) {}

    /// A write to a locked address was rejected; memory is unchanged.
    fn invalid_write_attempt(&mut self, _address: u16, _value: u8) {}
}

/// Registry of execution observers, notified in registration order.
#[derive(Default)]
pub struct Observers {
    observers: Vec<Box<dyn ExecutionObserver>>,
}

impl Observers {
    pub fn add(&mut self, observer: Box<dyn ExecutionObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn starting(&mut self) {
        for observer in &mut self.observers {
            observer.starting();
        }
    }

    pub fn finished(&mut self) {
        for observer in &mut self.observers {
            observer.finished();
        }
    }

    pub fn polling(&mut self) {
        for observer in &mut self.observers {
            observer.polling();
        }
    }

    pub(crate) fn executing_instruction(&mut self, registers: &Registers, address: u16, opcode: u8) {
        for observer in &mut self.observers {
            observer.executing_instruction(registers, address, opcode);
        }
    }

    pub(crate) fn executed_instruction(&mut self, registers: &Registers, address: u16, opcode: u8) {
        for observer in &mut self.observers {
            observer.executed_instruction(registers, address, opcode);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers").field("count", &self.observers.len()).finish()
    }
}
