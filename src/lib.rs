//! # 6502 Family CPU Emulator
//!
//! A cycle-accurate emulator for the NMOS 6502, the 65SC02 and the 65C02,
//! paced in real time against a host clock.
//!
//! This crate provides:
//!
//! - a [`CPU`] generic over a [`MemoryBus`], with per-level [`InstructionTable`]s
//! - [`Memory`]: 64 KiB with write protection, image loading and bus notifications
//! - a [`Scheduler`] that grants cycle budgets per poll interval and catches up
//!   after host stalls
//! - a JSON [`Configuration`] and a [`Controller`] that wires everything up
//!
//! ## Quick Start
//!
//! ```rust
//! use sim6502::{Memory, MemoryBus, ProcessorLevel, CPU};
//!
//! let mut memory = Memory::new();
//! memory.write(0xFFFC, 0x00); // reset vector low byte
//! memory.write(0xFFFD, 0x80); // reset vector high byte
//! memory.write(0x8000, 0x38); // SEC
//! memory.write(0x8001, 0x69); // ADC #$01
//! memory.write(0x8002, 0x01);
//!
//! let mut cpu = CPU::new(ProcessorLevel::Cmos65C02, memory).unwrap();
//! cpu.reset();
//! cpu.set_a(0xFF);
//! cpu.step().unwrap();
//! cpu.step().unwrap();
//!
//! assert_eq!(cpu.a(), 0x01);
//! assert!(cpu.flag_c());
//! ```
//!
//! ## Modules
//!
//! - `cpu` - CPU state and the fetch-decode-execute step
//! - `opcodes` - instruction descriptors and per-level tables
//! - `addressing` - addressing modes and effective-address resolution
//! - `memory` - MemoryBus trait and the lockable [`Memory`]
//! - `events` - observer traits and the shared `proceed` flag
//! - `scheduler` - real-time pacing
//! - `config` / `controller` - configuration file and run setup

pub mod addressing;
pub mod config;
pub mod controller;
pub mod cpu;
pub mod events;
pub mod level;
pub mod memory;
pub mod opcodes;
pub mod scheduler;
pub mod status;

// Internal instruction implementations (not part of public API)
mod instructions;

use thiserror::Error;

// Re-export public API
pub use addressing::AddressingMode;
pub use config::{ConfigError, Configuration};
pub use controller::Controller;
pub use cpu::{Registers, CPU};
pub use events::{BusObserver, ExecutionObserver, RunFlag};
pub use level::ProcessorLevel;
pub use memory::{BusAccess, Memory, MemoryBus, MemoryError};
pub use opcodes::{Instruction, InstructionTable, Operation, TableError};
pub use scheduler::{
    ManualClock, PacingConfig, RunSummary, Scheduler, SchedulerState, SystemClock, TickReport, TimeSource,
};
pub use status::StatusRegister;

/// Fatal errors raised while executing instructions.
///
/// Both variants carry the opcode's address and the cycle count at the time of
/// the fault for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// An undefined opcode was executed on the NMOS 6502.
    #[error("illegal instruction ${opcode:02X} at ${address:04X} (cycle {cycles})")]
    IllegalInstruction { address: u16, opcode: u8, cycles: u64 },

    /// A defined instruction the emulator does not support (WAI, STP).
    #[error("{mnemonic} (${opcode:02X}) at ${address:04X} is not implemented (cycle {cycles})")]
    NotImplemented {
        mnemonic: &'static str,
        address: u16,
        opcode: u8,
        cycles: u64,
    },
}

/// Any error the crate can produce.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
