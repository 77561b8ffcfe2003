//! # CPU State and Execution
//!
//! This module contains the CPU struct and the fetch-decode-execute step.
//!
//! ## CPU State
//!
//! - **Registers**: A, X, Y, stack pointer S, program counter PC, status P
//! - **Cycle counter**: monotonically increasing `u64`
//! - **Instruction table**: shared, immutable, fixed for the CPU's [`ProcessorLevel`]
//! - **Observers** and the shared `proceed` [`RunFlag`]
//!
//! ## Execution Model
//!
//! [`CPU::step`] executes exactly one instruction:
//!
//! 1. fetch the opcode at PC and notify `executing_instruction`
//! 2. run the instruction's semantics (operand fetch, page-crossing and branch penalties)
//! 3. add the instruction's base cycles
//! 4. notify `executed_instruction`
//!
//! Illegal opcodes are fatal on the NMOS 6502 and execute as one-byte NOPs on
//! the 65SC02 and 65C02.

use std::sync::Arc;

use crate::events::{ExecutionObserver, Observers, RunFlag};
use crate::instructions::{alu, bits, branches, control, flags, inc_dec, load_store, shifts, stack, transfer};
use crate::opcodes::{Instruction, InstructionTable, Operation, TableError};
use crate::status::StatusRegister;
use crate::{ExecutionError, MemoryBus, ProcessorLevel};

/// IRQ and BRK vector.
pub const IRQ_VECTOR: u16 = 0xFFFE;
/// Reset vector.
pub const RESET_VECTOR: u16 = 0xFFFC;
/// NMI vector.
pub const NMI_VECTOR: u16 = 0xFFFA;
/// Base address of the hardware stack page.
pub const STACK_PAGE: u16 = 0x0100;

/// Cycles taken to enter an interrupt handler.
const INTERRUPT_CYCLES: u64 = 7;

/// Programmer-visible processor state plus the cycle counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    /// Program counter (address of next instruction)
    pub pc: u16,

    /// Accumulator register
    pub a: u8,

    /// X index register
    pub x: u8,

    /// Y index register
    pub y: u8,

    /// Stack pointer, an offset into page one.
    pub s: u8,

    /// Processor status flags
    pub p: StatusRegister,

    /// Total cycles executed since power-on
    pub cycles: u64,
}

impl Registers {
    /// State after [`CPU::initialise`].
    pub fn power_on() -> Self {
        Self {
            pc: 0x0000,
            a: 0x00,
            x: 0x80,
            y: 0x00,
            s: 0xFF,
            p: StatusRegister::power_on(),
            cycles: 0,
        }
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::power_on()
    }
}

/// 6502 family CPU, generic over its memory bus.
///
/// # Examples
///
/// ```
/// use sim6502::{Memory, MemoryBus, ProcessorLevel, CPU};
///
/// let mut memory = Memory::new();
/// memory.write(0xFFFC, 0x00);
/// memory.write(0xFFFD, 0x80);
/// memory.write(0x8000, 0xA9); // LDA #$2A
/// memory.write(0x8001, 0x2A);
///
/// let mut cpu = CPU::new(ProcessorLevel::Nmos6502, memory).unwrap();
/// cpu.reset();
/// cpu.step().unwrap();
///
/// assert_eq!(cpu.a(), 0x2A);
/// assert_eq!(cpu.pc(), 0x8002);
/// assert_eq!(cpu.cycles(), 2);
/// ```
pub struct CPU<M: MemoryBus> {
    pub(crate) level: ProcessorLevel,
    pub(crate) instructions: Arc<InstructionTable>,
    pub(crate) registers: Registers,
    pub(crate) memory: M,
    pub(crate) observers: Observers,
    pub(crate) run_flag: RunFlag,
}

impl<M: MemoryBus> CPU<M> {
    /// Creates a CPU at `level`, building its instruction table.
    ///
    /// Registers start in the power-on state (PC = 0). Memory is left as given;
    /// call [`reset`](Self::reset) or [`start`](Self::start) to set PC.
    pub fn new(level: ProcessorLevel, memory: M) -> Result<Self, TableError> {
        let table = InstructionTable::build(level)?;
        Ok(Self::with_table(Arc::new(table), memory))
    }

    /// Creates a CPU that shares an already built instruction table.
    pub fn with_table(instructions: Arc<InstructionTable>, memory: M) -> Self {
        Self {
            level: instructions.level(),
            instructions,
            registers: Registers::power_on(),
            memory,
            observers: Observers::default(),
            run_flag: RunFlag::new(),
        }
    }

    /// Returns registers, cycle count and memory to the power-on state.
    pub fn initialise(&mut self) {
        self.registers = Registers::power_on();
        self.memory.initialise();
    }

    /// Loads PC from the reset vector.
    pub fn reset(&mut self) {
        self.registers.pc = self.get_word(RESET_VECTOR);
    }

    /// Sets PC to `address`.
    pub fn start(&mut self, address: u16) {
        self.registers.pc = address;
    }

    /// Enters the IRQ handler. The caller decides whether the interrupt is masked.
    pub fn trigger_irq(&mut self) {
        self.interrupt(IRQ_VECTOR);
    }

    /// Enters the NMI handler.
    pub fn trigger_nmi(&mut self) {
        self.interrupt(NMI_VECTOR);
    }

    fn interrupt(&mut self, vector: u16) {
        self.push_word(self.registers.pc);
        let mut pushed = self.registers.p;
        pushed.break_command = false;
        self.push_byte(pushed.to_byte());
        self.registers.p.interrupt_disable = true;
        self.registers.pc = self.get_word(vector);
        self.registers.cycles += INTERRUPT_CYCLES;
    }

    /// Executes one instruction.
    ///
    /// # Errors
    ///
    /// - [`ExecutionError::IllegalInstruction`] for an undefined opcode on the NMOS 6502
    /// - [`ExecutionError::NotImplemented`] for WAI and STP
    pub fn step(&mut self) -> Result<(), ExecutionError> {
        let address = self.registers.pc;
        let opcode = self.fetch_byte();
        self.observers.executing_instruction(&self.registers, address, opcode);

        let instruction = *self.instructions.get(opcode);
        self.execute(&instruction, address, opcode)?;
        self.registers.cycles += instruction.cycles as u64;

        self.observers.executed_instruction(&self.registers, address, opcode);
        Ok(())
    }

    /// Steps until at least `cycle_budget` cycles have run or `proceed` is cleared.
    /// Returns the cycles actually consumed.
    pub fn run_for_cycles(&mut self, cycle_budget: u64) -> Result<u64, ExecutionError> {
        let start_cycles = self.registers.cycles;
        let target_cycles = start_cycles + cycle_budget;

        while self.registers.cycles < target_cycles && self.run_flag.proceed() {
            self.step()?;
        }

        Ok(self.registers.cycles - start_cycles)
    }

    fn execute(&mut self, instruction: &Instruction, address: u16, opcode: u8) -> Result<(), ExecutionError> {
        use Operation::*;
        let mode = instruction.mode;
        let p = self.registers.p;
        match instruction.operation {
            Adc => alu::execute_adc(self, mode),
            Sbc => alu::execute_sbc(self, mode),
            And => alu::execute_and(self, mode),
            Ora => alu::execute_ora(self, mode),
            Eor => alu::execute_eor(self, mode),
            Cmp => alu::execute_cmp(self, mode),
            Cpx => alu::execute_cpx(self, mode),
            Cpy => alu::execute_cpy(self, mode),
            Bit => alu::execute_bit(self, mode),

            Tsb => bits::execute_tsb(self, mode),
            Trb => bits::execute_trb(self, mode),
            Rmb(bit) => bits::execute_rmb(self, bit),
            Smb(bit) => bits::execute_smb(self, bit),

            Bcc => branches::branch(self, !p.carry),
            Bcs => branches::branch(self, p.carry),
            Bne => branches::branch(self, !p.zero),
            Beq => branches::branch(self, p.zero),
            Bpl => branches::branch(self, !p.negative),
            Bmi => branches::branch(self, p.negative),
            Bvc => branches::branch(self, !p.overflow),
            Bvs => branches::branch(self, p.overflow),
            Bra => branches::branch(self, true),
            Bbr(bit) => branches::execute_bbr(self, bit),
            Bbs(bit) => branches::execute_bbs(self, bit),

            Brk => control::execute_brk(self),
            Jmp => control::execute_jmp(self, mode),
            Jsr => control::execute_jsr(self),
            Rts => control::execute_rts(self),
            Rti => control::execute_rti(self),
            Nop => control::execute_nop(),

            Clc | Sec | Cli | Sei | Cld | Sed | Clv => flags::execute_flag(self, instruction.operation),

            Inc => inc_dec::execute_inc(self, mode),
            Dec => inc_dec::execute_dec(self, mode),
            Inx => inc_dec::execute_inx(self),
            Iny => inc_dec::execute_iny(self),
            Dex => inc_dec::execute_dex(self),
            Dey => inc_dec::execute_dey(self),

            Lda => load_store::execute_lda(self, mode),
            Ldx => load_store::execute_ldx(self, mode),
            Ldy => load_store::execute_ldy(self, mode),
            Sta => load_store::execute_sta(self, mode),
            Stx => load_store::execute_stx(self, mode),
            Sty => load_store::execute_sty(self, mode),
            Stz => load_store::execute_stz(self, mode),

            Asl => shifts::execute_asl(self, mode),
            Lsr => shifts::execute_lsr(self, mode),
            Rol => shifts::execute_rol(self, mode),
            Ror => shifts::execute_ror(self, mode),

            Pha => stack::execute_pha(self),
            Php => stack::execute_php(self),
            Phx => stack::execute_phx(self),
            Phy => stack::execute_phy(self),
            Pla => stack::execute_pla(self),
            Plp => stack::execute_plp(self),
            Plx => stack::execute_plx(self),
            Ply => stack::execute_ply(self),

            Tax => transfer::execute_tax(self),
            Tay => transfer::execute_tay(self),
            Txa => transfer::execute_txa(self),
            Tya => transfer::execute_tya(self),
            Tsx => transfer::execute_tsx(self),
            Txs => transfer::execute_txs(self),

            Wai | Stp => {
                return Err(ExecutionError::NotImplemented {
                    mnemonic: instruction.mnemonic,
                    address,
                    opcode,
                    cycles: self.registers.cycles,
                })
            }
            Illegal => {
                if self.level == ProcessorLevel::Nmos6502 {
                    return Err(ExecutionError::IllegalInstruction {
                        address,
                        opcode,
                        cycles: self.registers.cycles,
                    });
                }
                // Undefined CMOS opcodes are one-byte NOPs costing one extra cycle.
                self.registers.cycles += 1;
            }
        }
        Ok(())
    }

    // ========== Shared Helpers ==========

    /// Sets Z from `value`, and N from bit 7 unless the value is zero.
    pub(crate) fn update_zero_negative_flags(&mut self, value: u8) {
        self.registers.p.zero = value == 0;
        self.registers.p.negative = !self.registers.p.zero && value & 0x80 != 0;
    }

    /// Writes `value` at 0x0100 + SP, then decrements SP.
    pub(crate) fn push_byte(&mut self, value: u8) {
        self.memory.write(STACK_PAGE | self.registers.s as u16, value);
        self.registers.s = self.registers.s.wrapping_sub(1);
    }

    /// Increments SP, then reads 0x0100 + SP.
    pub(crate) fn pop_byte(&mut self) -> u8 {
        self.registers.s = self.registers.s.wrapping_add(1);
        self.memory.read(STACK_PAGE | self.registers.s as u16)
    }

    /// Pushes high byte then low byte.
    pub(crate) fn push_word(&mut self, value: u16) {
        self.push_byte((value >> 8) as u8);
        self.push_byte(value as u8);
    }

    pub(crate) fn pop_word(&mut self) -> u16 {
        let low = self.pop_byte() as u16;
        let high = self.pop_byte() as u16;
        (high << 8) | low
    }

    // ========== Observers ==========

    /// Registers an execution observer.
    pub fn add_observer(&mut self, observer: Box<dyn ExecutionObserver>) {
        self.observers.add(observer);
    }

    /// Execution and bus observers, for installing bus observers directly.
    pub fn observers_mut(&mut self) -> &mut Observers {
        &mut self.observers
    }

    /// Returns a handle to this CPU's `proceed` flag.
    pub fn run_flag(&self) -> RunFlag {
        self.run_flag.clone()
    }

    /// Returns true while the run should continue.
    pub fn proceed(&self) -> bool {
        self.run_flag.proceed()
    }

    /// Sets or clears the `proceed` flag.
    ///
    /// # Arguments
    ///
    /// * `proceed` - `false` stops [`run_for_cycles`](Self::run_for_cycles) after the current instruction
    pub fn set_proceed(&mut self, proceed: bool) {
        self.run_flag.set(proceed);
    }

    // ========== Register Getters ==========

    /// Processor level this CPU was built for.
    pub fn level(&self) -> ProcessorLevel {
        self.level
    }

    /// Shared instruction table for this CPU's level.
    pub fn instructions(&self) -> &Arc<InstructionTable> {
        &self.instructions
    }

    /// Snapshot of all registers and the cycle count.
    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Returns the accumulator.
    ///
    /// # Examples
    ///
    /// ```
    /// use sim6502::{Memory, ProcessorLevel, CPU};
    ///
    /// let cpu = CPU::new(ProcessorLevel::Nmos6502, Memory::new()).unwrap();
    /// assert_eq!(cpu.a(), 0x00); // Power-on value
    /// ```
    pub fn a(&self) -> u8 {
        self.registers.a
    }

    /// Returns the X index register.
    pub fn x(&self) -> u8 {
        self.registers.x
    }

    /// Returns the Y index register.
    pub fn y(&self) -> u8 {
        self.registers.y
    }

    /// Returns the address of the next instruction.
    pub fn pc(&self) -> u16 {
        self.registers.pc
    }

    /// Stack pointer. The full stack address is 0x0100 + SP.
    pub fn sp(&self) -> u8 {
        self.registers.s
    }

    /// Returns the status register as individual flags.
    pub fn p(&self) -> StatusRegister {
        self.registers.p
    }

    /// Status register packed as `NV-BDIZC`.
    pub fn status(&self) -> u8 {
        self.registers.p.to_byte()
    }

    /// Total cycles executed since power-on, including interrupt entry.
    pub fn cycles(&self) -> u64 {
        self.registers.cycles
    }

    // ========== Status Flag Getters ==========

    /// Returns true if the Negative flag is set.
    pub fn flag_n(&self) -> bool {
        self.registers.p.negative
    }

    /// Returns true if the Overflow flag is set.
    pub fn flag_v(&self) -> bool {
        self.registers.p.overflow
    }

    /// Returns true if the Break flag is set.
    pub fn flag_b(&self) -> bool {
        self.registers.p.break_command
    }

    /// Returns true if the Decimal mode flag is set.
    pub fn flag_d(&self) -> bool {
        self.registers.p.decimal
    }

    /// Returns true if the Interrupt Disable flag is set.
    pub fn flag_i(&self) -> bool {
        self.registers.p.interrupt_disable
    }

    /// Returns true if the Zero flag is set.
    pub fn flag_z(&self) -> bool {
        self.registers.p.zero
    }

    /// Returns true if the Carry flag is set.
    pub fn flag_c(&self) -> bool {
        self.registers.p.carry
    }

    /// Returns a reference to the memory bus.
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Returns a mutable reference to the memory bus.
    ///
    /// Writes made through this reference bypass the CPU and its cycle count.
    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    // ========== Register Setters ==========

    /// Sets the accumulator.
    ///
    /// # Arguments
    ///
    /// * `value` - New accumulator value. Flags are not affected.
    pub fn set_a(&mut self, value: u8) {
        self.registers.a = value;
    }

    pub fn set_x(&mut self, value: u8) {
        self.registers.x = value;
    }

    pub fn set_y(&mut self, value: u8) {
        self.registers.y = value;
    }

    /// Sets the program counter. Same as [`start`](Self::start).
    pub fn set_pc(&mut self, value: u16) {
        self.registers.pc = value;
    }

    /// Sets the stack pointer.
    pub fn set_sp(&mut self, value: u8) {
        self.registers.s = value;
    }

    /// Loads the whole status register. The reserved bit is always set.
    ///
    /// # Arguments
    ///
    /// * `value` - Status packed as `NV-BDIZC`
    pub fn set_status(&mut self, value: u8) {
        self.registers.p = StatusRegister::load(value);
    }

    // ========== Status Flag Setters ==========

    pub fn set_flag_n(&mut self, value: bool) {
        self.registers.p.negative = value;
    }

    pub fn set_flag_v(&mut self, value: bool) {
        self.registers.p.overflow = value;
    }

    pub fn set_flag_d(&mut self, value: bool) {
        self.registers.p.decimal = value;
    }

    pub fn set_flag_i(&mut self, value: bool) {
        self.registers.p.interrupt_disable = value;
    }

    pub fn set_flag_z(&mut self, value: bool) {
        self.registers.p.zero = value;
    }

    pub fn set_flag_c(&mut self, value: bool) {
        self.registers.p.carry = value;
    }
}

impl<M: MemoryBus> std::fmt::Debug for CPU<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CPU")
            .field("level", &self.level)
            .field("registers", &self.registers)
            .field("proceed", &self.run_flag.proceed())
            .finish()
    }
}
