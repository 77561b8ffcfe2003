//! # Controller
//!
//! Builds a runnable machine from a [`Configuration`]: CPU and memory at the
//! configured level, images loaded, PC set for the boot mode, and the observers
//! that implement stop conditions, console I/O and tracing.
//!
//! Keyboard input reaches a running program through [`Controller::input_sender`]:
//! bytes sent from any thread are queued and placed at the input address one
//! at a time, between scheduler ticks, whenever the program has consumed the
//! previous one. Ctrl-C (`$03`) stops the run instead.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Write;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::config::Configuration;
use crate::cpu::Registers;
use crate::events::{BusObserver, ExecutionObserver, RunFlag};
use crate::memory::BusAccess;
use crate::scheduler::{RunSummary, Scheduler, SystemClock, TimeSource};
use crate::{Error, ExecutionError, InstructionTable, Memory, CPU};

/// Load address of a BBC Micro OS ROM.
pub const BBC_OS_ROM_ADDRESS: u16 = 0xC000;
/// Load address of a BBC Micro language ROM.
pub const BBC_LANGUAGE_ROM_ADDRESS: u16 = 0x8000;
/// Input byte that stops the run.
pub const INTERRUPT_KEY: u8 = 0x03;

/// A configured CPU, memory and scheduler.
pub struct Controller<T: TimeSource = SystemClock> {
    cpu: CPU<Memory>,
    scheduler: Scheduler<T>,
    input: KeyboardQueue,
}

impl Controller<SystemClock> {
    /// Configures a controller paced by the host clock. Console output is
    /// written to `output`.
    pub fn configure(config: &Configuration, debug: bool, output: Box<dyn Write>) -> Result<Self, Error> {
        Self::with_clock(config, debug, output, SystemClock::new())
    }
}

impl<T: TimeSource> Controller<T> {
    /// Configures a controller paced by `clock`.
    pub fn with_clock(config: &Configuration, debug: bool, output: Box<dyn Write>, clock: T) -> Result<Self, Error> {
        let pacing = config.pacing()?;
        let mut cpu = CPU::new(config.cpu.level, Memory::new())?;
        cpu.initialise();

        if let (Some(os), Some(language)) = (config.bbc.os.path(), config.bbc.language.path()) {
            cpu.memory_mut().load_rom(os, BBC_OS_ROM_ADDRESS)?;
            cpu.memory_mut().load_rom(language, BBC_LANGUAGE_ROM_ADDRESS)?;
        }
        if let Some(path) = config.rom.path() {
            cpu.memory_mut().load_rom(path, config.rom.load_address)?;
        }
        if let Some(path) = config.ram.path() {
            cpu.memory_mut().load_ram(path, config.ram.load_address)?;
        }

        if config.run.reset_start {
            cpu.reset();
            debug!("booting through the reset vector to ${:04X}", cpu.pc());
        } else {
            cpu.start(config.run.start_address);
            debug!("booting at ${:04X}", cpu.pc());
        }

        if config.io.input_address.is_some() || config.io.output_address.is_some() {
            cpu.memory_mut().add_observer(Box::new(ConsoleIo {
                input_address: config.io.input_address,
                output_address: config.io.output_address,
                vdu_emulation: config.bbc.vdu_emulation,
                output,
            }));
        }
        cpu.memory_mut().add_observer(Box::new(WriteProtectionMonitor));

        if config.diagnostics(debug).disassemble {
            InstructionTrace::install(&mut cpu, Box::new(|line: String| trace!("{line}")));
        }
        let stop_conditions = StopConditions {
            stop_address: config.stop_address(),
            stop_when_loop_detected: config.run.stop_when_loop_detected,
            break_instruction: config.run.stop_break.then_some(config.run.break_instruction),
            previous_address: None,
            run_flag: cpu.run_flag(),
        };
        if stop_conditions.is_active() {
            cpu.add_observer(Box::new(stop_conditions));
        }

        Ok(Self {
            cpu,
            scheduler: Scheduler::new(pacing, clock),
            input: KeyboardQueue::new(config.io.input_address),
        })
    }

    /// Runs until a stop condition clears `proceed`, the interrupt key
    /// arrives, or execution faults.
    pub fn run(&mut self) -> Result<RunSummary, ExecutionError> {
        let Self { cpu, scheduler, input } = self;
        scheduler.run_with(cpu, |cpu| input.deliver(cpu))
    }

    /// A handle for feeding keyboard bytes to the program while it runs. It
    /// can be moved to another thread.
    pub fn input_sender(&self) -> Sender<u8> {
        self.input.sender.clone()
    }

    /// Places a byte at the input address immediately, overwriting any byte
    /// the program has not yet read. Returns false when no input address is
    /// configured.
    pub fn send_input(&mut self, byte: u8) -> bool {
        match self.input.address {
            Some(address) => {
                self.cpu.memory_mut().set_byte(address, byte);
                true
            }
            None => false,
        }
    }

    /// Handle for stopping the run from outside an observer.
    pub fn run_flag(&self) -> RunFlag {
        self.cpu.run_flag()
    }

    pub fn cpu(&self) -> &CPU<Memory> {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut CPU<Memory> {
        &mut self.cpu
    }

    pub fn scheduler(&self) -> &Scheduler<T> {
        &self.scheduler
    }
}

/// Bytes from [`Controller::input_sender`] waiting for the program.
struct KeyboardQueue {
    address: Option<u16>,
    sender: Sender<u8>,
    receiver: Receiver<u8>,
    pending: VecDeque<u8>,
}

impl KeyboardQueue {
    fn new(address: Option<u16>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            address,
            sender,
            receiver,
            pending: VecDeque::new(),
        }
    }

    /// Moves at most one byte into an empty input cell. Without an input
    /// address only the interrupt key has an effect.
    fn deliver(&mut self, cpu: &mut CPU<Memory>) {
        self.pending.extend(self.receiver.try_iter());
        if self.pending.contains(&INTERRUPT_KEY) {
            debug!("interrupt key received");
            self.pending.clear();
            cpu.run_flag().stop();
            return;
        }

        let Some(address) = self.address else {
            self.pending.clear();
            return;
        };
        if cpu.memory().peek(address) != 0 {
            return;
        }
        if let Some(byte) = self.pending.pop_front() {
            debug!("input byte ${byte:02X} delivered");
            cpu.memory_mut().set_byte(address, byte);
        }
    }
}

/// Clears `proceed` at a stop address, on a tight loop, or on a break opcode.
struct StopConditions {
    stop_address: Option<u16>,
    stop_when_loop_detected: bool,
    break_instruction: Option<u8>,
    previous_address: Option<u16>,
    run_flag: RunFlag,
}

impl StopConditions {
    fn is_active(&self) -> bool {
        self.stop_address.is_some() || self.stop_when_loop_detected || self.break_instruction.is_some()
    }
}

impl ExecutionObserver for StopConditions {
    fn executing_instruction(&mut self, _registers: &Registers, address: u16, opcode: u8) {
        if self.stop_address == Some(address) {
            debug!("stop address ${address:04X} reached");
            self.run_flag.stop();
        }
        if self.stop_when_loop_detected {
            if self.previous_address == Some(address) {
                debug!("loop detected at ${address:04X}");
                self.run_flag.stop();
            }
            self.previous_address = Some(address);
        }
        if self.break_instruction == Some(opcode) {
            debug!("break instruction ${opcode:02X} at ${address:04X}");
            self.run_flag.stop();
        }
    }
}

/// Memory-mapped console: bytes written to the output address are printed and
/// non-zero bytes read from the input address are consumed.
struct ConsoleIo {
    input_address: Option<u16>,
    output_address: Option<u16>,
    vdu_emulation: bool,
    output: Box<dyn Write>,
}

impl ConsoleIo {
    /// With VDU emulation only line endings and printable bytes reach the console.
    fn is_printed(&self, value: u8) -> bool {
        !self.vdu_emulation || matches!(value, 10 | 13) || (value >= 32 && value != 127)
    }
}

impl BusObserver for ConsoleIo {
    fn reading_byte(&mut self, bus: &mut BusAccess<'_>, address: u16, value: u8) {
        if self.input_address == Some(address) && value != 0 {
            debug!("input byte ${value:02X} consumed");
            bus.set(address, 0);
        }
    }

    fn writing_byte(&mut self, address: u16, value: u8) {
        if self.output_address != Some(address) || !self.is_printed(value) {
            return;
        }
        if let Err(e) = self.output.write_all(&[value]).and_then(|_| self.output.flush()) {
            warn!("console output failed: {e}");
        }
    }
}

struct WriteProtectionMonitor;

impl BusObserver for WriteProtectionMonitor {
    fn invalid_write_attempt(&mut self, address: u16, value: u8) {
        warn!("rejected write of ${value:02X} to locked address ${address:04X}");
    }
}

/// The instruction being traced, completed as its operand bytes are fetched.
struct PendingTrace {
    state: String,
    address: u16,
    opcode: u8,
    operand_bytes: Vec<u8>,
    operand_length: usize,
}

type SharedTrace = Rc<RefCell<Option<PendingTrace>>>;

/// Logs one trace line per instruction:
/// `[cycles] PC=F000:P=--R--I--, A=00, X=80, Y=00, S=FF<TAB>A9 2A<TAB>LDA #$2A`.
///
/// Registers are captured before the instruction runs. The line is written
/// once the instruction completes, when its operand bytes have been read.
struct InstructionTrace {
    instructions: Arc<InstructionTable>,
    pending: SharedTrace,
    emit: Box<dyn FnMut(String)>,
}

impl InstructionTrace {
    fn install(cpu: &mut CPU<Memory>, emit: Box<dyn FnMut(String)>) {
        let pending = SharedTrace::default();
        cpu.memory_mut().add_observer(Box::new(OperandCapture {
            pending: Rc::clone(&pending),
        }));
        cpu.add_observer(Box::new(InstructionTrace {
            instructions: Arc::clone(cpu.instructions()),
            pending,
            emit,
        }));
    }
}

impl ExecutionObserver for InstructionTrace {
    fn executing_instruction(&mut self, registers: &Registers, address: u16, opcode: u8) {
        let state = format!(
            "[{:>9}] PC={:04X}:P={}, A={:02X}, X={:02X}, Y={:02X}, S={:02X}",
            registers.cycles, address, registers.p, registers.a, registers.x, registers.y, registers.s
        );
        *self.pending.borrow_mut() = Some(PendingTrace {
            state,
            address,
            opcode,
            operand_bytes: Vec::with_capacity(2),
            operand_length: self.instructions.get(opcode).mode.operand_bytes() as usize,
        });
    }

    fn executed_instruction(&mut self, _registers: &Registers, _address: u16, _opcode: u8) {
        let Some(line) = self.pending.borrow_mut().take() else {
            return;
        };
        let instruction = self.instructions.get(line.opcode);
        let bytes: Vec<String> = std::iter::once(line.opcode)
            .chain(line.operand_bytes.iter().copied())
            .map(|byte| format!("{byte:02X}"))
            .collect();
        let operand = instruction.mode.format_operand(&line.operand_bytes, line.address);
        let text = format!("{}\t{}\t{} {}", line.state, bytes.join(" "), instruction.mnemonic, operand);
        (self.emit)(text.trim_end().to_string());
    }
}

/// Records the operand bytes of the traced instruction as the CPU fetches them.
struct OperandCapture {
    pending: SharedTrace,
}

impl BusObserver for OperandCapture {
    fn reading_byte(&mut self, _bus: &mut BusAccess<'_>, address: u16, value: u8) {
        if let Some(line) = self.pending.borrow_mut().as_mut() {
            let collected = line.operand_bytes.len();
            let expected = line.address.wrapping_add(1 + collected as u16);
            if collected < line.operand_length && address == expected {
                line.operand_bytes.push(value);
            }
        }
    }
}
