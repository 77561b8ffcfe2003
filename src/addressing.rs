//! # Addressing Modes
//!
//! This module defines the addressing modes of the 6502 family and the CPU-side
//! resolvers that turn operand bytes into effective addresses.
//!
//! Resolvers fetch operand bytes from PC (advancing it) and, for indexed read
//! accesses, charge the one-cycle page-crossing penalty. Write and
//! read-modify-write accesses never pay the penalty; their base cycle count in
//! the instruction table already includes the extra cycle.

use crate::{MemoryBus, CPU};

/// 6502 family addressing mode.
///
/// # Operand Sizes
///
/// - **0 bytes**: Implied, Accumulator
/// - **1 byte**: Immediate, Relative, ZeroPage, ZeroPageX, ZeroPageY, ZeroPageIndirect,
///   IndexedIndirect, IndirectIndexed
/// - **2 bytes**: Absolute, AbsoluteX, AbsoluteY, Indirect, AbsoluteIndexedIndirect,
///   ZeroPageRelative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    /// Opcode slot with no instruction defined.
    Illegal,

    /// No operand. Examples: CLC, RTS, NOP
    Implied,

    /// Operates on the accumulator. Example: ASL A
    Accumulator,

    /// 8-bit constant. Example: LDA #$10
    Immediate,

    /// Signed 8-bit displacement from the next instruction. Example: BEQ label
    Relative,

    /// Address in page zero. Example: LDA $80
    ZeroPage,

    /// Page-zero address plus X, wrapping within page zero. Example: LDA $80,X
    ZeroPageX,

    /// Page-zero address plus Y, wrapping within page zero. Example: LDX $80,Y
    ZeroPageY,

    /// Pointer held in page zero (65SC02 and later). Example: LDA ($40)
    ZeroPageIndirect,

    /// Full 16-bit address. Example: JMP $1234
    Absolute,

    /// 16-bit address plus X. Reads pay +1 cycle on a page crossing.
    AbsoluteX,

    /// 16-bit address plus Y. Reads pay +1 cycle on a page crossing.
    AbsoluteY,

    /// Pointer at a 16-bit address plus X (65SC02 and later). Example: JMP ($1234,X)
    AbsoluteIndexedIndirect,

    /// Pointer at a 16-bit address. Only used by JMP.
    Indirect,

    /// `(zp,X)`: X is added to the page-zero operand, then dereferenced.
    IndexedIndirect,

    /// `(zp),Y`: page-zero pointer dereferenced, then Y added.
    /// Reads pay +1 cycle on a page crossing.
    IndirectIndexed,

    /// Page-zero address followed by a branch displacement. Used by BBR/BBS.
    ZeroPageRelative,
}

impl AddressingMode {
    /// Number of operand bytes that follow the opcode.
    pub fn operand_bytes(self) -> u16 {
        use AddressingMode::*;
        match self {
            Illegal | Implied | Accumulator => 0,
            Immediate | Relative | ZeroPage | ZeroPageX | ZeroPageY | ZeroPageIndirect
            | IndexedIndirect | IndirectIndexed => 1,
            Absolute | AbsoluteX | AbsoluteY | AbsoluteIndexedIndirect | Indirect
            | ZeroPageRelative => 2,
        }
    }

    /// Renders an operand in assembler syntax. `bytes` are the operand bytes
    /// following the opcode at `address`; missing bytes read as zero.
    ///
    /// ```
    /// use sim6502::AddressingMode;
    ///
    /// assert_eq!(AddressingMode::Immediate.format_operand(&[0x2A], 0x8000), "#$2A");
    /// assert_eq!(AddressingMode::AbsoluteX.format_operand(&[0x34, 0x12], 0x8000), "$1234,X");
    /// assert_eq!(AddressingMode::Relative.format_operand(&[0xFE], 0x8000), "$8000");
    /// ```
    pub fn format_operand(self, bytes: &[u8], address: u16) -> String {
        use AddressingMode::*;
        let byte = |i: usize| bytes.get(i).copied().unwrap_or(0);
        let word = u16::from_le_bytes([byte(0), byte(1)]);
        let next = address.wrapping_add(1 + self.operand_bytes());
        let branch_target = |displacement: u8| next.wrapping_add(displacement as i8 as u16);
        match self {
            Illegal | Implied => String::new(),
            Accumulator => "A".to_string(),
            Immediate => format!("#${:02X}", byte(0)),
            Relative => format!("${:04X}", branch_target(byte(0))),
            ZeroPage => format!("${:02X}", byte(0)),
            ZeroPageX => format!("${:02X},X", byte(0)),
            ZeroPageY => format!("${:02X},Y", byte(0)),
            ZeroPageIndirect => format!("(${:02X})", byte(0)),
            Absolute => format!("${word:04X}"),
            AbsoluteX => format!("${word:04X},X"),
            AbsoluteY => format!("${word:04X},Y"),
            AbsoluteIndexedIndirect => format!("(${word:04X},X)"),
            Indirect => format!("(${word:04X})"),
            IndexedIndirect => format!("(${:02X},X)", byte(0)),
            IndirectIndexed => format!("(${:02X}),Y", byte(0)),
            ZeroPageRelative => format!("${:02X},${:04X}", byte(0), branch_target(byte(1))),
        }
    }
}

/// How an instruction uses its effective address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Read,
    Write,
}

impl<M: MemoryBus> CPU<M> {
    /// Reads the byte at PC and advances PC.
    pub(crate) fn fetch_byte(&mut self) -> u8 {
        let value = self.memory.read(self.registers.pc);
        self.registers.pc = self.registers.pc.wrapping_add(1);
        value
    }

    /// Reads a little-endian word at PC and advances PC by two.
    pub(crate) fn fetch_word(&mut self) -> u16 {
        let low = self.fetch_byte() as u16;
        let high = self.fetch_byte() as u16;
        (high << 8) | low
    }

    /// Reads a little-endian word from `address` and `address + 1`.
    pub(crate) fn get_word(&mut self, address: u16) -> u16 {
        let low = self.memory.read(address) as u16;
        let high = self.memory.read(address.wrapping_add(1)) as u16;
        (high << 8) | low
    }

    /// Reads a pointer from page zero; the high byte of `$FF` comes from `$00`.
    pub(crate) fn get_zero_page_word(&mut self, address: u8) -> u16 {
        let low = self.memory.read(address as u16) as u16;
        let high = self.memory.read(address.wrapping_add(1) as u16) as u16;
        (high << 8) | low
    }

    /// Adds `index` to `base`, charging a cycle for reads that cross a page.
    fn indexed(&mut self, base: u16, index: u8, access: Access) -> u16 {
        let address = base.wrapping_add(index as u16);
        if access == Access::Read && (address & 0xFF00) != (base & 0xFF00) {
            self.registers.cycles += 1;
        }
        address
    }

    /// Fetches the operand bytes for `mode` and returns the effective address.
    ///
    /// Only meaningful for modes that address memory; the others return 0.
    pub(crate) fn effective_address(&mut self, mode: AddressingMode, access: Access) -> u16 {
        use AddressingMode::*;
        match mode {
            ZeroPage => self.fetch_byte() as u16,
            ZeroPageX => self.fetch_byte().wrapping_add(self.registers.x) as u16,
            ZeroPageY => self.fetch_byte().wrapping_add(self.registers.y) as u16,
            ZeroPageIndirect => {
                let pointer = self.fetch_byte();
                self.get_zero_page_word(pointer)
            }
            Absolute => self.fetch_word(),
            AbsoluteX => {
                let base = self.fetch_word();
                self.indexed(base, self.registers.x, access)
            }
            AbsoluteY => {
                let base = self.fetch_word();
                self.indexed(base, self.registers.y, access)
            }
            AbsoluteIndexedIndirect => {
                let pointer = self.fetch_word().wrapping_add(self.registers.x as u16);
                self.get_word(pointer)
            }
            Indirect => {
                let pointer = self.fetch_word();
                if self.level == crate::ProcessorLevel::Nmos6502 && pointer & 0x00FF == 0x00FF {
                    // NMOS fetches the high byte from the start of the same page.
                    let low = self.memory.read(pointer) as u16;
                    let high = self.memory.read(pointer & 0xFF00) as u16;
                    (high << 8) | low
                } else {
                    self.get_word(pointer)
                }
            }
            IndexedIndirect => {
                let pointer = self.fetch_byte().wrapping_add(self.registers.x);
                self.get_zero_page_word(pointer)
            }
            IndirectIndexed => {
                let pointer = self.fetch_byte();
                let base = self.get_zero_page_word(pointer);
                self.indexed(base, self.registers.y, access)
            }
            Illegal | Implied | Accumulator | Immediate | Relative | ZeroPageRelative => 0,
        }
    }

    /// Returns the operand value for a read instruction.
    pub(crate) fn read_operand(&mut self, mode: AddressingMode) -> u8 {
        match mode {
            AddressingMode::Immediate => self.fetch_byte(),
            AddressingMode::Accumulator => self.registers.a,
            _ => {
                let address = self.effective_address(mode, Access::Read);
                self.memory.read(address)
            }
        }
    }

    /// Stores `value` at the effective address of a write instruction.
    pub(crate) fn write_operand(&mut self, mode: AddressingMode, value: u8) {
        let address = self.effective_address(mode, Access::Write);
        self.memory.write(address, value);
    }

    /// Read-modify-write on the accumulator or a memory operand.
    pub(crate) fn modify_operand(&mut self, mode: AddressingMode, f: impl FnOnce(&mut Self, u8) -> u8) {
        if mode == AddressingMode::Accumulator {
            let value = self.registers.a;
            let result = f(self, value);
            self.registers.a = result;
        } else {
            let address = self.effective_address(mode, Access::Write);
            let value = self.memory.read(address);
            let result = f(self, value);
            self.memory.write(address, result);
        }
    }
}
