//! # Instruction Tables
//!
//! The 256-entry opcode tables for the 6502 family and the layering that builds
//! the table for a given [`ProcessorLevel`].
//!
//! The NMOS 6502 table is the base. A 65SC02 table is the base with the 65SC02
//! overlay applied; a 65C02 table additionally applies the 65C02 overlay. An
//! overlay may only fill slots that are still illegal: redefining an existing
//! instruction is a [`TableError::OverlayConflict`].
//!
//! Tables are plain data (`static` arrays built by a `const fn`), so the same
//! [`InstructionTable`] can be shared by every CPU of one level.

use std::ops::Index;

use thiserror::Error;

use crate::addressing::AddressingMode;
use crate::level::ProcessorLevel;

/// The operation an opcode performs, independent of addressing mode.
///
/// Bit-numbered 65C02 operations carry their bit index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Adc,
    And,
    Asl,
    Bbr(u8),
    Bbs(u8),
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Bra,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Phx,
    Phy,
    Pla,
    Plp,
    Plx,
    Ply,
    Rmb(u8),
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Smb(u8),
    Sta,
    Stp,
    Stx,
    Sty,
    Stz,
    Tax,
    Tay,
    Trb,
    Tsb,
    Tsx,
    Txa,
    Txs,
    Tya,
    Wai,
    /// No instruction defined for this opcode.
    Illegal,
}

/// Descriptor for one opcode slot.
///
/// # Examples
///
/// ```
/// use sim6502::{AddressingMode, InstructionTable, ProcessorLevel};
///
/// let table = InstructionTable::build(ProcessorLevel::Nmos6502).unwrap();
/// let lda = &table[0xA9];
/// assert_eq!(lda.mnemonic, "LDA");
/// assert_eq!(lda.mode, AddressingMode::Immediate);
/// assert_eq!(lda.cycles, 2);
/// assert_eq!(lda.size_bytes(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub operation: Operation,
    pub mode: AddressingMode,
    /// Base cycle cost, before page-crossing and branch penalties.
    pub cycles: u8,
    pub mnemonic: &'static str,
}

impl Instruction {
    /// The placeholder stored in every undefined slot.
    pub const ILLEGAL: Instruction = Instruction {
        operation: Operation::Illegal,
        mode: AddressingMode::Illegal,
        cycles: 0,
        mnemonic: "???",
    };

    pub fn is_illegal(&self) -> bool {
        self.operation == Operation::Illegal
    }

    /// Opcode plus operand bytes.
    pub fn size_bytes(&self) -> u16 {
        1 + self.mode.operand_bytes()
    }
}

/// Errors raised while assembling an instruction table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// An overlay tried to replace an instruction that is already defined.
    #[error("opcode ${opcode:02X}: overlay {replacement} would shadow {existing}")]
    OverlayConflict {
        opcode: u8,
        existing: &'static str,
        replacement: &'static str,
    },
}

/// The decoded instruction set for one processor level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionTable {
    level: ProcessorLevel,
    instructions: [Instruction; 256],
}

impl InstructionTable {
    /// Builds the table for `level` by layering overlays onto the NMOS table.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::OverlayConflict`] if an overlay defines an opcode
    /// that a lower level already defines.
    pub fn build(level: ProcessorLevel) -> Result<Self, TableError> {
        let mut table = Self {
            level: ProcessorLevel::Nmos6502,
            instructions: NMOS6502_INSTRUCTIONS,
        };
        if level >= ProcessorLevel::Cmos65SC02 {
            table.overlay(&CMOS65SC02_OVERLAY)?;
        }
        if level >= ProcessorLevel::Cmos65C02 {
            table.overlay(&CMOS65C02_OVERLAY)?;
        }
        table.level = level;
        Ok(table)
    }

    /// Installs every defined instruction of `overlay` into this table.
    ///
    /// Either the whole overlay is applied or, on conflict, nothing is.
    pub fn overlay(&mut self, overlay: &[Instruction; 256]) -> Result<(), TableError> {
        for (opcode, (current, replacement)) in self.instructions.iter().zip(overlay.iter()).enumerate() {
            if !replacement.is_illegal() && !current.is_illegal() {
                return Err(TableError::OverlayConflict {
                    opcode: opcode as u8,
                    existing: current.mnemonic,
                    replacement: replacement.mnemonic,
                });
            }
        }
        for (slot, replacement) in self.instructions.iter_mut().zip(overlay.iter()) {
            if !replacement.is_illegal() {
                *slot = *replacement;
            }
        }
        Ok(())
    }

    pub fn level(&self) -> ProcessorLevel {
        self.level
    }

    pub fn get(&self, opcode: u8) -> &Instruction {
        &self.instructions[opcode as usize]
    }

    /// Iterates over `(opcode, instruction)` pairs in opcode order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Instruction)> {
        self.instructions.iter().enumerate().map(|(opcode, instruction)| (opcode as u8, instruction))
    }

    /// Number of defined (non-illegal) opcodes.
    pub fn defined_count(&self) -> usize {
        self.instructions.iter().filter(|i| !i.is_illegal()).count()
    }
}

impl Index<u8> for InstructionTable {
    type Output = Instruction;

    fn index(&self, opcode: u8) -> &Instruction {
        self.get(opcode)
    }
}

const fn op(operation: Operation, mnemonic: &'static str, mode: AddressingMode, cycles: u8) -> Instruction {
    Instruction {
        operation,
        mode,
        cycles,
        mnemonic,
    }
}

/// Expands a sparse `(opcode, instruction)` list into a full table.
const fn table(entries: &[(u8, Instruction)]) -> [Instruction; 256] {
    let mut instructions = [Instruction::ILLEGAL; 256];
    let mut i = 0;
    while i < entries.len() {
        instructions[entries[i].0 as usize] = entries[i].1;
        i += 1;
    }
    instructions
}

use AddressingMode::{
    Absolute as Abs, AbsoluteIndexedIndirect as AbsXInd, AbsoluteX as AbsX, AbsoluteY as AbsY,
    Accumulator as Acc, Immediate as Imm, Implied as Imp, IndexedIndirect as IndX, Indirect as Ind,
    IndirectIndexed as IndY, Relative as Rel, ZeroPage as Zp, ZeroPageIndirect as ZpInd,
    ZeroPageRelative as ZpRel, ZeroPageX as ZpX, ZeroPageY as ZpY,
};
use Operation::*;

/// The 151 documented NMOS 6502 opcodes.
pub static NMOS6502_INSTRUCTIONS: [Instruction; 256] = table(&[
    (0x00, op(Brk, "BRK", Imp, 7)),
    (0x01, op(Ora, "ORA", IndX, 6)),
    (0x05, op(Ora, "ORA", Zp, 3)),
    (0x06, op(Asl, "ASL", Zp, 5)),
    (0x08, op(Php, "PHP", Imp, 3)),
    (0x09, op(Ora, "ORA", Imm, 2)),
    (0x0A, op(Asl, "ASL", Acc, 2)),
    (0x0D, op(Ora, "ORA", Abs, 4)),
    (0x0E, op(Asl, "ASL", Abs, 6)),
    (0x10, op(Bpl, "BPL", Rel, 2)),
    (0x11, op(Ora, "ORA", IndY, 5)),
    (0x15, op(Ora, "ORA", ZpX, 4)),
    (0x16, op(Asl, "ASL", ZpX, 6)),
    (0x18, op(Clc, "CLC", Imp, 2)),
    (0x19, op(Ora, "ORA", AbsY, 4)),
    (0x1D, op(Ora, "ORA", AbsX, 4)),
    (0x1E, op(Asl, "ASL", AbsX, 7)),
    (0x20, op(Jsr, "JSR", Abs, 6)),
    (0x21, op(And, "AND", IndX, 6)),
    (0x24, op(Bit, "BIT", Zp, 3)),
    (0x25, op(And, "AND", Zp, 3)),
    (0x26, op(Rol, "ROL", Zp, 5)),
    (0x28, op(Plp, "PLP", Imp, 4)),
    (0x29, op(And, "AND", Imm, 2)),
    (0x2A, op(Rol, "ROL", Acc, 2)),
    (0x2C, op(Bit, "BIT", Abs, 4)),
    (0x2D, op(And, "AND", Abs, 4)),
    (0x2E, op(Rol, "ROL", Abs, 6)),
    (0x30, op(Bmi, "BMI", Rel, 2)),
    (0x31, op(And, "AND", IndY, 5)),
    (0x35, op(And, "AND", ZpX, 4)),
    (0x36, op(Rol, "ROL", ZpX, 6)),
    (0x38, op(Sec, "SEC", Imp, 2)),
    (0x39, op(And, "AND", AbsY, 4)),
    (0x3D, op(And, "AND", AbsX, 4)),
    (0x3E, op(Rol, "ROL", AbsX, 7)),
    (0x40, op(Rti, "RTI", Imp, 6)),
    (0x41, op(Eor, "EOR", IndX, 6)),
    (0x45, op(Eor, "EOR", Zp, 3)),
    (0x46, op(Lsr, "LSR", Zp, 5)),
    (0x48, op(Pha, "PHA", Imp, 3)),
    (0x49, op(Eor, "EOR", Imm, 2)),
    (0x4A, op(Lsr, "LSR", Acc, 2)),
    (0x4C, op(Jmp, "JMP", Abs, 3)),
    (0x4D, op(Eor, "EOR", Abs, 4)),
    (0x4E, op(Lsr, "LSR", Abs, 6)),
    (0x50, op(Bvc, "BVC", Rel, 2)),
    (0x51, op(Eor, "EOR", IndY, 5)),
    (0x55, op(Eor, "EOR", ZpX, 4)),
    (0x56, op(Lsr, "LSR", ZpX, 6)),
    (0x58, op(Cli, "CLI", Imp, 2)),
    (0x59, op(Eor, "EOR", AbsY, 4)),
    (0x5D, op(Eor, "EOR", AbsX, 4)),
    (0x5E, op(Lsr, "LSR", AbsX, 7)),
    (0x60, op(Rts, "RTS", Imp, 6)),
    (0x61, op(Adc, "ADC", IndX, 6)),
    (0x65, op(Adc, "ADC", Zp, 3)),
    (0x66, op(Ror, "ROR", Zp, 5)),
    (0x68, op(Pla, "PLA", Imp, 4)),
    (0x69, op(Adc, "ADC", Imm, 2)),
    (0x6A, op(Ror, "ROR", Acc, 2)),
    (0x6C, op(Jmp, "JMP", Ind, 5)),
    (0x6D, op(Adc, "ADC", Abs, 4)),
    (0x6E, op(Ror, "ROR", Abs, 6)),
    (0x70, op(Bvs, "BVS", Rel, 2)),
    (0x71, op(Adc, "ADC", IndY, 5)),
    (0x75, op(Adc, "ADC", ZpX, 4)),
    (0x76, op(Ror, "ROR", ZpX, 6)),
    (0x78, op(Sei, "SEI", Imp, 2)),
    (0x79, op(Adc, "ADC", AbsY, 4)),
    (0x7D, op(Adc, "ADC", AbsX, 4)),
    (0x7E, op(Ror, "ROR", AbsX, 7)),
    (0x81, op(Sta, "STA", IndX, 6)),
    (0x84, op(Sty, "STY", Zp, 3)),
    (0x85, op(Sta, "STA", Zp, 3)),
    (0x86, op(Stx, "STX", Zp, 3)),
    (0x88, op(Dey, "DEY", Imp, 2)),
    (0x8A, op(Txa, "TXA", Imp, 2)),
    (0x8C, op(Sty, "STY", Abs, 4)),
    (0x8D, op(Sta, "STA", Abs, 4)),
    (0x8E, op(Stx, "STX", Abs, 4)),
    (0x90, op(Bcc, "BCC", Rel, 2)),
    (0x91, op(Sta, "STA", IndY, 6)),
    (0x94, op(Sty, "STY", ZpX, 4)),
    (0x95, op(Sta, "STA", ZpX, 4)),
    (0x96, op(Stx, "STX", ZpY, 4)),
    (0x98, op(Tya, "TYA", Imp, 2)),
    (0x99, op(Sta, "STA", AbsY, 5)),
    (0x9A, op(Txs, "TXS", Imp, 2)),
    (0x9D, op(Sta, "STA", AbsX, 5)),
    (0xA0, op(Ldy, "LDY", Imm, 2)),
    (0xA1, op(Lda, "LDA", IndX, 6)),
    (0xA2, op(Ldx, "LDX", Imm, 2)),
    (0xA4, op(Ldy, "LDY", Zp, 3)),
    (0xA5, op(Lda, "LDA", Zp, 3)),
    (0xA6, op(Ldx, "LDX", Zp, 3)),
    (0xA8, op(Tay, "TAY", Imp, 2)),
    (0xA9, op(Lda, "LDA", Imm, 2)),
    (0xAA, op(Tax, "TAX", Imp, 2)),
    (0xAC, op(Ldy, "LDY", Abs, 4)),
    (0xAD, op(Lda, "LDA", Abs, 4)),
    (0xAE, op(Ldx, "LDX", Abs, 4)),
    (0xB0, op(Bcs, "BCS", Rel, 2)),
    (0xB1, op(Lda, "LDA", IndY, 5)),
    (0xB4, op(Ldy, "LDY", ZpX, 4)),
    (0xB5, op(Lda, "LDA", ZpX, 4)),
    (0xB6, op(Ldx, "LDX", ZpY, 4)),
    (0xB8, op(Clv, "CLV", Imp, 2)),
    (0xB9, op(Lda, "LDA", AbsY, 4)),
    (0xBA, op(Tsx, "TSX", Imp, 2)),
    (0xBC, op(Ldy, "LDY", AbsX, 4)),
    (0xBD, op(Lda, "LDA", AbsX, 4)),
    (0xBE, op(Ldx, "LDX", AbsY, 4)),
    (0xC0, op(Cpy, "CPY", Imm, 2)),
    (0xC1, op(Cmp, "CMP", IndX, 6)),
    (0xC4, op(Cpy, "CPY", Zp, 3)),
    (0xC5, op(Cmp, "CMP", Zp, 3)),
    (0xC6, op(Dec, "DEC", Zp, 5)),
    (0xC8, op(Iny, "INY", Imp, 2)),
    (0xC9, op(Cmp, "CMP", Imm, 2)),
    (0xCA, op(Dex, "DEX", Imp, 2)),
    (0xCC, op(Cpy, "CPY", Abs, 4)),
    (0xCD, op(Cmp, "CMP", Abs, 4)),
    (0xCE, op(Dec, "DEC", Abs, 6)),
    (0xD0, op(Bne, "BNE", Rel, 2)),
    (0xD1, op(Cmp, "CMP", IndY, 5)),
    (0xD5, op(Cmp, "CMP", ZpX, 4)),
    (0xD6, op(Dec, "DEC", ZpX, 6)),
    (0xD8, op(Cld, "CLD", Imp, 2)),
    (0xD9, op(Cmp, "CMP", AbsY, 4)),
    (0xDD, op(Cmp, "CMP", AbsX, 4)),
    (0xDE, op(Dec, "DEC", AbsX, 7)),
    (0xE0, op(Cpx, "CPX", Imm, 2)),
    (0xE1, op(Sbc, "SBC", IndX, 6)),
    (0xE4, op(Cpx, "CPX", Zp, 3)),
    (0xE5, op(Sbc, "SBC", Zp, 3)),
    (0xE6, op(Inc, "INC", Zp, 5)),
    (0xE8, op(Inx, "INX", Imp, 2)),
    (0xE9, op(Sbc, "SBC", Imm, 2)),
    (0xEA, op(Nop, "NOP", Imp, 2)),
    (0xEC, op(Cpx, "CPX", Abs, 4)),
    (0xED, op(Sbc, "SBC", Abs, 4)),
    (0xEE, op(Inc, "INC", Abs, 6)),
    (0xF0, op(Beq, "BEQ", Rel, 2)),
    (0xF1, op(Sbc, "SBC", IndY, 5)),
    (0xF5, op(Sbc, "SBC", ZpX, 4)),
    (0xF6, op(Inc, "INC", ZpX, 6)),
    (0xF8, op(Sed, "SED", Imp, 2)),
    (0xF9, op(Sbc, "SBC", AbsY, 4)),
    (0xFD, op(Sbc, "SBC", AbsX, 4)),
    (0xFE, op(Inc, "INC", AbsX, 7)),
]);

/// Opcodes added by the 65SC02.
pub static CMOS65SC02_OVERLAY: [Instruction; 256] = table(&[
    (0x04, op(Tsb, "TSB", Zp, 5)),
    (0x0C, op(Tsb, "TSB", Abs, 6)),
    (0x12, op(Ora, "ORA", ZpInd, 5)),
    (0x14, op(Trb, "TRB", Zp, 5)),
    (0x1A, op(Inc, "INC", Acc, 2)),
    (0x1C, op(Trb, "TRB", Abs, 6)),
    (0x32, op(And, "AND", ZpInd, 5)),
    (0x34, op(Bit, "BIT", ZpX, 4)),
    (0x3A, op(Dec, "DEC", Acc, 2)),
    (0x3C, op(Bit, "BIT", AbsX, 4)),
    (0x52, op(Eor, "EOR", ZpInd, 5)),
    (0x5A, op(Phy, "PHY", Imp, 3)),
    (0x64, op(Stz, "STZ", Zp, 3)),
    (0x72, op(Adc, "ADC", ZpInd, 5)),
    (0x74, op(Stz, "STZ", ZpX, 4)),
    (0x7A, op(Ply, "PLY", Imp, 4)),
    (0x7C, op(Jmp, "JMP", AbsXInd, 6)),
    (0x80, op(Bra, "BRA", Rel, 2)),
    (0x89, op(Bit, "BIT", Imm, 2)),
    (0x92, op(Sta, "STA", ZpInd, 5)),
    (0x9C, op(Stz, "STZ", Abs, 4)),
    (0x9E, op(Stz, "STZ", AbsX, 5)),
    (0xB2, op(Lda, "LDA", ZpInd, 5)),
    (0xD2, op(Cmp, "CMP", ZpInd, 5)),
    (0xDA, op(Phx, "PHX", Imp, 3)),
    (0xF2, op(Sbc, "SBC", ZpInd, 5)),
    (0xFA, op(Plx, "PLX", Imp, 4)),
]);

/// Opcodes added by the 65C02: the bit instructions plus WAI and STP.
pub static CMOS65C02_OVERLAY: [Instruction; 256] = table(&[
    (0x07, op(Rmb(0), "RMB0", Zp, 5)),
    (0x17, op(Rmb(1), "RMB1", Zp, 5)),
    (0x27, op(Rmb(2), "RMB2", Zp, 5)),
    (0x37, op(Rmb(3), "RMB3", Zp, 5)),
    (0x47, op(Rmb(4), "RMB4", Zp, 5)),
    (0x57, op(Rmb(5), "RMB5", Zp, 5)),
    (0x67, op(Rmb(6), "RMB6", Zp, 5)),
    (0x77, op(Rmb(7), "RMB7", Zp, 5)),
    (0x87, op(Smb(0), "SMB0", Zp, 5)),
    (0x97, op(Smb(1), "SMB1", Zp, 5)),
    (0xA7, op(Smb(2), "SMB2", Zp, 5)),
    (0xB7, op(Smb(3), "SMB3", Zp, 5)),
    (0xC7, op(Smb(4), "SMB4", Zp, 5)),
    (0xD7, op(Smb(5), "SMB5", Zp, 5)),
    (0xE7, op(Smb(6), "SMB6", Zp, 5)),
    (0xF7, op(Smb(7), "SMB7", Zp, 5)),
    (0x0F, op(Bbr(0), "BBR0", ZpRel, 5)),
    (0x1F, op(Bbr(1), "BBR1", ZpRel, 5)),
    (0x2F, op(Bbr(2), "BBR2", ZpRel, 5)),
    (0x3F, op(Bbr(3), "BBR3", ZpRel, 5)),
    (0x4F, op(Bbr(4), "BBR4", ZpRel, 5)),
    (0x5F, op(Bbr(5), "BBR5", ZpRel, 5)),
    (0x6F, op(Bbr(6), "BBR6", ZpRel, 5)),
    (0x7F, op(Bbr(7), "BBR7", ZpRel, 5)),
    (0x8F, op(Bbs(0), "BBS0", ZpRel, 5)),
    (0x9F, op(Bbs(1), "BBS1", ZpRel, 5)),
    (0xAF, op(Bbs(2), "BBS2", ZpRel, 5)),
    (0xBF, op(Bbs(3), "BBS3", ZpRel, 5)),
    (0xCF, op(Bbs(4), "BBS4", ZpRel, 5)),
    (0xDF, op(Bbs(5), "BBS5", ZpRel, 5)),
    (0xEF, op(Bbs(6), "BBS6", ZpRel, 5)),
    (0xFF, op(Bbs(7), "BBS7", ZpRel, 5)),
    (0xCB, op(Wai, "WAI", Imp, 3)),
    (0xDB, op(Stp, "STP", Imp, 3)),
]);
