//! # Instruction Implementations
//!
//! Instruction semantics, organized by category. Each function receives the CPU
//! with PC just past the opcode byte and the addressing mode from the
//! instruction table. Functions fetch their own operands and charge any
//! page-crossing or branch penalty; the base cycle count is added by
//! [`CPU::step`](crate::CPU::step).
//!
//! ## Categories
//!
//! - **alu**: ADC, SBC, AND, ORA, EOR, CMP, CPX, CPY, BIT
//! - **bits**: TSB, TRB, RMB, SMB
//! - **branches**: conditional branches, BRA, BBR, BBS
//! - **control**: BRK, JMP, JSR, RTS, RTI, NOP
//! - **flags**: CLC, SEC, CLI, SEI, CLD, SED, CLV
//! - **inc_dec**: INC, DEC, INX, INY, DEX, DEY
//! - **load_store**: LDA, LDX, LDY, STA, STX, STY, STZ
//! - **shifts**: ASL, LSR, ROL, ROR
//! - **stack**: PHA, PHP, PHX, PHY, PLA, PLP, PLX, PLY
//! - **transfer**: TAX, TAY, TXA, TYA, TSX, TXS

pub mod alu;
pub mod bits;
pub mod branches;
pub mod control;
pub mod flags;
pub mod inc_dec;
pub mod load_store;
pub mod shifts;
pub mod stack;
pub mod transfer;
