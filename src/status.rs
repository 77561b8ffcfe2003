//! # Processor Status Register
//!
//! The eight P-register flags, kept as individual bools so instruction code can
//! read and assign them directly. Packing to and from the hardware byte layout
//! only happens on the stack (PHP/PLP, BRK, interrupts, RTI).
//!
//! Bit layout, high to low: `N V R B D I Z C` where R is the reserved bit.

use std::fmt;

pub const NEGATIVE: u8 = 0b1000_0000;
pub const OVERFLOW: u8 = 0b0100_0000;
pub const RESERVED: u8 = 0b0010_0000;
pub const BREAK: u8 = 0b0001_0000;
pub const DECIMAL: u8 = 0b0000_1000;
pub const INTERRUPT: u8 = 0b0000_0100;
pub const ZERO: u8 = 0b0000_0010;
pub const CARRY: u8 = 0b0000_0001;

/// The P register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusRegister {
    pub negative: bool,
    pub overflow: bool,
    pub reserved: bool,
    pub break_command: bool,
    pub decimal: bool,
    pub interrupt_disable: bool,
    pub zero: bool,
    pub carry: bool,
}

impl StatusRegister {
    /// Unpacks a status byte. Every bit is taken as-is, including B and R.
    ///
    /// # Examples
    ///
    /// ```
    /// use sim6502::StatusRegister;
    ///
    /// let p = StatusRegister::from_byte(0b1000_0011);
    /// assert!(p.negative && p.zero && p.carry);
    /// assert!(!p.overflow);
    /// assert_eq!(p.to_byte(), 0b1000_0011);
    /// ```
    pub fn from_byte(value: u8) -> Self {
        Self {
            negative: value & NEGATIVE != 0,
            overflow: value & OVERFLOW != 0,
            reserved: value & RESERVED != 0,
            break_command: value & BREAK != 0,
            decimal: value & DECIMAL != 0,
            interrupt_disable: value & INTERRUPT != 0,
            zero: value & ZERO != 0,
            carry: value & CARRY != 0,
        }
    }

    /// Unpacks a status byte being loaded into P as a whole. The reserved bit
    /// has no storage on the chip and always reads back as set.
    ///
    /// ```
    /// use sim6502::StatusRegister;
    ///
    /// assert_eq!(StatusRegister::load(0x00).to_byte(), 0b0010_0000);
    /// ```
    pub fn load(value: u8) -> Self {
        Self {
            reserved: true,
            ..Self::from_byte(value)
        }
    }

    /// Packs the flags into the hardware byte layout.
    pub fn to_byte(&self) -> u8 {
        let mut value = 0;
        if self.negative {
            value |= NEGATIVE;
        }
        if self.overflow {
            value |= OVERFLOW;
        }
        if self.reserved {
            value |= RESERVED;
        }
        if self.break_command {
            value |= BREAK;
        }
        if self.decimal {
            value |= DECIMAL;
        }
        if self.interrupt_disable {
            value |= INTERRUPT;
        }
        if self.zero {
            value |= ZERO;
        }
        if self.carry {
            value |= CARRY;
        }
        value
    }

    /// Power-on value: only the reserved bit set.
    pub fn power_on() -> Self {
        Self {
            reserved: true,
            ..Self::default()
        }
    }
}

impl From<u8> for StatusRegister {
    fn from(value: u8) -> Self {
        Self::from_byte(value)
    }
}

impl From<StatusRegister> for u8 {
    fn from(p: StatusRegister) -> u8 {
        p.to_byte()
    }
}

/// Renders as eight characters, a letter for each set flag and `-` otherwise,
/// e.g. `N-R--IZC`.
impl fmt::Display for StatusRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            (self.negative, 'N'),
            (self.overflow, 'V'),
            (self.reserved, 'R'),
            (self.break_command, 'B'),
            (self.decimal, 'D'),
            (self.interrupt_disable, 'I'),
            (self.zero, 'Z'),
            (self.carry, 'C'),
        ];
        for (set, letter) in flags {
            write!(f, "{}", if set { letter } else { '-' })?;
        }
        Ok(())
    }
}
