//! # Processor Levels
//!
//! The three supported members of the 6502 family. Levels are ordered so that
//! "is at least 65SC02" style checks read naturally: `level >= ProcessorLevel::Cmos65SC02`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Instruction-set variant emulated by a [`CPU`](crate::CPU).
///
/// Each level is a strict superset of the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "LevelRepr", into = "u8")]
pub enum ProcessorLevel {
    /// Original NMOS 6502.
    #[default]
    Nmos6502,

    /// Rockwell/WDC 65SC02 (CMOS without the bit instructions).
    Cmos65SC02,

    /// WDC 65C02 (adds RMB/SMB/BBR/BBS, WAI and STP).
    Cmos65C02,
}

impl ProcessorLevel {
    /// All levels, lowest first.
    pub const ALL: [ProcessorLevel; 3] = [
        ProcessorLevel::Nmos6502,
        ProcessorLevel::Cmos65SC02,
        ProcessorLevel::Cmos65C02,
    ];

    /// Returns the conventional part name.
    pub fn name(self) -> &'static str {
        match self {
            ProcessorLevel::Nmos6502 => "6502",
            ProcessorLevel::Cmos65SC02 => "65SC02",
            ProcessorLevel::Cmos65C02 => "65C02",
        }
    }
}

impl fmt::Display for ProcessorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a processor level cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown processor level `{0}` (expected 0, 1, 2, 6502, 65sc02 or 65c02)")]
pub struct UnknownLevel(pub String);

impl TryFrom<u8> for ProcessorLevel {
    type Error = UnknownLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ProcessorLevel::Nmos6502),
            1 => Ok(ProcessorLevel::Cmos65SC02),
            2 => Ok(ProcessorLevel::Cmos65C02),
            other => Err(UnknownLevel(other.to_string())),
        }
    }
}

impl From<ProcessorLevel> for u8 {
    fn from(level: ProcessorLevel) -> u8 {
        level as u8
    }
}

impl FromStr for ProcessorLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "6502" | "nmos6502" => Ok(ProcessorLevel::Nmos6502),
            "1" | "65sc02" => Ok(ProcessorLevel::Cmos65SC02),
            "2" | "65c02" => Ok(ProcessorLevel::Cmos65C02),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

/// Configuration files write the level either as a number or as a part name.
#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Number(u8),
    Name(String),
}

impl TryFrom<LevelRepr> for ProcessorLevel {
    type Error = UnknownLevel;

    fn try_from(repr: LevelRepr) -> Result<Self, Self::Error> {
        match repr {
            LevelRepr::Number(n) => ProcessorLevel::try_from(n),
            LevelRepr::Name(name) => name.parse(),
        }
    }
}
