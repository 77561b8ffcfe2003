//! # Configuration
//!
//! The emulator is configured from a JSON file. Every section and key is
//! optional. Addresses are hexadecimal strings, with or without a `0x` or `$`
//! prefix; an empty string means "not set".
//!
//! ```json
//! {
//!     "CPU": { "level": 2, "speed": 1.0, "pollIntervalMilliseconds": 10 },
//!     "IO": { "inputAddress": "F004", "outputAddress": "F001" },
//!     "ROM": { "path": "rom.bin", "loadAddress": "C000" },
//!     "run": { "resetStart": true, "stopWhenLoopDetected": true },
//!     "debug": { "disassemble": true }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use thiserror::Error;

use crate::level::ProcessorLevel;
use crate::scheduler::PacingConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid address `{0}`")]
    InvalidAddress(String),

    #[error("CPU speed must be a positive number of MHz, got {0}")]
    InvalidSpeed(f64),
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Configuration {
    #[serde(rename = "CPU")]
    pub cpu: CpuSection,
    #[serde(rename = "IO")]
    pub io: IoSection,
    #[serde(rename = "ROM")]
    pub rom: ImageSection,
    #[serde(rename = "RAM")]
    pub ram: ImageSection,
    #[serde(rename = "BBC")]
    pub bbc: BbcSection,
    pub run: RunSection,
    pub debug: DiagnosticsSection,
    pub release: DiagnosticsSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CpuSection {
    pub level: ProcessorLevel,
    /// Emulated clock speed in MHz.
    pub speed: f64,
    pub poll_interval_milliseconds: u64,
}

impl Default for CpuSection {
    fn default() -> Self {
        Self {
            level: ProcessorLevel::Nmos6502,
            speed: 2.0,
            poll_interval_milliseconds: 10,
        }
    }
}

/// Memory-mapped console ports.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IoSection {
    #[serde(deserialize_with = "optional_address")]
    pub input_address: Option<u16>,
    #[serde(deserialize_with = "optional_address")]
    pub output_address: Option<u16>,
}

/// A ROM or RAM image and where to load it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageSection {
    pub path: String,
    #[serde(deserialize_with = "address")]
    pub load_address: u16,
}

impl ImageSection {
    /// The image path, if one is configured.
    pub fn path(&self) -> Option<&Path> {
        non_empty_path(&self.path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BbcSection {
    #[serde(rename = "OS")]
    pub os: RomPath,
    pub language: RomPath,
    #[serde(rename = "VDUEmulation")]
    pub vdu_emulation: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RomPath {
    pub path: String,
}

impl RomPath {
    pub fn path(&self) -> Option<&Path> {
        non_empty_path(&self.path)
    }
}

/// Boot mode and stop conditions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunSection {
    #[serde(deserialize_with = "address")]
    pub start_address: u16,
    /// Boot through the reset vector instead of `start_address`.
    pub reset_start: bool,
    /// Stop when `break_instruction` is executed.
    pub stop_break: bool,
    #[serde(deserialize_with = "opcode")]
    pub break_instruction: u8,
    pub stop_when_loop_detected: bool,
    /// Zero disables the stop address.
    #[serde(deserialize_with = "address")]
    pub stop_address: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiagnosticsSection {
    /// Emit a trace line for every executed instruction.
    pub disassemble: bool,
}

impl Configuration {
    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The `debug` or `release` section, depending on the build being run.
    pub fn diagnostics(&self, debug: bool) -> &DiagnosticsSection {
        if debug {
            &self.debug
        } else {
            &self.release
        }
    }

    /// Pacing for the scheduler.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidSpeed`] unless the speed is finite and positive.
    pub fn pacing(&self) -> Result<PacingConfig, ConfigError> {
        let speed = self.cpu.speed;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ConfigError::InvalidSpeed(speed));
        }
        Ok(PacingConfig::new(
            speed,
            Duration::from_millis(self.cpu.poll_interval_milliseconds),
        ))
    }

    /// The stop address, or `None` when it is zero.
    pub fn stop_address(&self) -> Option<u16> {
        Some(self.run.stop_address).filter(|&address| address != 0)
    }
}

fn non_empty_path(path: &str) -> Option<&Path> {
    if path.is_empty() {
        None
    } else {
        Some(Path::new(path))
    }
}

/// Parses a hexadecimal address. Returns `Ok(None)` for an empty string.
pub fn parse_address(text: &str) -> Result<Option<u16>, ConfigError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .or_else(|| trimmed.strip_prefix('$'))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return Ok(None);
    }
    u16::from_str_radix(digits, 16)
        .map(Some)
        .map_err(|_| ConfigError::InvalidAddress(text.to_string()))
}

/// Addresses may also be written as plain JSON numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum AddressRepr {
    Number(u16),
    Text(String),
}

impl AddressRepr {
    fn resolve(self) -> Result<Option<u16>, ConfigError> {
        match self {
            AddressRepr::Number(n) => Ok(Some(n)),
            AddressRepr::Text(text) => parse_address(&text),
        }
    }
}

fn optional_address<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
    match Option::<AddressRepr>::deserialize(deserializer)? {
        Some(repr) => repr.resolve().map_err(de::Error::custom),
        None => Ok(None),
    }
}

fn address<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    Ok(optional_address(deserializer)?.unwrap_or(0))
}

fn opcode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = address(deserializer)?;
    u8::try_from(value).map_err(|_| de::Error::custom(format!("opcode ${value:X} is wider than a byte")))
}
