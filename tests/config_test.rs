//! Tests for loading and interpreting the JSON configuration file.

use std::fs;
use std::time::Duration;

use sim6502::config::parse_address;
use sim6502::{ConfigError, Configuration, ProcessorLevel};

const FULL_CONFIGURATION: &str = r#"{
    "CPU": { "level": 2, "speed": 1.5, "pollIntervalMilliseconds": 20 },
    "IO": { "inputAddress": "F004", "outputAddress": "0xF001" },
    "ROM": { "path": "rom.bin", "loadAddress": "$C000" },
    "RAM": { "path": "ram.bin", "loadAddress": 512 },
    "BBC": {
        "OS": { "path": "os.rom" },
        "language": { "path": "basic.rom" },
        "VDUEmulation": true
    },
    "run": {
        "startAddress": "0400",
        "resetStart": false,
        "stopBreak": true,
        "breakInstruction": "DB",
        "stopWhenLoopDetected": true,
        "stopAddress": "3469"
    },
    "debug": { "disassemble": true },
    "release": { "disassemble": false }
}"#;

// ========== Parsing ==========

#[test]
fn test_full_configuration() {
    let config = Configuration::from_json(FULL_CONFIGURATION).unwrap();

    assert_eq!(config.cpu.level, ProcessorLevel::Cmos65C02);
    assert_eq!(config.cpu.speed, 1.5);
    assert_eq!(config.io.input_address, Some(0xF004));
    assert_eq!(config.io.output_address, Some(0xF001));
    assert_eq!(config.rom.path().unwrap().to_str(), Some("rom.bin"));
    assert_eq!(config.rom.load_address, 0xC000);
    assert_eq!(config.ram.load_address, 0x0200);
    assert_eq!(config.bbc.os.path().unwrap().to_str(), Some("os.rom"));
    assert!(config.bbc.vdu_emulation);
    assert_eq!(config.run.start_address, 0x0400);
    assert!(config.run.stop_break);
    assert_eq!(config.run.break_instruction, 0xDB);
    assert!(config.run.stop_when_loop_detected);
    assert_eq!(config.stop_address(), Some(0x3469));
}

#[test]
fn test_diagnostics_section_follows_build() {
    let config = Configuration::from_json(FULL_CONFIGURATION).unwrap();

    assert!(config.diagnostics(true).disassemble);
    assert!(!config.diagnostics(false).disassemble);
}

#[test]
fn test_pacing_from_cpu_section() {
    let config = Configuration::from_json(FULL_CONFIGURATION).unwrap();

    let pacing = config.pacing().unwrap();

    assert_eq!(pacing.poll_interval, Duration::from_millis(20));
    assert_eq!(pacing.cycles_per_interval(), 30_000);
}

#[test]
fn test_non_positive_speed_is_rejected() {
    for speed in ["0", "-1.5"] {
        let json = format!(r#"{{ "CPU": {{ "speed": {speed} }} }}"#);
        let config = Configuration::from_json(&json).unwrap();

        let error = config.pacing().unwrap_err();

        assert!(matches!(error, ConfigError::InvalidSpeed(_)), "speed {speed}");
    }
}

#[test]
fn test_level_by_name() {
    let config = Configuration::from_json(r#"{ "CPU": { "level": "65SC02" } }"#).unwrap();

    assert_eq!(config.cpu.level, ProcessorLevel::Cmos65SC02);
    assert_eq!(config.cpu.speed, 2.0);
}

#[test]
fn test_empty_strings_mean_unset() {
    let config = Configuration::from_json(
        r#"{ "IO": { "inputAddress": "", "outputAddress": "" }, "ROM": { "path": "" }, "run": { "stopAddress": "" } }"#,
    )
    .unwrap();

    assert_eq!(config.io.input_address, None);
    assert_eq!(config.io.output_address, None);
    assert!(config.rom.path().is_none());
    assert_eq!(config.stop_address(), None);
}

// ========== Errors ==========

#[test]
fn test_unknown_level_is_rejected() {
    let error = Configuration::from_json(r#"{ "CPU": { "level": 3 } }"#).unwrap_err();

    assert!(matches!(error, ConfigError::Parse(_)));
}

#[test]
fn test_bad_address_is_rejected() {
    let error = Configuration::from_json(r#"{ "IO": { "outputAddress": "G000" } }"#).unwrap_err();

    assert!(error.to_string().contains("G000"));
}

#[test]
fn test_break_instruction_must_fit_a_byte() {
    assert!(Configuration::from_json(r#"{ "run": { "breakInstruction": "100" } }"#).is_err());
}

#[test]
fn test_parse_address_rejects_garbage() {
    assert!(matches!(parse_address("12 34"), Err(ConfigError::InvalidAddress(_))));
    assert_eq!(parse_address("  $ff  ").unwrap(), Some(0x00FF));
}

// ========== Files ==========

#[test]
fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("sim6502-{}-config.json", std::process::id()));
    fs::write(&path, FULL_CONFIGURATION).unwrap();

    let config = Configuration::load(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(config, Configuration::from_json(FULL_CONFIGURATION).unwrap());
}

#[test]
fn test_missing_file() {
    let error = Configuration::load("/nonexistent/sim6502.json").unwrap_err();

    assert!(matches!(error, ConfigError::Io { .. }));
}
