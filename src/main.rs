use std::io::{self, Read};
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use sim6502::{Configuration, Controller, ProcessorLevel};

#[derive(Parser)]
#[command(version, about = "Run a 6502 family program described by a JSON configuration")]
struct Args {
    /// Path to the JSON configuration file
    config: PathBuf,

    /// Use the configuration's "debug" section instead of "release"
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Override the configured processor level (6502, 65sc02 or 65c02)
    #[arg(long)]
    level: Option<ProcessorLevel>,

    /// Override the configured speed in MHz
    #[arg(long)]
    speed: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = Configuration::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(level) = args.level {
        config.cpu.level = level;
    }
    if let Some(speed) = args.speed {
        config.cpu.speed = speed;
    }

    let mut controller = Controller::configure(&config, args.debug, Box::new(io::stdout()))?;

    // Keyboard bytes go to the program; the reader dies with the process.
    let input = controller.input_sender();
    thread::spawn(move || {
        for byte in io::stdin().lock().bytes() {
            match byte {
                Ok(byte) if input.send(byte).is_ok() => {}
                Ok(_) => break,
                Err(e) => {
                    debug!("stdin closed: {e}");
                    break;
                }
            }
        }
    });

    let summary = controller.run()?;

    eprintln!(
        "\n{} cycles in {:.3}s ({:.3} MHz effective)",
        summary.cycles,
        summary.elapsed.as_secs_f64(),
        summary.effective_speed_mhz()
    );
    Ok(())
}
