//! Pipelined RISC-V core model CLI.
//!
//! This binary runs one program image on the core model. It performs:
//! 1. **Setup:** Reads an optional JSON configuration and installs the log subscriber.
//! 2. **Loading:** Places a binary, hex, or ELF image in memory.
//! 3. **Run:** Clocks the core until it halts, faults inside a handler, or hits the cycle
//!    limit, then prints the statistics as text or JSON.
//!
//! Exit status is 0 when the program halts itself, 1 on any error, and 2 when the cycle
//! limit is reached first.

use std::path::PathBuf;
use std::process::ExitCode;
use std::{fs, io};

use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rvpipe_core::config::Config;
use rvpipe_core::sim::{ImageFormat, RunOutcome, SimError, Simulator};
use rvpipe_core::stats::STATS_SECTIONS;

#[derive(Parser, Debug)]
#[command(
    name = "rvpipe",
    author,
    version,
    about = "Cycle-accurate five-stage pipelined RISC-V core model",
    long_about = "Load a program image, clock the pipeline until the program stops, and report \
                  pipeline statistics.\n\nExamples:\n  rvpipe prog.bin\n  rvpipe --config \
                  rv32.json --format hex prog.hex\n  rvpipe --json --max-cycles 50000 prog.elf"
)]
struct Cli {
    /// Program image to load.
    image: PathBuf,

    /// JSON configuration file (defaults are used for missing fields).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Image format.
    #[arg(short, long, value_enum, default_value_t = Format::Auto)]
    format: Format,

    /// Cycle limit (overrides `general.max_cycles`).
    #[arg(short, long)]
    max_cycles: Option<u64>,

    /// Log filter, e.g. `debug` or `rvpipe_core=trace` (overrides `RUST_LOG`).
    #[arg(long)]
    log: Option<String>,

    /// Emit per-stage trace events (needs a `trace` log filter to be visible).
    #[arg(long)]
    trace: bool,

    /// Print statistics as JSON.
    #[arg(long)]
    json: bool,

    /// Statistics sections to print, comma separated (default: all).
    #[arg(long, value_delimiter = ',', value_parser = clap::builder::PossibleValuesParser::new(STATS_SECTIONS.iter().copied()))]
    stats: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// Flat little-endian binary.
    Bin,
    /// One hex word per line.
    Hex,
    /// ELF executable.
    Elf,
    /// Detect from contents and extension.
    Auto,
}

impl From<Format> for ImageFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Bin => Self::Binary,
            Format::Hex => Self::Hex,
            Format::Elf => Self::Elf,
            Format::Auto => Self::Auto,
        }
    }
}

/// Installs the `tracing` subscriber: `--log`, then `RUST_LOG`, then `info`.
fn init_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, SimError> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ok(Config::from_json(&text)?)
        }
        None => Ok(Config::default()),
    }
}

fn run(cli: &Cli) -> Result<ExitCode, SimError> {
    let mut config = load_config(cli.config.as_ref())?;
    if cli.trace {
        config.general.trace_pipeline = true;
    }
    let max_cycles = cli.max_cycles.unwrap_or(config.general.max_cycles);

    let mut sim = Simulator::new(&config)?;
    let image = sim.load_image(&cli.image, cli.format.into())?;
    info!(
        image = %cli.image.display(),
        bytes = image.bytes,
        xlen = config.isa.xlen.bits(),
        pc = format_args!("{:#x}", sim.cpu.pc),
        "starting"
    );

    let result = sim.run(max_cycles);
    if cli.json {
        match serde_json::to_string_pretty(sim.stats()) {
            Ok(json) => println!("{json}"),
            Err(e) => error!(%e, "cannot serialize statistics"),
        }
    } else {
        sim.stats().print_sections(&cli.stats);
    }

    match result {
        Ok(RunOutcome::Halted { cause, pc }) => {
            info!(%cause, pc = format_args!("{pc:#x}"), a0 = sim.cpu.regs.read(10), "halted");
            Ok(ExitCode::SUCCESS)
        }
        Ok(RunOutcome::CycleLimit) => {
            warn!(max_cycles, "cycle limit reached");
            Ok(ExitCode::from(2))
        }
        Err(e) => {
            eprintln!("{}", sim.cpu.dump_state());
            Err(e)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
