//! Cache teaching simulator CLI.
//!
//! This binary feeds an address trace through the simulation engine and
//! prints what the engine's display observables expose. It performs:
//! 1. **Configuration:** Built-in defaults, an optional JSON config file, and
//!    flag overrides.
//! 2. **Trace replay:** Addresses as binary strings, or decimal integers
//!    converted to zero-padded binary (the conversion lives here, outside
//!    the engine).
//! 3. **Reporting:** Per-phase narration with `--explain`, and the final
//!    statistics table.

use clap::{Parser, ValueEnum};
use std::{fs, process};
use tracing_subscriber::EnvFilter;

use cachesim_core::config::{Organization, SimConfig, WritePolicy};
use cachesim_core::SimulationController;

#[derive(Parser, Debug)]
#[command(
    name = "cachesim",
    author,
    version,
    about = "Step-by-step cache behavior simulator",
    long_about = "Replay an address trace through a configurable cache and watch every \
                  phase of each access.\n\nExamples:\n  \
                  cachesim 00000100 00000100 01000100\n  \
                  cachesim --mode set-associative --associativity 2 --explain 4 4 68 132\n  \
                  cachesim --decimal --config lab.json 4 8 12 4"
)]
struct Cli {
    /// Addresses to replay: binary strings, or decimal with --decimal.
    #[arg(required = true)]
    addresses: Vec<String>,

    /// JSON configuration file (engine SimConfig layout).
    #[arg(short, long)]
    config: Option<String>,

    /// Cache organization.
    #[arg(short, long, value_enum, default_value_t = ModeArg::DirectMapped)]
    mode: ModeArg,

    /// Total address width in bits.
    #[arg(long)]
    address_bits: Option<usize>,

    /// Total cache capacity in bytes.
    #[arg(long)]
    cache_size: Option<usize>,

    /// Block size in bytes.
    #[arg(long)]
    block_size: Option<usize>,

    /// Ways per set (set-associative only; other modes derive it).
    #[arg(long)]
    associativity: Option<usize>,

    /// Write policy.
    #[arg(long, value_enum)]
    write_policy: Option<PolicyArg>,

    /// Interpret addresses as decimal integers.
    #[arg(short, long)]
    decimal: bool,

    /// Print the narration for every pipeline phase.
    #[arg(short, long)]
    explain: bool,
}

/// Cache organization flag.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// One candidate line per block.
    DirectMapped,
    /// N ways per set.
    SetAssociative,
    /// A single set spanning the cache.
    FullyAssociative,
}

impl From<ModeArg> for Organization {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::DirectMapped => Self::DirectMapped,
            ModeArg::SetAssociative => Self::SetAssociative,
            ModeArg::FullyAssociative => Self::FullyAssociative,
        }
    }
}

/// Write policy flag.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Dirty lines written back on eviction.
    WriteBack,
    /// Every write propagates to memory.
    WriteThrough,
}

impl From<PolicyArg> for WritePolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::WriteBack => Self::WriteBack,
            PolicyArg::WriteThrough => Self::WriteThrough,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mode = Organization::from(cli.mode);
    let config = build_config(&cli, mode);

    let addresses: Vec<String> = cli
        .addresses
        .iter()
        .map(|a| convert_address(a, cli.decimal, config.cache.address_bits))
        .collect();

    let mut sim = match SimulationController::new(config, mode) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    sim.set_address_queue(addresses);

    let g = sim.geometry();
    println!(
        "Configuration: {:?}, {} B cache, {} B blocks, {} way(s), {:?}",
        sim.mode(),
        sim.config().cache.cache_size_bytes,
        sim.config().cache.block_size_bytes,
        g.associativity,
        sim.config().cache.write_policy,
    );
    println!(
        "  Address: {} bits = tag {} | index {} | offset {}  ({} sets)",
        g.address_bits, g.tag_bits, g.index_bits, g.offset_bits, g.num_sets
    );
    println!();

    replay(&mut sim, cli.explain);

    sim.metrics().print(sim.counters());
}

/// Builds the engine configuration from defaults, an optional JSON file,
/// and flag overrides, filling the per-mode associativity default.
fn build_config(cli: &Cli, mode: Organization) -> SimConfig {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config {path}: {e}");
                process::exit(1);
            });
            serde_json::from_str(&text).unwrap_or_else(|e| {
                eprintln!("Error parsing config {path}: {e}");
                process::exit(1);
            })
        }
        None => SimConfig::default(),
    };

    if let Some(bits) = cli.address_bits {
        config.cache.address_bits = bits;
    }
    if let Some(size) = cli.cache_size {
        config.cache.cache_size_bytes = size;
    }
    if let Some(block) = cli.block_size {
        config.cache.block_size_bytes = block;
    }
    if let Some(policy) = cli.write_policy {
        config.cache.write_policy = policy.into();
    }
    config.cache.associativity = match mode {
        Organization::DirectMapped => 1,
        Organization::SetAssociative => cli.associativity.unwrap_or(2),
        Organization::FullyAssociative => {
            config.cache.cache_size_bytes / config.cache.block_size_bytes.max(1)
        }
    };
    config
}

/// Converts a trace entry into the engine's binary address format.
///
/// The engine only accepts binary strings; decimal input is converted and
/// zero-padded to the configured width here, on the caller's side.
fn convert_address(raw: &str, decimal: bool, address_bits: usize) -> String {
    if !decimal {
        return raw.to_string();
    }
    match raw.parse::<u128>() {
        Ok(value) => format!("{value:0width$b}", width = address_bits),
        Err(e) => {
            eprintln!("Error: address {raw:?} is not a decimal integer: {e}");
            process::exit(1);
        }
    }
}

/// Steps through every queued address, printing narration as it lands.
fn replay(sim: &mut SimulationController, explain: bool) {
    loop {
        let address = sim.access().address.clone();
        let position = sim.queue_index() + 1;
        println!("[{position}/{}] address {address}", sim.queue().len());

        let mut printed = 0;
        while sim.phase().is_some() {
            if let Err(e) = sim.step() {
                eprintln!("Error: {e}");
                process::exit(1);
            }
            for narration in &sim.message_log()[printed..] {
                if explain {
                    println!("    {}", narration.pre);
                    println!("    {}", narration.action);
                    if let Some(perf) = &narration.performance {
                        println!("    {perf}");
                    }
                } else {
                    println!("    {}", narration.action);
                }
            }
            printed = sim.message_log().len();
        }
        println!();

        if sim.queue_index() + 1 < sim.queue().len() {
            sim.advance_to_next_address();
        } else {
            break;
        }
    }
}
