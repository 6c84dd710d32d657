//! redrate-sim — Scenario simulator and calculator for the redrate controller.
//!
//! - `simulate` replays a TOML scenario through an update gate backed by
//!   in-memory collaborators and prints one row per step
//! - `pow` compounds a per-second rate
//! - `per-second-rate` converts a one-year multiplier into a per-second rate
//!   and the timeline it is spread over

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use redrate_compound::Compounder;
use redrate_core::constants::{DEFAULT_MIN_RATE_TIMELINE, RAY};
use redrate_core::fixed::{format_decimal, parse_decimal, ten_pow};
use redrate_core::traits::RateCompounder;
use tracing::info;

mod scenario;
mod simulate;

use scenario::Scenario;

#[derive(Parser, Debug)]
#[command(name = "redrate-sim", version, about = "Redemption rate controller simulator")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, default_value = "text", global = true)]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scenario file.
    Simulate {
        /// Scenario TOML file.
        #[arg(long)]
        config: PathBuf,
        /// Report format.
        #[arg(long, value_enum, default_value_t = Output::Text)]
        output: Output,
    },
    /// Compound a base: base^exponent.
    Pow {
        /// Base as a decimal, e.g. 1.000000001.
        #[arg(long)]
        base: String,
        #[arg(long)]
        exponent: u64,
        /// Fractional digits of the fixed-point scale.
        #[arg(long, default_value_t = 27)]
        scale: u32,
    },
    /// Per-second rate for a one-year multiplier, e.g. 1.05 for +5% per year.
    PerSecondRate {
        #[arg(long)]
        global_rate: String,
        /// Shortest timeline in seconds.
        #[arg(long, default_value_t = DEFAULT_MIN_RATE_TIMELINE)]
        min_timeline: u64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Output {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    match cli.command {
        Command::Simulate { config, output } => cmd_simulate(&config, output),
        Command::Pow { base, exponent, scale } => cmd_pow(&base, exponent, scale),
        Command::PerSecondRate { global_rate, min_timeline } => {
            cmd_per_second_rate(&global_rate, min_timeline)
        }
    }
}

fn cmd_simulate(path: &std::path::Path, output: Output) -> Result<()> {
    let scenario = Scenario::load(path)?;
    info!(
        steps = scenario.steps.len(),
        mode = %scenario.controller.mode,
        "sim: loaded scenario {}",
        path.display()
    );
    let rows = simulate::run(&scenario)?;

    match output {
        Output::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Output::Text => {
            println!(
                "{:>4} {:>12} {:>10} {:>14} {:>32} {:>10} {:>14} {:>18} {:>8}  status",
                "step", "time", "market", "reference", "rate", "timeline", "P", "I", "reward"
            );
            for r in &rows {
                let timeline = r.timeline.map_or_else(|| "-".to_string(), |t| t.to_string());
                println!(
                    "{:>4} {:>12} {:>10} {:>14} {:>32} {:>10} {:>14} {:>18} {:>8}  {}",
                    r.step,
                    r.time,
                    r.market,
                    truncate(&r.reference, 14),
                    r.rate,
                    timeline,
                    truncate(&r.proportional, 14),
                    truncate(&r.integral, 18),
                    truncate(&r.reward, 8),
                    r.status
                );
            }
        }
    }
    Ok(())
}

fn cmd_pow(base: &str, exponent: u64, scale_digits: u32) -> Result<()> {
    let scale = ten_pow(scale_digits).context("scale too large")?;
    let base = parse_decimal(base, scale_digits).context("invalid base")?;
    let value = Compounder.pow(base, exponent, scale)?;
    println!("{value}");
    println!("{}", format_decimal(value, scale_digits));
    Ok(())
}

fn cmd_per_second_rate(global_rate: &str, min_timeline: u64) -> Result<()> {
    let target = parse_decimal(global_rate, 27).context("invalid global rate")?;
    let (rate, timeline) = Compounder.per_second_rate(target, min_timeline, RAY)?;
    println!("rate:     {rate}");
    println!("decimal:  {}", format_decimal(rate, 27));
    println!("timeline: {timeline}");
    Ok(())
}

fn truncate(s: &str, width: usize) -> &str {
    match s.char_indices().nth(width) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides `level_str`.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .init();
    }
}
