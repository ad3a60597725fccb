#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Drone Siege simulation.

mod config;
mod simulation;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use drone_siege_core::WELCOME_BANNER;
use tracing::info;

use crate::config::SimulationConfig;

/// Headless Drone Siege simulation driven by a scripted player.
#[derive(Debug, Parser)]
#[command(name = "drone-siege", version)]
struct Cli {
    /// TOML file with simulation settings; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed overriding the configuration file.
    #[arg(long)]
    seed: Option<u64>,
    /// Maximum number of ticks to simulate.
    #[arg(long)]
    ticks: Option<u64>,
    /// Stage number (1-4) to open with.
    #[arg(long)]
    stage: Option<u8>,
}

impl Cli {
    fn resolve(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load(path)?,
            None => SimulationConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(ticks) = self.ticks {
            config.ticks = ticks;
        }
        if let Some(stage) = self.stage {
            config.start_stage = stage;
        }
        Ok(config)
    }
}

/// Entry point for the Drone Siege command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.resolve()?;
    let start = config.validate().context("simulation settings rejected")?;
    let tuning = config.tuning().context("simulation settings rejected")?;

    info!("{WELCOME_BANNER}");
    let summary = simulation::run(&config, start, tuning);
    print!("{summary}");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
