//! EEG Monitor - headless poll loop over a simulated headset

use anyhow::{Context, Result};
use clap::Parser;
use eeg_monitor::MonitorConfig;
use eeg_processing::ProcessingConfig;
use eeg_simulation::{BrainState, SimulatorConfig, StreamConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "eeg-monitor", version, about = "Decode, record and analyse a simulated EEG headset stream")]
struct Args {
    /// Seconds to run before exiting
    #[arg(long, default_value_t = 30)]
    duration_secs: u64,

    /// Simulated brain state (relaxed, focused, drowsy, meditative)
    #[arg(long, default_value = "relaxed")]
    state: BrainState,

    /// Seed for the simulator
    #[arg(long)]
    seed: Option<u64>,

    /// Record the whole run and write it here as JSON
    #[arg(long)]
    record_dir: Option<PathBuf>,

    /// Processing configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds between band power reports
    #[arg(long, default_value_t = 1)]
    report_secs: u64,
}

fn load_processing_config(path: Option<&PathBuf>) -> Result<ProcessingConfig> {
    let Some(path) = path else {
        return Ok(ProcessingConfig::default());
    };
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config = ProcessingConfig::from_json(&json).with_context(|| format!("parsing {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let processing = load_processing_config(args.config.as_ref())?;

    let config = MonitorConfig {
        stream: StreamConfig {
            simulator: SimulatorConfig {
                sample_rate: processing.sample_rate,
                state: args.state,
                seed: args.seed,
                ..SimulatorConfig::default()
            },
            ..StreamConfig::default()
        },
        processing,
        duration: Duration::from_secs(args.duration_secs),
        record_dir: args.record_dir,
        report_every: Duration::from_secs(args.report_secs.max(1)),
    };

    info!("Starting EEG monitor ({}, {}s)", args.state, args.duration_secs);
    let summary = eeg_monitor::run(config).await?;
    for path in &summary.saved {
        println!("{}", path.display());
    }
    Ok(())
}
