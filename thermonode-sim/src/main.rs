// thermonode-sim - Host-side replay of sensor traces
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # thermonode-sim
//!
//! Replays a recorded sensor trace through a thermonode and prints what
//! the node would have transmitted, as JSON.
//!
//! ## Usage
//!
//! ```bash
//! # Replay with default settings
//! thermonode-sim --csv trace.csv
//!
//! # Custom thresholds and a healthy battery
//! thermonode-sim --csv trace.csv --config node.json --battery 3.05
//! ```

mod replay;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use thermonode::{NodeConfig, NodeError};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use replay::{ReplayEngine, SimError};

/// thermonode trace simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV trace to replay (timestamp_ms,device_id,value)
    #[arg(short, long)]
    csv: PathBuf,

    /// JSON node configuration; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Battery voltage reported by the simulated node
    #[arg(short, long)]
    battery: Option<f32>,

    /// Boot time of the node in milliseconds
    #[arg(long, default_value = "0")]
    start_ms: u64,

    /// Pretty-print the JSON report
    #[arg(short, long)]
    pretty: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("thermonode-sim v{}", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), SimError> {
    let config = match &args.config {
        Some(path) => NodeConfig::load(path).map_err(NodeError::from)?,
        None => NodeConfig::default(),
    };

    let rows = ReplayEngine::parse_csv(&args.csv)?;
    info!("Trace loaded: {} samples", rows.len());

    let mut engine = ReplayEngine::new(config, args.start_ms, args.battery)?;
    let report = engine.run(&rows);
    info!(
        "{} of {} samples published",
        report.publishes.len(),
        report.samples
    );

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);
    Ok(())
}
