//! Torsional Auto-Driller - offline stick-slip analysis
//!
//! Ingests a Volve time-log CSV, runs the full analysis pipeline and writes
//! `telemetry.json`, `events.json` and `metadata.json` for the dashboard.
//!
//! # Usage
//!
//! ```bash
//! # Analyse a well log with default parameters
//! ./autodriller --csv "Norway-NA-15_47_9-F-9 A time.csv"
//!
//! # Synthetic round trip
//! ./simulation > synth.csv && ./autodriller --csv synth.csv --out-dir out
//! ```
//!
//! # Environment Variables
//!
//! - `AUTODRILLER_CONFIG`: Path to well_config.toml
//! - `RUST_LOG`: Logging level (default: info)

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use torsional_autodriller::config::defaults::{
    DEFAULT_DOWNSAMPLE, DEFAULT_OUT_DIR, EVENTS_FILE, METADATA_FILE, TELEMETRY_FILE,
};
use torsional_autodriller::config::WellConfig;
use torsional_autodriller::detection::worst_event;
use torsional_autodriller::pipeline::{self, report};
use torsional_autodriller::volve;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "autodriller")]
#[command(about = "Stick-slip detection and auto-driller simulation over drilling telemetry")]
#[command(version)]
struct CliArgs {
    /// Volve time-log CSV to analyse
    #[arg(long, value_name = "FILE")]
    csv: PathBuf,

    /// Well configuration TOML (overrides AUTODRILLER_CONFIG / ./well_config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory for the JSON reports
    #[arg(long, default_value = DEFAULT_OUT_DIR)]
    out_dir: PathBuf,

    /// Keep every Nth row in telemetry.json
    #[arg(long, default_value_t = DEFAULT_DOWNSAMPLE)]
    downsample: usize,

    /// Override the rolling-window length (s)
    #[arg(long)]
    window_s: Option<f64>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(args: &CliArgs) -> Result<WellConfig> {
    let mut config = match &args.config {
        Some(path) => WellConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => WellConfig::load(),
    };
    if let Some(window_s) = args.window_s {
        config.signals.window_s = window_s;
        config
            .validate()
            .with_context(|| format!("--window-s {window_s} is not usable"))?;
    }
    Ok(config)
}

fn write_json<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> Result<()> {
    let path = dir.join(name);
    let file = fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), value)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "Wrote report");
    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.json_logs);

    let config = load_config(&args)?;
    info!(
        well = %config.well.name,
        field = %config.well.field,
        rig = %config.well.rig,
        "Torsional auto-driller starting"
    );

    let (samples, ingest) = volve::load_csv(&args.csv, &config.ingest)
        .with_context(|| format!("ingesting {}", args.csv.display()))?;

    let output = pipeline::run(&samples, &config);

    match worst_event(&output.events) {
        Some(e) => info!(
            event_id = e.event_id,
            severity = %e.severity,
            duration_s = format!("{:.0}", e.duration_s),
            peak_css = format!("{:.3}", e.peak_css),
            "Worst event"
        ),
        None => warn!("No stick-slip events detected"),
    }

    let report = report::build_report(&output, &config, Some(&ingest), args.downsample);

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    write_json(&args.out_dir, TELEMETRY_FILE, &report.telemetry)?;
    write_json(&args.out_dir, EVENTS_FILE, &report.events)?;
    write_json(&args.out_dir, METADATA_FILE, &report.metadata)?;

    info!("{}", output.stats());
    Ok(())
}
