//! Synthetic Stick-Slip Telemetry
//!
//! Generates a stable-baseline-then-stick-slip run and writes it to stdout
//! as a Volve time-log CSV, ready for the `autodriller` binary.
//!
//! # Usage
//! ```bash
//! ./simulation --noise --oscillation-hz 0.1 > synth.csv
//! ./autodriller --csv synth.csv
//! ```

use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use torsional_autodriller::config::defaults::SYNTHETIC_SEED;
use torsional_autodriller::synthetic::{self, NoiseConfig, ScenarioConfig, TorqueOscillation};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "simulation")]
#[command(about = "Synthetic stick-slip telemetry in Volve CSV layout")]
#[command(version)]
struct Args {
    /// Number of samples
    #[arg(long, default_value_t = 600)]
    samples: usize,

    /// Sample interval (s)
    #[arg(long, default_value_t = 1.0)]
    dt: f64,

    /// Start of the stick-slip step (s)
    #[arg(long, default_value_t = 300.0)]
    step_start: f64,

    /// Length of the stick-slip step (s)
    #[arg(long, default_value_t = 60.0)]
    step_duration: f64,

    /// Downhole peak-to-peak reported during the step (rpm)
    #[arg(long, default_value_t = 200.0)]
    pktopk: f64,

    /// Add Gaussian noise to RPM, torque and WOB
    #[arg(long)]
    noise: bool,

    /// Torque oscillation frequency during the step (Hz)
    #[arg(long)]
    oscillation_hz: Option<f64>,

    /// Torque oscillation amplitude (kN·m)
    #[arg(long, default_value_t = 2.0)]
    oscillation_knm: f64,

    /// Random seed for reproducibility
    #[arg(long, default_value_t = SYNTHETIC_SEED)]
    seed: u64,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays a clean CSV
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = ScenarioConfig {
        samples: args.samples,
        dt_s: args.dt,
        step_start_s: args.step_start,
        step_duration_s: args.step_duration,
        step_pktopk: args.pktopk,
        noise: args.noise.then(NoiseConfig::default),
        oscillation: args.oscillation_hz.map(|freq_hz| TorqueOscillation {
            freq_hz,
            amplitude_knm: args.oscillation_knm,
        }),
        seed: args.seed,
        ..ScenarioConfig::default()
    };

    let samples = synthetic::generate(&config);
    info!(
        samples = samples.len(),
        step = format!("{:.0}-{:.0} s", config.step_start_s, config.step_start_s + config.step_duration_s),
        noise = args.noise,
        seed = config.seed,
        "Generated synthetic run"
    );

    let stdout = io::stdout();
    synthetic::write_csv(&samples, BufWriter::new(stdout.lock())).context("writing CSV to stdout")?;
    Ok(())
}
