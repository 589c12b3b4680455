//! Signal Engine: rolling features and the Composite Severity Score (CSS)
//!
//! Surface channels are continuous but attenuated by the drill string; the
//! MWD channel is ground truth but sparse. The CSS fuses the three:
//!
//! ```text
//! CSS = w_mwd · mwd_ratio
//!     + w_torque · clip(torque_dev, 0, 2) / 2
//!     + w_rpm · clip(rpm_ssi, 0, 2) / 2          clipped to [0, 1]
//! ```
//!
//! CSS and the surface index are undefined wherever the rolling-mean RPM is
//! below the minimum rotation speed.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::rolling::{
    duration_to_samples, median_interval, percentile, rolling_mean, rolling_median, rolling_std,
};
use crate::config::SignalConfig;
use crate::types::{DerivedSignals, SeverityLabel, TelemetrySample};

// ============================================================================
// Window Sizing
// ============================================================================

/// Sample counts resolved from the configured durations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSizing {
    /// Median sample interval (s), if computable
    pub median_dt_s: Option<f64>,
    /// Primary rolling window (samples)
    pub window_samples: usize,
    /// Torque baseline window (samples)
    pub baseline_window_samples: usize,
}

impl WindowSizing {
    pub fn resolve(times: &[f64], config: &SignalConfig) -> Self {
        let window_samples = duration_to_samples(
            times,
            config.window_s,
            config.min_window_samples,
            config.fallback_window_samples,
        );
        let baseline_window_samples = (config.baseline_window_multiplier * window_samples)
            .max(config.min_baseline_window_samples);
        Self {
            median_dt_s: median_interval(times),
            window_samples,
            baseline_window_samples,
        }
    }
}

// ============================================================================
// Signal Engine
// ============================================================================

/// Signal Engine output: the per-sample signals plus the sizing and
/// summary they were computed with.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRun {
    /// Same length and order as the input samples
    pub signals: Vec<DerivedSignals>,
    pub sizing: WindowSizing,
    pub summary: SignalSummary,
}

/// Compute the derived signal set for every sample.
///
/// Output has the same length and order as `samples`.
pub fn compute_signals(samples: &[TelemetrySample], config: &SignalConfig) -> Vec<DerivedSignals> {
    run_signal_engine(samples, config).signals
}

/// Resolve the windows, compute every sample's signals and summarise them.
pub fn run_signal_engine(samples: &[TelemetrySample], config: &SignalConfig) -> SignalRun {
    let times: Vec<f64> = samples.iter().map(|s| s.time_s).collect();
    let sizing = WindowSizing::resolve(&times, config);
    if samples.is_empty() {
        return SignalRun {
            signals: Vec::new(),
            sizing,
            summary: SignalSummary::default(),
        };
    }

    info!(
        window_s = config.window_s,
        window_samples = sizing.window_samples,
        baseline_samples = sizing.baseline_window_samples,
        median_dt_s = sizing.median_dt_s.unwrap_or(f64::NAN),
        "Signal windows resolved"
    );

    let rpm: Vec<f64> = samples.iter().map(|s| finite_or_zero(s.rpm)).collect();
    let torque: Vec<f64> = samples.iter().map(|s| finite_or_zero(s.torque_knm)).collect();

    let win = sizing.window_samples;
    let rpm_mean = rolling_mean(&rpm, win, config.min_periods);
    let rpm_std = rolling_std(&rpm, win, config.min_periods);
    let torque_baseline = rolling_median(
        &torque,
        sizing.baseline_window_samples,
        config.baseline_min_periods,
    );
    let torque_std = rolling_std(&torque, win, config.min_periods);

    let mwd_ratio = forward_filled_mwd_ratio(samples, &rpm_mean, config);

    let signals: Vec<DerivedSignals> = (0..samples.len())
        .map(|i| {
            let mean = rpm_mean[i];
            let rpm_roll_std = rpm_std[i].unwrap_or(0.0);
            let torque_roll_std = torque_std[i].unwrap_or(0.0);
            let baseline = torque_baseline[i];

            let mut rpm_ssi = mean.map(|m| rpm_roll_std / m.max(config.min_rpm));
            let torque_deviation =
                baseline.map(|b| (torque[i] - b) / b.max(config.torque_baseline_floor_knm));
            let torque_spike = baseline
                .is_some_and(|b| torque[i] > b + config.torque_spike_sigma * torque_roll_std);

            let mut css = match (torque_deviation, rpm_ssi) {
                (Some(dev), Some(ssi)) => Some(
                    (config.weight_mwd * mwd_ratio[i]
                        + config.weight_torque * dev.clamp(0.0, 2.0) / 2.0
                        + config.weight_rpm * ssi.clamp(0.0, 2.0) / 2.0)
                        .clamp(0.0, 1.0),
                ),
                _ => None,
            };

            // Not rotating: no surface index, no severity
            if mean.unwrap_or(0.0) < config.min_rpm {
                rpm_ssi = None;
                css = None;
            }

            DerivedSignals {
                rpm_roll_mean: mean,
                rpm_roll_std,
                rpm_ssi,
                torque_baseline: baseline,
                torque_roll_std,
                torque_deviation,
                torque_spike,
                mwd_ssi: mwd_ratio[i],
                css,
                severity_label: SeverityLabel::classify(css),
            }
        })
        .collect();

    let summary = SignalSummary::from_signals(samples, &signals);
    info!(
        css_max = summary.css_max,
        css_p50 = summary.css_p50,
        css_p95 = summary.css_p95,
        css_defined_pct = summary.css_defined_pct,
        mwd_coverage_pct = summary.mwd_coverage_pct,
        torque_spike_pct = summary.torque_spike_pct,
        "Signals computed"
    );

    SignalRun {
        signals,
        sizing,
        summary,
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Normalised MWD oscillation ratio with a bounded forward fill.
///
/// A zero, absent or undefined ratio is a survey gap. The last fresh value
/// is carried for at most `mwd_ffill_limit` samples, then the ratio drops to 0.
fn forward_filled_mwd_ratio(
    samples: &[TelemetrySample],
    rpm_mean: &[Option<f64>],
    config: &SignalConfig,
) -> Vec<f64> {
    let mut last_fresh: Option<f64> = None;
    let mut since_fresh = 0usize;

    samples
        .iter()
        .zip(rpm_mean)
        .map(|(s, mean)| {
            let raw = match (s.mwd_pktopk, mean) {
                (Some(amp), Some(m)) if amp.is_finite() => {
                    Some((amp / m.max(config.min_rpm)).clamp(0.0, 2.0) / 2.0)
                }
                _ => None,
            };

            match raw {
                Some(r) if r > 0.0 => {
                    last_fresh = Some(r);
                    since_fresh = 0;
                    r
                }
                _ => {
                    since_fresh = since_fresh.saturating_add(1);
                    match last_fresh {
                        Some(r) if since_fresh <= config.mwd_ffill_limit => r,
                        _ => 0.0,
                    }
                }
            }
        })
        .collect()
}

// ============================================================================
// Summary
// ============================================================================

/// Run-level statistics over the derived signals, for logs and metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub css_max: f64,
    pub css_p50: f64,
    pub css_p95: f64,
    /// Share of samples with a defined CSS (%)
    pub css_defined_pct: f64,
    /// Share of samples carrying a non-zero MWD reading (%)
    pub mwd_coverage_pct: f64,
    /// Share of samples flagged as torque spikes (%)
    pub torque_spike_pct: f64,
}

impl SignalSummary {
    pub fn from_signals(samples: &[TelemetrySample], signals: &[DerivedSignals]) -> Self {
        let n = signals.len();
        if n == 0 {
            return Self::default();
        }

        let mut css: Vec<f64> = signals.iter().filter_map(|s| s.css).collect();
        css.sort_by(f64::total_cmp);

        let mwd_rows = samples
            .iter()
            .filter(|s| s.mwd_pktopk.is_some_and(|v| v > 0.0))
            .count();
        let spikes = signals.iter().filter(|s| s.torque_spike).count();
        let pct = |count: usize| 100.0 * count as f64 / n as f64;

        debug!(defined = css.len(), total = n, "CSS coverage");

        Self {
            css_max: css.last().copied().unwrap_or(0.0),
            css_p50: percentile(&css, 50.0),
            css_p95: percentile(&css, 95.0),
            css_defined_pct: pct(css.len()),
            mwd_coverage_pct: pct(mwd_rows),
            torque_spike_pct: pct(spikes),
        }
    }
}


// ============================================================================
// Tests
// ============================================================================
