//! Report assembly for downstream dashboards
//!
//! Flattens a [`PipelineOutput`] into three serde-serialisable documents:
//! per-sample telemetry rows, the event table and run metadata. Writing them
//! to disk is left to the caller.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PipelineOutput;
use crate::config::{WellConfig, WellInfo};
use crate::control::{NominalSetpoints, StateDistribution};
use crate::detection::count_by_severity;
use crate::processing::SignalSummary;
use crate::types::{
    ActionTag, ControllerState, EnrichedSample, SeverityLabel, StickSlipEvent, TorsionalFrequency,
    ValidationMetrics,
};
use crate::volve::IngestSummary;

const SECONDS_PER_DAY: f64 = 86_400.0;

// ============================================================================
// Telemetry rows
// ============================================================================

/// One flattened telemetry row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRow {
    /// Seconds since the first sample of the run
    pub elapsed_s: f64,
    pub bit_depth_m: f64,
    pub rpm: f64,
    pub torque_knm: f64,
    pub wob_kkgf: f64,
    pub rop_mh: Option<f64>,
    pub mwd_pktopk: Option<f64>,
    pub rpm_ssi: Option<f64>,
    pub torque_deviation: Option<f64>,
    pub mwd_ssi: f64,
    pub css: Option<f64>,
    pub severity: SeverityLabel,
    pub torque_spike: bool,
    pub stick_slip_flag: bool,
    pub event_id: u32,
    pub ctrl_state: ControllerState,
    pub ctrl_action: ActionTag,
    /// Audit text with setpoint detail
    pub ctrl_detail: String,
    pub wob_setpoint: f64,
    pub rpm_setpoint: f64,
    pub sim_rpm: f64,
    pub sim_torque: f64,
    pub sim_rop: f64,
    pub twist_rad: f64,
}

impl TelemetryRow {
    fn from_sample(s: &EnrichedSample, t0: f64) -> Self {
        Self {
            elapsed_s: s.sample.time_s - t0,
            bit_depth_m: s.sample.bit_depth_m,
            rpm: s.sample.rpm,
            torque_knm: s.sample.torque_knm,
            wob_kkgf: s.sample.wob_kkgf,
            rop_mh: s.sample.rop_mh,
            mwd_pktopk: s.sample.mwd_pktopk,
            rpm_ssi: s.signals.rpm_ssi,
            torque_deviation: s.signals.torque_deviation,
            mwd_ssi: s.signals.mwd_ssi,
            css: s.signals.css,
            severity: s.signals.severity_label,
            torque_spike: s.signals.torque_spike,
            stick_slip_flag: s.event.stick_slip_flag,
            event_id: s.event.event_id,
            ctrl_state: s.control.state,
            ctrl_action: s.control.action,
            ctrl_detail: s.control.to_string(),
            wob_setpoint: s.control.wob_setpoint,
            rpm_setpoint: s.control.rpm_setpoint,
            sim_rpm: s.response.sim_rpm,
            sim_torque: s.response.sim_torque,
            sim_rop: s.response.sim_rop,
            twist_rad: s.response.twist_rad,
        }
    }
}

/// Every `downsample`-th row (0 is treated as 1), elapsed time from zero.
pub fn telemetry_rows(samples: &[EnrichedSample], downsample: usize) -> Vec<TelemetryRow> {
    let Some(first) = samples.first() else {
        return Vec::new();
    };
    let t0 = first.sample.time_s;
    samples
        .iter()
        .step_by(downsample.max(1))
        .map(|s| TelemetryRow::from_sample(s, t0))
        .collect()
}

// ============================================================================
// Metadata
// ============================================================================

/// Detection parameters in effect for the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    pub css_threshold: f64,
    pub min_duration_s: f64,
    pub min_event_samples: usize,
    pub window_s: f64,
    pub window_samples: usize,
    pub baseline_window_samples: usize,
    pub median_dt_s: Option<f64>,
    pub weight_mwd: f64,
    pub weight_torque: f64,
    pub weight_rpm: f64,
}

/// Controller configuration and outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerSummary {
    pub nominal: NominalSetpoints,
    pub css_engage: f64,
    pub css_recovery: f64,
    pub kp_wob: f64,
    pub kp_rpm: f64,
    pub wob_min_fraction: f64,
    pub rpm_max_increase: f64,
    pub recovery_hold_s: f64,
    pub engagements: usize,
    pub state_distribution: StateDistribution,
    /// Lowest WOB setpoint issued (kkgf)
    pub min_wob_setpoint: f64,
    /// Highest RPM setpoint issued
    pub max_rpm_setpoint: f64,
}

/// Closed (min, max) interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    fn of(values: impl Iterator<Item = f64>) -> Option<Self> {
        values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
            None => Some(Self { min: v, max: v }),
            Some(r) => Some(Self {
                min: r.min.min(v),
                max: r.max.max(v),
            }),
        })
    }
}

/// Output ranges of the torsional simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorSummary {
    pub sim_rpm: Option<Range>,
    pub sim_torque: Option<Range>,
    pub sim_rop: Option<Range>,
    pub twist_rad: Option<Range>,
}

/// Run-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub well: WellInfo,
    pub generated_at: DateTime<Utc>,
    /// Present when the run was fed from a CSV
    pub ingest: Option<IngestSummary>,
    pub samples: usize,
    pub flagged_samples: usize,
    pub duration_s: f64,
    pub duration_days: f64,
    pub depth_range_m: Option<Range>,
    pub total_events: usize,
    pub events_by_severity: BTreeMap<SeverityLabel, usize>,
    pub mwd_max_pktopk: Option<f64>,
    pub detection: DetectionParams,
    pub signals: SignalSummary,
    pub validation: Option<ValidationMetrics>,
    pub torsional: TorsionalFrequency,
    pub controller: ControllerSummary,
    pub simulator: SimulatorSummary,
}

/// Everything the `autodriller` binary writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub telemetry: Vec<TelemetryRow>,
    pub events: Vec<StickSlipEvent>,
    pub metadata: RunMetadata,
}

/// Assemble run metadata from a pipeline output.
pub fn build_metadata(
    output: &PipelineOutput,
    config: &WellConfig,
    ingest: Option<&IngestSummary>,
) -> RunMetadata {
    let samples = &output.samples;
    let duration_s = match (samples.first(), samples.last()) {
        (Some(a), Some(b)) => b.sample.time_s - a.sample.time_s,
        _ => 0.0,
    };

    let events_by_severity = count_by_severity(&output.events)
        .into_iter()
        .filter(|(label, _)| *label != SeverityLabel::Stable)
        .collect();

    let mwd_max_pktopk = samples
        .iter()
        .filter_map(|s| s.sample.mwd_pktopk)
        .filter(|v| v.is_finite())
        .reduce(f64::max);

    let sig = &config.signals;
    let detection = DetectionParams {
        css_threshold: config.detection.css_threshold,
        min_duration_s: config.detection.min_duration_s,
        min_event_samples: output.min_event_samples,
        window_s: sig.window_s,
        window_samples: output.window.window_samples,
        baseline_window_samples: output.window.baseline_window_samples,
        median_dt_s: output.window.median_dt_s,
        weight_mwd: sig.weight_mwd,
        weight_torque: sig.weight_torque,
        weight_rpm: sig.weight_rpm,
    };

    let ctrl = &config.controller;
    let controller = ControllerSummary {
        nominal: output.nominal,
        css_engage: ctrl.css_engage,
        css_recovery: ctrl.css_recovery,
        kp_wob: ctrl.kp_wob,
        kp_rpm: ctrl.kp_rpm,
        wob_min_fraction: ctrl.wob_min_fraction,
        rpm_max_increase: ctrl.rpm_max_increase,
        recovery_hold_s: ctrl.recovery_hold_s,
        engagements: output.engagements,
        state_distribution: output.distribution,
        min_wob_setpoint: samples
            .iter()
            .map(|s| s.control.wob_setpoint)
            .fold(output.nominal.wob_kkgf, f64::min),
        max_rpm_setpoint: samples
            .iter()
            .map(|s| s.control.rpm_setpoint)
            .fold(output.nominal.rpm, f64::max),
    };

    let simulator = SimulatorSummary {
        sim_rpm: Range::of(samples.iter().map(|s| s.response.sim_rpm)),
        sim_torque: Range::of(samples.iter().map(|s| s.response.sim_torque)),
        sim_rop: Range::of(samples.iter().map(|s| s.response.sim_rop)),
        twist_rad: Range::of(samples.iter().map(|s| s.response.twist_rad)),
    };

    RunMetadata {
        well: config.well.clone(),
        generated_at: Utc::now(),
        ingest: ingest.cloned(),
        samples: samples.len(),
        flagged_samples: samples.iter().filter(|s| s.event.stick_slip_flag).count(),
        duration_s,
        duration_days: duration_s / SECONDS_PER_DAY,
        depth_range_m: Range::of(samples.iter().map(|s| s.sample.bit_depth_m)),
        total_events: output.events.len(),
        events_by_severity,
        mwd_max_pktopk,
        detection,
        signals: output.signal_summary.clone(),
        validation: output.validation.clone(),
        torsional: output.torsional,
        controller,
        simulator,
    }
}

/// Assemble all three documents.
pub fn build_report(
    output: &PipelineOutput,
    config: &WellConfig,
    ingest: Option<&IngestSummary>,
    downsample: usize,
) -> RunReport {
    RunReport {
        telemetry: telemetry_rows(&output.samples, downsample),
        events: output.events.clone(),
        metadata: build_metadata(output, config, ingest),
    }
}
