//! Stick-slip event and analysis result types

use serde::{Deserialize, Serialize};

use super::SeverityLabel;

/// A closed, contiguous run of debounced stick-slip samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickSlipEvent {
    /// 1-based, assigned in time order, never reused
    pub event_id: u32,
    pub start_time_s: f64,
    pub end_time_s: f64,
    /// `end_time_s - start_time_s`
    pub duration_s: f64,
    pub sample_count: usize,
    pub mean_depth_m: f64,
    pub peak_css: f64,
    pub mean_css: f64,
    /// Severity label at the (first) peak-CSS sample
    pub severity: SeverityLabel,
    pub mean_wob_kkgf: f64,
    pub mean_rpm: f64,
    /// Highest MWD PKtoPK reading inside the event, if any survey landed in it
    pub peak_mwd_pktopk: Option<f64>,
    /// Mean WOB minus mean controller WOB setpoint (kkgf), once control has run
    pub wob_reduction_kkgf: Option<f64>,
}

/// Agreement between the CSS-based detector and the MWD downhole channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub pearson_r: f64,
    /// Two-tailed p-value of `pearson_r` (Student's t, n-2 dof)
    pub p_value: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub n_samples: usize,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub mwd_mean_pktopk_rpm: f64,
    pub mwd_max_pktopk_rpm: f64,
}

/// Dominant torsional oscillation of the worst event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TorsionalFrequency {
    pub dominant_freq_hz: f64,
    pub period_s: f64,
    pub oscillations_per_minute: f64,
    /// Event the segment was taken from; `None` when no estimate was possible
    pub event_id: Option<u32>,
    /// Torque samples used for the transform
    pub segment_samples: usize,
}

impl TorsionalFrequency {
    /// The defined "no estimate" result.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.dominant_freq_hz == 0.0
    }
}
