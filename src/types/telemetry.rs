//! Telemetry sample and per-sample derived signal types

use serde::{Deserialize, Serialize};

use super::{ControlAction, SeverityLabel, SimulatedResponse};

/// One cleaned, on-bottom drilling record.
///
/// Produced by the ingestion adapter (or any caller) in strictly increasing
/// `time_s` order with no duplicate timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Elapsed time (s). Spacing may be irregular.
    pub time_s: f64,
    /// Surface rotary speed (rpm)
    pub rpm: f64,
    /// Average surface torque (kN·m)
    pub torque_knm: f64,
    /// Weight on bit (kkgf)
    pub wob_kkgf: f64,
    /// Bit depth (m)
    pub bit_depth_m: f64,
    /// MWD stick-slip peak-to-peak amplitude (rpm). Only present on survey
    /// rows; `Some(0.0)` means the tool reported no survey at this instant.
    #[serde(default)]
    pub mwd_pktopk: Option<f64>,
    /// Rate of penetration (m/h), if logged
    #[serde(default)]
    pub rop_mh: Option<f64>,
}

impl TelemetrySample {
    /// Convenience constructor for a row without downhole or ROP readings.
    pub fn new(time_s: f64, rpm: f64, torque_knm: f64, wob_kkgf: f64, bit_depth_m: f64) -> Self {
        Self {
            time_s,
            rpm,
            torque_knm,
            wob_kkgf,
            bit_depth_m,
            mwd_pktopk: None,
            rop_mh: None,
        }
    }

    /// Attach a downhole reading.
    pub fn with_mwd(mut self, pktopk: f64) -> Self {
        self.mwd_pktopk = Some(pktopk);
        self
    }
}

/// Rolling features and the Composite Severity Score for one sample.
///
/// `None` means "not yet known" (insufficient history, or the string is not
/// rotating). It is never coerced to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedSignals {
    /// Rolling mean rotary speed (rpm)
    pub rpm_roll_mean: Option<f64>,
    /// Rolling sample std of rotary speed (rpm); 0 with too little history
    pub rpm_roll_std: f64,
    /// Surface stick-slip index (std / mean)
    pub rpm_ssi: Option<f64>,
    /// Rolling median torque (kN·m)
    pub torque_baseline: Option<f64>,
    /// Rolling std of torque (kN·m); 0 with too little history
    pub torque_roll_std: f64,
    /// (torque - baseline) / baseline
    pub torque_deviation: Option<f64>,
    /// Torque exceeded baseline + 1.5σ
    pub torque_spike: bool,
    /// Normalised downhole oscillation ratio, forward-filled, 0-1
    pub mwd_ssi: f64,
    /// Composite Severity Score, 0-1
    pub css: Option<f64>,
    pub severity_label: SeverityLabel,
}

/// Debounced detection result for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventFlag {
    pub stick_slip_flag: bool,
    /// 1-based event id; 0 = no event
    pub event_id: u32,
}

/// A telemetry sample with every stage's output attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedSample {
    pub sample: TelemetrySample,
    pub signals: DerivedSignals,
    pub event: EventFlag,
    pub control: ControlAction,
    pub response: SimulatedResponse,
}
