//! Synthetic Telemetry Scenarios
//!
//! Deterministic generator for a stable-baseline-then-stick-slip run:
//!
//! ```text
//! 0 ────────── step_start_s ──── step_start_s + step_duration_s ──── end
//!   stable          MWD PKtoPK = step_pktopk               stable
//!                   (+ optional torque oscillation)
//! ```
//!
//! Gaussian noise is seeded, so the same [`ScenarioConfig`] always produces
//! the same samples. Output can be written in the Volve time-log CSV layout
//! and read back through [`crate::volve`].

use std::f64::consts::PI;
use std::io::{self, Write};

use rand::prelude::*;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::config::defaults::{
    COL_BIT_DEPTH, COL_MWD_PKTOPK, COL_ROP, COL_RPM, COL_TIME_S, COL_TORQUE, COL_WOB,
    SYNTHETIC_SEED,
};
use crate::types::TelemetrySample;

/// Per-channel Gaussian noise (one standard deviation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    pub rpm: f64,
    pub torque_knm: f64,
    pub wob_kkgf: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            rpm: 1.0,
            torque_knm: 0.2,
            wob_kkgf: 0.2,
        }
    }
}

/// Sinusoidal surface-torque oscillation added during the step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorqueOscillation {
    pub freq_hz: f64,
    pub amplitude_knm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub samples: usize,
    pub dt_s: f64,
    pub rpm: f64,
    pub torque_knm: f64,
    pub wob_kkgf: f64,
    pub rop_mh: f64,
    pub start_depth_m: f64,
    pub step_start_s: f64,
    pub step_duration_s: f64,
    /// Downhole peak-to-peak reported during the step (rpm)
    pub step_pktopk: f64,
    pub noise: Option<NoiseConfig>,
    pub oscillation: Option<TorqueOscillation>,
    pub seed: u64,
}

impl Default for ScenarioConfig {
    /// Ten minutes at 1 Hz: 120 rpm / 10 kN·m / 10 kkgf, MWD 200 from 300 s to 360 s.
    fn default() -> Self {
        Self {
            samples: 600,
            dt_s: 1.0,
            rpm: 120.0,
            torque_knm: 10.0,
            wob_kkgf: 10.0,
            rop_mh: 20.0,
            start_depth_m: 2500.0,
            step_start_s: 300.0,
            step_duration_s: 60.0,
            step_pktopk: 200.0,
            noise: None,
            oscillation: None,
            seed: SYNTHETIC_SEED,
        }
    }
}

impl ScenarioConfig {
    fn in_step(&self, t: f64) -> bool {
        t >= self.step_start_s && t < self.step_start_s + self.step_duration_s
    }
}

/// Generate the scenario.
pub fn generate(config: &ScenarioConfig) -> Vec<TelemetrySample> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut gauss = |sigma: f64| -> f64 {
        if sigma > 0.0 {
            let z: f64 = rng.sample(StandardNormal);
            z * sigma
        } else {
            0.0
        }
    };

    (0..config.samples)
        .map(|i| {
            let t = i as f64 * config.dt_s;
            let in_step = config.in_step(t);

            let mut rpm = config.rpm;
            let mut torque = config.torque_knm;
            let mut wob = config.wob_kkgf;
            if let Some(noise) = config.noise {
                rpm += gauss(noise.rpm);
                torque += gauss(noise.torque_knm);
                wob += gauss(noise.wob_kkgf);
            }
            if let (true, Some(osc)) = (in_step, config.oscillation) {
                torque += osc.amplitude_knm * (2.0 * PI * osc.freq_hz * (t - config.step_start_s)).sin();
            }

            let sample = TelemetrySample {
                time_s: t,
                rpm: rpm.max(0.0),
                torque_knm: torque,
                wob_kkgf: wob.max(0.0),
                bit_depth_m: config.start_depth_m + config.rop_mh * t / 3600.0,
                mwd_pktopk: None,
                rop_mh: Some(config.rop_mh),
            };
            if in_step {
                sample.with_mwd(config.step_pktopk)
            } else {
                sample
            }
        })
        .collect()
}

/// The ten-minute reference scenario with no noise.
pub fn round_trip() -> Vec<TelemetrySample> {
    generate(&ScenarioConfig::default())
}

/// Write samples in the Volve time-log CSV layout.
pub fn write_csv<W: Write>(samples: &[TelemetrySample], mut out: W) -> io::Result<()> {
    writeln!(
        out,
        "{COL_TIME_S},{COL_RPM},{COL_TORQUE},{COL_WOB},{COL_ROP},{COL_BIT_DEPTH},{COL_MWD_PKTOPK}"
    )?;
    let opt = |v: Option<f64>| v.map(|x| format!("{x:.4}")).unwrap_or_default();
    for s in samples {
        writeln!(
            out,
            "{:.3},{:.4},{:.4},{:.4},{},{:.4},{}",
            s.time_s,
            s.rpm,
            s.torque_knm,
            s.wob_kkgf,
            opt(s.rop_mh),
            s.bit_depth_m,
            opt(s.mwd_pktopk)
        )?;
    }
    out.flush()
}
