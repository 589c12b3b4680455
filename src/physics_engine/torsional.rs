//! Lumped torsional drill-string model driven by controller setpoints
//!
//! Equation of motion (single inertia, spring, viscous damper, Coulomb bit):
//!
//! ```text
//! I·dω/dt = T_drive − k·θ − c·ω − τ_bit
//! τ_bit   = μ · WOB · g · r_bit
//! T_drive = k·kp·(ω_set − ω) + c·ff·ω_set
//! dθ/dt   = ω − ω_set
//! ```
//!
//! Integrated with explicit Euler. Each sample interval is split into equal
//! sub-steps no longer than `max_substep_s`; only ω and θ carry across
//! samples. A `max_substep_s` at or above `max_dt_s` gives one step per
//! sample.
//!
//! Under constant setpoints θ settles at [`steady_state_twist`], which is
//! zero only when the feed-forward covers the full damping (`ff = 1`).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::config::TorsionalModelConfig;
use crate::types::SimulatedResponse;

/// rpm → rad/s
pub const RPM_TO_RAD_S: f64 = 2.0 * PI / 60.0;

/// Bit-rock Coulomb friction torque (kN·m) for a WOB in kkgf.
///
/// τ = μ × WOB × g × r_bit (Pessier & Fear, simplified)
pub fn friction_torque(wob_kkgf: f64, config: &TorsionalModelConfig) -> f64 {
    config.friction_coefficient * wob_kkgf * config.gravity * config.bit_radius_m
}

/// Bingham-style rate of penetration (m/h).
///
/// ROP = a × max(0, WOB − WOB_th)^b × (N / N_ref)^e
pub fn rate_of_penetration(wob_kkgf: f64, rpm: f64, config: &TorsionalModelConfig) -> f64 {
    let wob_eff = (wob_kkgf - config.rop_wob_threshold).max(0.0);
    let n = rpm.max(0.0);
    config.rop_coefficient
        * wob_eff.powf(config.rop_wob_exponent)
        * (n / config.rop_rpm_reference).powf(config.rop_rpm_exponent)
}

/// Carried integrator state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorsionalState {
    /// Angular velocity (rad/s), never negative
    pub omega_rad_s: f64,
    /// Accumulated twist (rad), clamped to ±max_twist_rad
    pub twist_rad: f64,
}

/// Forward simulator over a sequence of setpoints.
#[derive(Debug, Clone)]
pub struct TorsionalSimulator {
    config: TorsionalModelConfig,
    state: TorsionalState,
    prev_time_s: Option<f64>,
}

impl TorsionalSimulator {
    /// Start spinning at `initial_rpm` with no twist.
    pub fn new(config: TorsionalModelConfig, initial_rpm: f64) -> Self {
        Self {
            state: TorsionalState {
                omega_rad_s: (initial_rpm * RPM_TO_RAD_S).max(0.0),
                twist_rad: 0.0,
            },
            config,
            prev_time_s: None,
        }
    }

    pub fn state(&self) -> TorsionalState {
        self.state
    }

    /// Interval for the sample at `time_s`, clamped to the configured range.
    fn interval(&self, time_s: f64) -> f64 {
        let raw = match self.prev_time_s {
            Some(prev) => time_s - prev,
            None => self.config.initial_dt_s,
        };
        if raw.is_finite() {
            raw.clamp(self.config.min_dt_s, self.config.max_dt_s)
        } else {
            self.config.initial_dt_s
        }
    }

    /// Integrate one sample interval under the given setpoints.
    pub fn step(&mut self, time_s: f64, wob_setpoint: f64, rpm_setpoint: f64) -> SimulatedResponse {
        let cfg = &self.config;
        let dt = self.interval(time_s);
        self.prev_time_s = Some(time_s);

        // Saturating cast: dt ≤ max_dt_s and max_substep_s > 0
        let substeps = (dt / cfg.max_substep_s).ceil().max(1.0) as usize;
        let h = dt / substeps as f64;

        let omega_set = rpm_setpoint * RPM_TO_RAD_S;
        let tau_bit = friction_torque(wob_setpoint, cfg);
        let k = cfg.stiffness;
        let c = cfg.damping;

        let mut omega = self.state.omega_rad_s;
        let mut theta = self.state.twist_rad;
        let mut t_drive = 0.0;

        for _ in 0..substeps {
            t_drive = k * cfg.drive_kp_fraction * (omega_set - omega)
                + c * cfg.drive_damping_fraction * omega_set;
            let net = t_drive - k * theta - c * omega - tau_bit;
            let alpha = (net / cfg.inertia).clamp(-cfg.max_angular_accel, cfg.max_angular_accel);
            omega = (omega + alpha * h).max(0.0);
            theta = (theta + (omega - omega_set) * h).clamp(-cfg.max_twist_rad, cfg.max_twist_rad);
        }

        self.state = TorsionalState {
            omega_rad_s: omega,
            twist_rad: theta,
        };

        let rpm = omega / RPM_TO_RAD_S;
        SimulatedResponse {
            sim_rpm: rpm.clamp(0.0, cfg.max_sim_rpm),
            sim_torque: (t_drive - tau_bit).abs().clamp(0.0, cfg.max_sim_torque),
            sim_rop: rate_of_penetration(wob_setpoint, rpm, cfg).clamp(0.0, cfg.max_sim_rop),
            twist_rad: theta,
        }
    }
}

/// Steady-state twist for constant setpoints: θ* = −((1 − ff)·c·ω_set + τ_bit) / k.
pub fn steady_state_twist(wob_kkgf: f64, rpm: f64, config: &TorsionalModelConfig) -> f64 {
    let omega_set = rpm * RPM_TO_RAD_S;
    -((1.0 - config.drive_damping_fraction) * config.damping * omega_set
        + friction_torque(wob_kkgf, config))
        / config.stiffness
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(config: &TorsionalModelConfig, n: usize, dt: f64, wob: f64, rpm: f64) -> (TorsionalSimulator, Vec<SimulatedResponse>) {
        let mut sim = TorsionalSimulator::new(config.clone(), rpm);
        let out = (0..n).map(|i| sim.step(i as f64 * dt, wob, rpm)).collect();
        (sim, out)
    }

    #[test]
    fn test_friction_torque_12_25_bit() {
        let tau = friction_torque(10.0, &TorsionalModelConfig::default());
        assert!((tau - 0.55 * 10.0 * 9.81 * 0.155).abs() < 1e-12);
    }

    #[test]
    fn test_rop_model() {
        let cfg = TorsionalModelConfig::default();
        assert_eq!(rate_of_penetration(1.0, 120.0, &cfg), 0.0, "below WOB threshold");
        let rop = rate_of_penetration(11.2, 80.0, &cfg);
        assert!((rop - 2.8 * 10.0_f64.powf(0.6)).abs() < 1e-9);
    }

    #[test]
    fn test_converges_to_setpoint_and_steady_twist() {
        let cfg = TorsionalModelConfig::default();
        let (sim, out) = run(&cfg, 600, 1.0, 10.0, 120.0);
        let last = out.last().unwrap();
        assert!((last.sim_rpm - 120.0).abs() < 1e-3, "ω → ω_set, got {}", last.sim_rpm);

        let expected = steady_state_twist(10.0, 120.0, &cfg);
        assert!((expected + 1.046).abs() < 1e-3);
        assert!((sim.state().twist_rad - expected).abs() < 1e-3);

        // |c·ff·ω_set − τ_bit|
        let expected_torque = (40.0 * 0.08 * 120.0 * RPM_TO_RAD_S - friction_torque(10.0, &cfg)).abs();
        assert!((last.sim_torque - expected_torque).abs() < 1e-2);
    }

    #[test]
    fn test_zero_wob_default_settles_at_feed_forward_twist() {
        let cfg = TorsionalModelConfig::default();
        let (sim, out) = run(&cfg, 600, 1.0, 0.0, 120.0);
        assert!((out[599].sim_rpm - 120.0).abs() < 1e-3);

        // Only the viscous loss not covered by the 8% feed-forward remains
        let expected = steady_state_twist(0.0, 120.0, &cfg);
        assert!((expected + 0.92 * 40.0 * 120.0 * RPM_TO_RAD_S / 450.0).abs() < 1e-12);
        assert!((sim.state().twist_rad - expected).abs() < 1e-3, "got {}", sim.state().twist_rad);
    }

    #[test]
    fn test_full_feed_forward_settles_at_zero_twist() {
        let cfg = TorsionalModelConfig {
            drive_damping_fraction: 1.0,
            ..TorsionalModelConfig::default()
        };
        let (sim, out) = run(&cfg, 300, 1.0, 0.0, 120.0);
        assert!(sim.state().twist_rad.abs() < 1e-9);
        assert!((out[299].sim_rpm - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_intervals_stay_bounded() {
        let cfg = TorsionalModelConfig::default();
        let (sim, out) = run(&cfg, 200, 30.0, 10.0, 120.0);
        for r in &out {
            assert!((0.0..=300.0).contains(&r.sim_rpm));
            assert!((0.0..=60.0).contains(&r.sim_torque));
            assert!((0.0..=200.0).contains(&r.sim_rop));
        }
        assert!((out[199].sim_rpm - 120.0).abs() < 1e-3, "sub-stepping keeps 30 s steps stable");
        assert!(sim.state().twist_rad.abs() <= 5.0);
    }

    #[test]
    fn test_substep_at_max_dt_is_single_euler_step() {
        let cfg = TorsionalModelConfig {
            max_substep_s: 30.0,
            ..TorsionalModelConfig::default()
        };
        let mut sim = TorsionalSimulator::new(cfg.clone(), 120.0);
        let r = sim.step(0.0, 10.0, 120.0);

        // First interval is 4 s, started exactly at ω_set with no twist
        let omega_set = 120.0 * RPM_TO_RAD_S;
        let net = -(1.0 - cfg.drive_damping_fraction) * cfg.damping * omega_set - friction_torque(10.0, &cfg);
        let alpha = net / cfg.inertia;
        assert!((sim.state().omega_rad_s - (omega_set + alpha * 4.0)).abs() < 1e-12);
        assert!((r.twist_rad - alpha * 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_interval_clamp() {
        let mut sim = TorsionalSimulator::new(TorsionalModelConfig::default(), 120.0);
        assert_eq!(sim.interval(0.0), 4.0, "first sample uses the initial interval");
        sim.step(0.0, 10.0, 120.0);
        assert_eq!(sim.interval(0.1), 0.5);
        assert_eq!(sim.interval(3600.0), 30.0);
    }

    #[test]
    fn test_omega_never_negative() {
        let cfg = TorsionalModelConfig::default();
        let mut sim = TorsionalSimulator::new(cfg, 120.0);
        for i in 0..200 {
            let r = sim.step(f64::from(i), 40.0, 0.0);
            assert!(r.sim_rpm >= 0.0);
            assert!(sim.state().omega_rad_s >= 0.0);
        }
    }
}
