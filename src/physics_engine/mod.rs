//! Physics Engine Module
//!
//! Deterministic torsional response of the drill string to the auto-driller
//! setpoints. Pure physics, no fitting.

pub mod torsional;

pub use torsional::{
    friction_torque, rate_of_penetration, steady_state_twist, TorsionalSimulator, TorsionalState,
    RPM_TO_RAD_S,
};

use tracing::info;

use crate::config::TorsionalModelConfig;
use crate::types::{ControlAction, SimulatedResponse};

/// Simulate the rig response to a controller trace, one row per action.
///
/// The integrator starts at the first RPM setpoint.
pub fn simulate_response(
    actions: &[ControlAction],
    config: &TorsionalModelConfig,
) -> Vec<SimulatedResponse> {
    let Some(first) = actions.first() else {
        return Vec::new();
    };

    let mut sim = TorsionalSimulator::new(config.clone(), first.rpm_setpoint);
    let out: Vec<SimulatedResponse> = actions
        .iter()
        .map(|a| sim.step(a.time_s, a.wob_setpoint, a.rpm_setpoint))
        .collect();

    let range = |f: fn(&SimulatedResponse) -> f64| {
        out.iter()
            .map(f)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
    };
    let (rpm_lo, rpm_hi) = range(|r| r.sim_rpm);
    let (tq_lo, tq_hi) = range(|r| r.sim_torque);
    let (rop_lo, rop_hi) = range(|r| r.sim_rop);
    info!(
        rpm = format!("{rpm_lo:.1}–{rpm_hi:.1}"),
        torque_knm = format!("{tq_lo:.2}–{tq_hi:.2}"),
        rop_mh = format!("{rop_lo:.1}–{rop_hi:.1}"),
        "Physics model"
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionTag, ControllerState};

    fn action(t: f64, wob: f64, rpm: f64) -> ControlAction {
        ControlAction {
            time_s: t,
            state: ControllerState::Normal,
            wob_setpoint: wob,
            rpm_setpoint: rpm,
            css_observed: Some(0.0),
            action: ActionTag::Hold,
        }
    }

    #[test]
    fn test_one_row_per_action() {
        let actions: Vec<ControlAction> = (0..50).map(|i| action(f64::from(i), 10.0, 120.0)).collect();
        let out = simulate_response(&actions, &TorsionalModelConfig::default());
        assert_eq!(out.len(), 50);
        assert!(out.iter().all(|r| r.sim_rop > 0.0));
    }

    #[test]
    fn test_empty_trace() {
        assert!(simulate_response(&[], &TorsionalModelConfig::default()).is_empty());
    }

    #[test]
    fn test_wob_cut_reduces_rop() {
        let cfg = TorsionalModelConfig::default();
        let mut actions: Vec<ControlAction> = (0..200).map(|i| action(f64::from(i), 10.0, 120.0)).collect();
        for a in actions.iter_mut().skip(100) {
            a.wob_setpoint = 6.0;
        }
        let out = simulate_response(&actions, &cfg);
        assert!(out[150].sim_rop < out[90].sim_rop);
    }
}
