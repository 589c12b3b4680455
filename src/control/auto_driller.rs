//! Auto-Driller: deterministic closed-loop torsional vibration mitigation
//!
//! NORMAL → DETECTING → MITIGATING → RECOVERING → NORMAL
//!
//! On sustained stick-slip the WOB setpoint is cut in proportion to the CSS
//! excess over the engage threshold and the RPM setpoint is raised to push
//! through the torsional resonance. After the CSS has stayed below the
//! recovery threshold for the hold period both setpoints ramp back.
//!
//! The controller sees only the current CSS and elapsed time. A transition
//! sample keeps the setpoints it entered with; the new state's control law
//! applies from the next sample.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ControllerConfig;
use crate::processing::rolling::median;
use crate::types::{ActionTag, ControlAction, ControllerState, DerivedSignals, TelemetrySample};

// ============================================================================
// Nominal Setpoints
// ============================================================================

/// Undisturbed operating targets, established once per run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NominalSetpoints {
    pub wob_kkgf: f64,
    pub rpm: f64,
    /// Samples in the early stable window; below the minimum the whole run was used
    pub stable_samples: usize,
    pub from_stable_window: bool,
}

impl NominalSetpoints {
    /// Medians over the early stable window, else over the whole run,
    /// clamped to the physical minimums.
    ///
    /// Early window: `time <= t0 + nominal_window_s`. Stable: CSS below the
    /// engage threshold, with undefined CSS counted as stable.
    pub fn from_run(
        samples: &[TelemetrySample],
        signals: &[DerivedSignals],
        config: &ControllerConfig,
    ) -> Self {
        let Some(first) = samples.first() else {
            return Self {
                wob_kkgf: config.min_nominal_wob,
                rpm: config.min_nominal_rpm,
                stable_samples: 0,
                from_stable_window: false,
            };
        };
        let window_end = first.time_s + config.nominal_window_s;

        let (stable_wob, stable_rpm): (Vec<f64>, Vec<f64>) = samples
            .iter()
            .zip(signals)
            .filter(|(s, sig)| {
                s.time_s <= window_end && sig.css.map_or(true, |c| c < config.css_engage)
            })
            .map(|(s, _)| (s.wob_kkgf, s.rpm))
            .unzip();

        let stable_samples = stable_wob.len();
        let from_stable_window = stable_samples >= config.min_stable_samples;

        let (wob, rpm) = if from_stable_window {
            (median(&stable_wob), median(&stable_rpm))
        } else {
            let all_wob: Vec<f64> = samples.iter().map(|s| s.wob_kkgf).collect();
            let all_rpm: Vec<f64> = samples.iter().map(|s| s.rpm).collect();
            (median(&all_wob), median(&all_rpm))
        };

        Self {
            wob_kkgf: wob.unwrap_or(0.0).max(config.min_nominal_wob),
            rpm: rpm.unwrap_or(0.0).max(config.min_nominal_rpm),
            stable_samples,
            from_stable_window,
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Carried controller state for one forward pass.
#[derive(Debug, Clone)]
pub struct AutoDriller {
    config: ControllerConfig,
    nominal: NominalSetpoints,
    state: ControllerState,
    wob_setpoint: f64,
    rpm_setpoint: f64,
    detection_start_s: f64,
    recovery_start_s: f64,
    engagements: usize,
}

impl AutoDriller {
    pub fn new(config: ControllerConfig, nominal: NominalSetpoints) -> Self {
        Self {
            config,
            state: ControllerState::Normal,
            wob_setpoint: nominal.wob_kkgf,
            rpm_setpoint: nominal.rpm,
            detection_start_s: 0.0,
            recovery_start_s: 0.0,
            engagements: 0,
            nominal,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn nominal(&self) -> &NominalSetpoints {
        &self.nominal
    }

    /// Mitigation engagements so far.
    pub fn engagements(&self) -> usize {
        self.engagements
    }

    /// Advance one sample.
    pub fn step(&mut self, time_s: f64, css: Option<f64>) -> ControlAction {
        let Some(css) = css else {
            return self.emit(time_s, None, ActionTag::NoData);
        };

        let cfg = &self.config;
        let nom_wob = self.nominal.wob_kkgf;
        let nom_rpm = self.nominal.rpm;

        let action = match self.state {
            ControllerState::Normal => {
                self.wob_setpoint = nom_wob;
                self.rpm_setpoint = nom_rpm;
                if css >= cfg.css_engage {
                    self.state = ControllerState::Detecting;
                    self.detection_start_s = time_s;
                    ActionTag::EventDetected
                } else {
                    ActionTag::Hold
                }
            }

            ControllerState::Detecting => {
                if css < cfg.css_engage {
                    self.state = ControllerState::Normal;
                    ActionTag::TransientCleared
                } else if time_s - self.detection_start_s >= cfg.detection_holdoff_s {
                    self.state = ControllerState::Mitigating;
                    self.engagements += 1;
                    ActionTag::MitigationEngaged
                } else {
                    ActionTag::Hold
                }
            }

            ControllerState::Mitigating => {
                if css < cfg.css_recovery {
                    self.state = ControllerState::Recovering;
                    self.recovery_start_s = time_s;
                    ActionTag::RecoveryPhase
                } else {
                    let excess = (css - cfg.css_engage).max(0.0);
                    self.wob_setpoint = (nom_wob * cfg.wob_min_fraction)
                        .max(nom_wob - cfg.kp_wob * excess * nom_wob);
                    self.rpm_setpoint = (nom_rpm + cfg.rpm_max_increase)
                        .min(nom_rpm + cfg.kp_rpm * excess * cfg.rpm_gain_scale);
                    ActionTag::Mitigating
                }
            }

            ControllerState::Recovering => {
                if css >= cfg.css_engage {
                    self.state = ControllerState::Mitigating;
                    ActionTag::Relapse
                } else if css >= cfg.css_recovery {
                    // Not held below the recovery threshold: restart the clock
                    self.recovery_start_s = time_s;
                    ActionTag::RecoveryHold
                } else if time_s - self.recovery_start_s >= cfg.recovery_hold_s {
                    self.wob_setpoint = nom_wob.min(self.wob_setpoint + cfg.wob_ramp_rate * nom_wob);
                    self.rpm_setpoint = nom_rpm
                        .max(self.rpm_setpoint - cfg.rpm_ramp_rate * cfg.rpm_max_increase);
                    if self.wob_setpoint >= nom_wob * cfg.recovered_fraction {
                        self.rpm_setpoint = nom_rpm;
                        self.state = ControllerState::Normal;
                        ActionTag::FullyRecovered
                    } else {
                        ActionTag::Ramp
                    }
                } else {
                    ActionTag::RecoveryHold
                }
            }
        };

        if !matches!(action, ActionTag::Hold | ActionTag::Mitigating | ActionTag::Ramp | ActionTag::RecoveryHold) {
            debug!(
                time_s,
                css,
                state = %self.state,
                action = %action,
                wob_sp = self.wob_setpoint,
                rpm_sp = self.rpm_setpoint,
                "Controller transition"
            );
        }

        self.emit(time_s, Some(css), action)
    }

    fn emit(&self, time_s: f64, css: Option<f64>, action: ActionTag) -> ControlAction {
        ControlAction {
            time_s,
            state: self.state,
            wob_setpoint: self.wob_setpoint,
            rpm_setpoint: self.rpm_setpoint,
            css_observed: css,
            action,
        }
    }
}

// ============================================================================
// Run
// ============================================================================

/// Samples spent in each state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDistribution {
    pub normal: usize,
    pub detecting: usize,
    pub mitigating: usize,
    pub recovering: usize,
}

impl StateDistribution {
    pub fn from_actions(actions: &[ControlAction]) -> Self {
        actions.iter().fold(Self::default(), |mut acc, a| {
            match a.state {
                ControllerState::Normal => acc.normal += 1,
                ControllerState::Detecting => acc.detecting += 1,
                ControllerState::Mitigating => acc.mitigating += 1,
                ControllerState::Recovering => acc.recovering += 1,
            }
            acc
        })
    }

    pub fn get(&self, state: ControllerState) -> usize {
        match state {
            ControllerState::Normal => self.normal,
            ControllerState::Detecting => self.detecting,
            ControllerState::Mitigating => self.mitigating,
            ControllerState::Recovering => self.recovering,
        }
    }
}

/// Controller output for a whole run.
#[derive(Debug, Clone)]
pub struct ControllerRun {
    pub actions: Vec<ControlAction>,
    pub nominal: NominalSetpoints,
    pub distribution: StateDistribution,
    pub engagements: usize,
}

/// Establish nominal setpoints and step the controller over every sample.
pub fn run_controller(
    samples: &[TelemetrySample],
    signals: &[DerivedSignals],
    config: &ControllerConfig,
) -> ControllerRun {
    let nominal = NominalSetpoints::from_run(samples, signals, config);
    info!(
        wob_kkgf = format!("{:.2}", nominal.wob_kkgf),
        rpm = format!("{:.1}", nominal.rpm),
        stable_samples = nominal.stable_samples,
        from_stable_window = nominal.from_stable_window,
        "AutoDriller nominal"
    );

    let mut controller = AutoDriller::new(config.clone(), nominal);
    let actions: Vec<ControlAction> = samples
        .iter()
        .zip(signals)
        .map(|(s, sig)| controller.step(s.time_s, sig.css))
        .collect();

    let distribution = StateDistribution::from_actions(&actions);
    info!(
        normal = distribution.normal,
        detecting = distribution.detecting,
        mitigating = distribution.mitigating,
        recovering = distribution.recovering,
        engagements = controller.engagements(),
        "Controller state distribution"
    );

    ControllerRun {
        actions,
        nominal,
        distribution,
        engagements: controller.engagements(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SeverityLabel;

    fn nominal(wob: f64, rpm: f64) -> NominalSetpoints {
        NominalSetpoints {
            wob_kkgf: wob,
            rpm,
            stable_samples: 100,
            from_stable_window: true,
        }
    }

    fn controller() -> AutoDriller {
        AutoDriller::new(ControllerConfig::default(), nominal(10.0, 120.0))
    }

    fn sig(css: Option<f64>) -> DerivedSignals {
        DerivedSignals {
            rpm_roll_mean: Some(120.0),
            rpm_roll_std: 0.0,
            rpm_ssi: Some(0.0),
            torque_baseline: Some(10.0),
            torque_roll_std: 0.0,
            torque_deviation: Some(0.0),
            torque_spike: false,
            mwd_ssi: 0.0,
            css,
            severity_label: SeverityLabel::classify(css),
        }
    }

    /// Drive to MITIGATING at the given CSS; returns the next free time.
    fn engage(c: &mut AutoDriller, css: f64) -> f64 {
        let mut t = 0.0;
        while c.state() != ControllerState::Mitigating {
            c.step(t, Some(css));
            t += 1.0;
        }
        t
    }

    #[test]
    fn test_normal_pins_nominal() {
        let mut c = controller();
        let a = c.step(0.0, Some(0.1));
        assert_eq!(a.state, ControllerState::Normal);
        assert_eq!(a.action, ActionTag::Hold);
        assert_eq!((a.wob_setpoint, a.rpm_setpoint), (10.0, 120.0));
    }

    #[test]
    fn test_engage_threshold_held_for_holdoff_mitigates() {
        let mut c = controller();
        let a = c.step(0.0, Some(0.30));
        assert_eq!(a.state, ControllerState::Detecting);
        assert_eq!(a.action, ActionTag::EventDetected);

        for t in 1..25 {
            let a = c.step(f64::from(t), Some(0.30));
            assert_eq!(a.state, ControllerState::Detecting, "t={t}");
        }
        let a = c.step(25.0, Some(0.30));
        assert_eq!(a.state, ControllerState::Mitigating);
        assert_eq!(a.action, ActionTag::MitigationEngaged);
        assert_eq!(c.engagements(), 1);
    }

    #[test]
    fn test_transient_clears_back_to_normal() {
        let mut c = controller();
        c.step(0.0, Some(0.5));
        let a = c.step(5.0, Some(0.29));
        assert_eq!(a.state, ControllerState::Normal);
        assert_eq!(a.action, ActionTag::TransientCleared);
        assert_eq!(c.engagements(), 0);
    }

    #[test]
    fn test_mitigation_law() {
        let mut c = controller();
        let t = engage(&mut c, 0.5);
        let a = c.step(t, Some(0.5));
        // excess 0.2: WOB 10 - 0.3·0.2·10 = 9.4, RPM 120 + 0.15·0.2·10 = 120.3
        assert!((a.wob_setpoint - 9.4).abs() < 1e-12);
        assert!((a.rpm_setpoint - 120.3).abs() < 1e-12);
        assert_eq!(a.action, ActionTag::Mitigating);
    }

    #[test]
    fn test_mitigation_limits() {
        let config = ControllerConfig {
            kp_wob: 10.0,
            kp_rpm: 100.0,
            ..ControllerConfig::default()
        };
        let mut c = AutoDriller::new(config, nominal(10.0, 120.0));
        let t = engage(&mut c, 1.0);
        let a = c.step(t, Some(1.0));
        assert!((a.wob_setpoint - 3.5).abs() < 1e-12, "WOB floored at 35% of nominal");
        assert!((a.rpm_setpoint - 145.0).abs() < 1e-12, "RPM capped at nominal + 25");
    }

    #[test]
    fn test_recovery_keeps_mitigated_setpoints_then_ramps() {
        let mut c = controller();
        let mut t = engage(&mut c, 0.5);
        c.step(t, Some(0.5));
        t += 1.0;

        let a = c.step(t, Some(0.1));
        assert_eq!(a.state, ControllerState::Recovering);
        assert_eq!(a.action, ActionTag::RecoveryPhase);
        assert!((a.wob_setpoint - 9.4).abs() < 1e-12, "transition sample keeps setpoints");
        let recovery_start = t;

        // Hold
        t += 1.0;
        while t - recovery_start < 60.0 {
            let a = c.step(t, Some(0.1));
            assert_eq!(a.action, ActionTag::RecoveryHold);
            assert!((a.wob_setpoint - 9.4).abs() < 1e-12);
            t += 1.0;
        }

        // Ramp: 9.4 → 9.48 → 9.56 → 9.64 → 9.72 → 9.80 (≥ 9.8 = 98%)
        let mut ramps = 0;
        loop {
            let a = c.step(t, Some(0.1));
            t += 1.0;
            if a.action == ActionTag::FullyRecovered {
                assert_eq!(a.state, ControllerState::Normal);
                assert_eq!(a.rpm_setpoint, 120.0, "RPM snaps to nominal");
                break;
            }
            assert_eq!(a.action, ActionTag::Ramp);
            ramps += 1;
            assert!(ramps < 20, "ramp never completed");
        }
        assert!(ramps >= 3);
    }

    #[test]
    fn test_relapse_is_immediate() {
        let mut c = controller();
        let mut t = engage(&mut c, 0.5);
        c.step(t, Some(0.1));
        t += 1.0;
        assert_eq!(c.state(), ControllerState::Recovering);

        let a = c.step(t, Some(0.35));
        assert_eq!(a.state, ControllerState::Mitigating);
        assert_eq!(a.action, ActionTag::Relapse);
        assert_eq!(c.engagements(), 1, "relapse is not a new engagement");
    }

    #[test]
    fn test_hold_clock_restarts_above_recovery_threshold() {
        let mut c = controller();
        let mut t = engage(&mut c, 0.5);
        c.step(t, Some(0.5));
        t += 1.0;
        c.step(t, Some(0.1));
        for _ in 0..50 {
            t += 1.0;
            c.step(t, Some(0.1));
        }
        t += 1.0;
        c.step(t, Some(0.25)); // above recovery, below engage
        let restart = t;
        t += 1.0;
        while t - restart < 60.0 {
            assert_eq!(c.step(t, Some(0.1)).action, ActionTag::RecoveryHold);
            t += 1.0;
        }
        assert_eq!(c.step(t, Some(0.1)).action, ActionTag::Ramp);
    }

    #[test]
    fn test_undefined_css_carries_setpoints() {
        let mut c = controller();
        let t = engage(&mut c, 0.5);
        let a = c.step(t, Some(0.5));
        let b = c.step(t + 1.0, None);
        assert_eq!(b.action, ActionTag::NoData);
        assert_eq!(b.state, ControllerState::Mitigating);
        assert_eq!(b.css_observed, None);
        assert_eq!((b.wob_setpoint, b.rpm_setpoint), (a.wob_setpoint, a.rpm_setpoint));
    }

    #[test]
    fn test_nominal_from_stable_window() {
        let samples: Vec<TelemetrySample> = (0..400)
            .map(|i| {
                let wob = if i < 200 { 12.0 } else { 4.0 };
                TelemetrySample::new(f64::from(i), 110.0, 10.0, wob, 1000.0)
            })
            .collect();
        let signals: Vec<DerivedSignals> = (0..400)
            .map(|i| sig(if i < 5 { None } else { Some(0.1) }))
            .collect();
        let nom = NominalSetpoints::from_run(&samples, &signals, &ControllerConfig::default());
        assert!(nom.from_stable_window);
        assert_eq!(nom.stable_samples, 301, "undefined CSS counts as stable");
        assert_eq!(nom.wob_kkgf, 12.0);
        assert_eq!(nom.rpm, 110.0);
    }

    #[test]
    fn test_nominal_falls_back_and_clamps() {
        let samples: Vec<TelemetrySample> = (0..50)
            .map(|i| TelemetrySample::new(f64::from(i), 20.0, 10.0, 1.0, 1000.0))
            .collect();
        let signals: Vec<DerivedSignals> = (0..50).map(|_| sig(Some(0.9))).collect();
        let nom = NominalSetpoints::from_run(&samples, &signals, &ControllerConfig::default());
        assert!(!nom.from_stable_window);
        assert_eq!(nom.wob_kkgf, 2.0);
        assert_eq!(nom.rpm, 30.0);
    }

    #[test]
    fn test_run_controller_distribution() {
        let samples: Vec<TelemetrySample> = (0..100)
            .map(|i| TelemetrySample::new(f64::from(i), 120.0, 10.0, 10.0, 1000.0))
            .collect();
        let signals: Vec<DerivedSignals> = (0..100)
            .map(|i| sig(Some(if (40..80).contains(&i) { 0.6 } else { 0.0 })))
            .collect();
        let run = run_controller(&samples, &signals, &ControllerConfig::default());
        assert_eq!(run.actions.len(), 100);
        assert_eq!(run.engagements, 1);
        let d = run.distribution;
        assert_eq!(d.normal + d.detecting + d.mitigating + d.recovering, 100);
        assert_eq!(d.detecting, 25);
        assert_eq!(d.get(ControllerState::Mitigating), d.mitigating);
    }
}
