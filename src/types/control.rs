//! Auto-driller controller and torsional simulator output types

use serde::{Deserialize, Serialize};

/// Auto-driller operating state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControllerState {
    /// Setpoints pinned to nominal
    #[default]
    Normal,
    /// CSS above engage threshold, waiting out the holdoff
    Detecting,
    /// Proportional WOB reduction / RPM increase active
    Mitigating,
    /// CSS below recovery threshold, holding then ramping back to nominal
    Recovering,
}

impl ControllerState {
    pub const ALL: [Self; 4] = [Self::Normal, Self::Detecting, Self::Mitigating, Self::Recovering];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Detecting => "DETECTING",
            Self::Mitigating => "MITIGATING",
            Self::Recovering => "RECOVERING",
        }
    }
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit tag describing what the controller did on a sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionTag {
    #[default]
    Hold,
    EventDetected,
    TransientCleared,
    MitigationEngaged,
    Mitigating,
    RecoveryPhase,
    Relapse,
    RecoveryHold,
    Ramp,
    FullyRecovered,
    /// CSS undefined; setpoints carried forward
    NoData,
}

impl std::fmt::Display for ActionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Hold => "hold",
            Self::EventDetected => "event_detected",
            Self::TransientCleared => "transient_cleared",
            Self::MitigationEngaged => "mitigation_engaged",
            Self::Mitigating => "mitigating",
            Self::RecoveryPhase => "recovery_phase",
            Self::Relapse => "relapse",
            Self::RecoveryHold => "recovery_hold",
            Self::Ramp => "ramp",
            Self::FullyRecovered => "fully_recovered",
            Self::NoData => "no_data",
        };
        f.write_str(s)
    }
}

/// One controller decision, emitted per sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlAction {
    pub time_s: f64,
    /// State after this sample's transition
    pub state: ControllerState,
    /// Weight-on-bit setpoint (kkgf)
    pub wob_setpoint: f64,
    /// Rotary speed setpoint (rpm)
    pub rpm_setpoint: f64,
    /// CSS the decision was based on; `None` for no-data samples
    pub css_observed: Option<f64>,
    pub action: ActionTag,
}

impl std::fmt::Display for ControlAction {
    /// Audit text: the tag, plus setpoint detail while mitigating or ramping.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.action {
            ActionTag::Mitigating => write!(
                f,
                "mitigating WOB↓{:.1} RPM↑{:.0}",
                self.wob_setpoint, self.rpm_setpoint
            ),
            ActionTag::Ramp => write!(
                f,
                "ramp WOB→{:.1} RPM→{:.0}",
                self.wob_setpoint, self.rpm_setpoint
            ),
            tag => write!(f, "{tag}"),
        }
    }
}

/// Simulated rig response for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulatedResponse {
    /// Simulated rotary speed (rpm)
    pub sim_rpm: f64,
    /// Simulated surface torque (kN·m)
    pub sim_torque: f64,
    /// Simulated rate of penetration (m/h)
    pub sim_rop: f64,
    /// Drill-string twist carried by the integrator (rad)
    pub twist_rad: f64,
}
