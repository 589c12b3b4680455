//! Stick-slip severity categories

use serde::{Deserialize, Serialize};

/// CSS category boundaries. Fixed by the severity scale, not tunable.
pub mod severity_thresholds {
    /// CSS at or above this is at least MILD
    pub const MILD: f64 = 0.25;
    /// CSS at or above this is at least MODERATE
    pub const MODERATE: f64 = 0.50;
    /// CSS at or above this is SEVERE
    pub const SEVERE: f64 = 0.75;
}

/// Ordered stick-slip severity category derived from the Composite Severity Score.
///
/// | CSS         | Label    | Typical response              |
/// |-------------|----------|-------------------------------|
/// | 0.00 - 0.25 | STABLE   | none                          |
/// | 0.25 - 0.50 | MILD     | monitor                       |
/// | 0.50 - 0.75 | MODERATE | reduce WOB 10-20%             |
/// | 0.75 - 1.00 | SEVERE   | reduce WOB 25-35%, raise RPM  |
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityLabel {
    #[default]
    Stable,
    Mild,
    Moderate,
    Severe,
}

impl SeverityLabel {
    /// Classify a CSS value. Undefined CSS is treated as STABLE.
    pub fn classify(css: Option<f64>) -> Self {
        match css {
            Some(v) if v >= severity_thresholds::SEVERE => Self::Severe,
            Some(v) if v >= severity_thresholds::MODERATE => Self::Moderate,
            Some(v) if v >= severity_thresholds::MILD => Self::Mild,
            _ => Self::Stable,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "STABLE",
            Self::Mild => "MILD",
            Self::Moderate => "MODERATE",
            Self::Severe => "SEVERE",
        }
    }
}

impl std::fmt::Display for SeverityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
