//! Well Configuration - every detection, control and physics constant as a TOML value
//!
//! Each struct implements `Default` with the calibrated values for the Volve
//! 12.25-in section, so a run with no config file behaves identically to the
//! reference pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "AUTODRILLER_CONFIG";

/// Config file picked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "well_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one analysis run.
///
/// Load with `WellConfig::load()` which searches:
/// 1. `$AUTODRILLER_CONFIG` env var
/// 2. `./well_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WellConfig {
    /// Well / rig identification (reports only)
    #[serde(default)]
    pub well: WellInfo,

    /// Rolling-window signal engine
    #[serde(default)]
    pub signals: SignalConfig,

    /// Event segmentation
    #[serde(default)]
    pub detection: DetectionConfig,

    /// MWD cross-validation
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Torsional FFT
    #[serde(default)]
    pub spectral: SpectralConfig,

    /// Auto-driller state machine
    #[serde(default)]
    pub controller: ControllerConfig,

    /// Torsional drill-string model
    #[serde(default)]
    pub physics: TorsionalModelConfig,

    /// CSV ingestion gate
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl WellConfig {
    /// Load configuration using the standard search order:
    /// 1. `$AUTODRILLER_CONFIG` environment variable
    /// 2. `./well_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), well = %config.well.name, "Loaded well config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(well = %config.well.name, "Loaded well config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path. Unknown keys are logged, invalid
    /// values are an error.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Well config saved");
        Ok(())
    }

    /// Validate all parameters for internal consistency.
    ///
    /// Rules:
    /// - Recovery threshold must sit below the engage threshold
    /// - Fractions must lie in their unit interval
    /// - Divisors and physical constants must be positive
    /// - CSS weights must be non-negative and sum to ~1.0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let s = &self.signals;
        Self::check_positive(s.window_s, "signals.window_s", &mut errors);
        Self::check_positive(s.min_rpm, "signals.min_rpm", &mut errors);
        Self::check_positive(s.torque_baseline_floor_knm, "signals.torque_baseline_floor_knm", &mut errors);
        if s.min_window_samples == 0 || s.fallback_window_samples == 0 {
            errors.push("signals window sample counts must be > 0".to_string());
        }
        if s.min_periods == 0 || s.baseline_min_periods == 0 {
            errors.push("signals min_periods values must be > 0".to_string());
        }
        if s.baseline_window_multiplier == 0 {
            errors.push("signals.baseline_window_multiplier must be > 0".to_string());
        }
        let weights = [s.weight_mwd, s.weight_torque, s.weight_rpm];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            errors.push("signals CSS weights must be finite and non-negative".to_string());
        }
        let weight_sum: f64 = weights.iter().sum();
        if !(0.95..=1.05).contains(&weight_sum) {
            errors.push(format!("signals CSS weights must sum to ~1.0, got {weight_sum:.2}"));
        }

        let d = &self.detection;
        if !(0.0..=1.0).contains(&d.css_threshold) {
            errors.push(format!(
                "detection.css_threshold ({:.3}) must be within [0, 1]",
                d.css_threshold
            ));
        }
        Self::check_positive(d.min_duration_s, "detection.min_duration_s", &mut errors);
        if d.min_debounce_samples == 0 || d.fallback_debounce_samples == 0 {
            errors.push("detection debounce sample counts must be > 0".to_string());
        }

        let v = &self.validation;
        Self::check_positive(v.mwd_max_pktopk, "validation.mwd_max_pktopk", &mut errors);

        let sp = &self.spectral;
        Self::check_positive(sp.segment_s, "spectral.segment_s", &mut errors);
        if sp.band_low_hz < 0.0 || sp.band_low_hz >= sp.band_high_hz {
            errors.push(format!(
                "spectral band [{:.4}, {:.4}] Hz must satisfy 0 <= low < high",
                sp.band_low_hz, sp.band_high_hz
            ));
        }
        if sp.min_samples < 2 {
            errors.push("spectral.min_samples must be >= 2".to_string());
        }

        let c = &self.controller;
        if c.css_recovery >= c.css_engage {
            errors.push(format!(
                "controller.css_recovery ({:.3}) must be less than css_engage ({:.3})",
                c.css_recovery, c.css_engage
            ));
        }
        Self::check_fraction(c.wob_min_fraction, "controller.wob_min_fraction", &mut errors);
        Self::check_fraction(c.wob_ramp_rate, "controller.wob_ramp_rate", &mut errors);
        Self::check_fraction(c.rpm_ramp_rate, "controller.rpm_ramp_rate", &mut errors);
        Self::check_fraction(c.recovered_fraction, "controller.recovered_fraction", &mut errors);
        if c.detection_holdoff_s < 0.0 || c.recovery_hold_s < 0.0 {
            errors.push("controller hold durations cannot be negative".to_string());
        }
        if c.kp_wob < 0.0 || c.kp_rpm < 0.0 || c.rpm_max_increase < 0.0 {
            errors.push("controller gains and rpm_max_increase cannot be negative".to_string());
        }
        if c.min_stable_samples == 0 {
            errors.push("controller.min_stable_samples must be > 0".to_string());
        }

        let p = &self.physics;
        Self::check_positive(p.inertia, "physics.inertia", &mut errors);
        Self::check_positive(p.stiffness, "physics.stiffness", &mut errors);
        Self::check_positive(p.max_substep_s, "physics.max_substep_s", &mut errors);
        if p.min_dt_s <= 0.0 || p.min_dt_s > p.max_dt_s {
            errors.push(format!(
                "physics dt clamp [{:.2}, {:.2}] s must satisfy 0 < min <= max",
                p.min_dt_s, p.max_dt_s
            ));
        }

        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        // Reject NaN/Inf anywhere (sweep all f64 fields via serialization)
        if let Ok(ref serialized) = toml::to_string(self) {
            let non_finite = serialized.lines().any(|line| {
                line.split_once(" = ").is_some_and(|(_, v)| {
                    matches!(v.trim_start_matches(['-', '+']), "nan" | "inf")
                })
            });
            if non_finite {
                errors.push(
                    "Config contains NaN or Inf values; all parameters must be finite numbers"
                        .to_string(),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 {
            errors.push(format!("{name} must be > 0 (got {value})"));
        }
    }

    fn check_fraction(value: f64, name: &str, errors: &mut Vec<String>) {
        if !(value > 0.0 && value <= 1.0) {
            errors.push(format!("{name} must be within (0, 1] (got {value})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Well Info
// ============================================================================

/// Identification metadata. Not used for logic; appears in logs and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellInfo {
    #[serde(default = "default_well_name")]
    pub name: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub rig: String,
    /// Hole section label, e.g. "12.25 in"
    #[serde(default)]
    pub section: String,
}

fn default_well_name() -> String {
    "DEFAULT".to_string()
}

impl Default for WellInfo {
    fn default() -> Self {
        Self {
            name: default_well_name(),
            field: String::new(),
            rig: String::new(),
            section: String::new(),
        }
    }
}

// ============================================================================
// Signal Engine
// ============================================================================

/// Rolling-window feature extraction and CSS fusion weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Primary rolling window (seconds)
    #[serde(default = "default_window_s")]
    pub window_s: f64,

    /// Below this rolling-mean RPM the string is treated as not rotating
    #[serde(default = "default_min_rpm")]
    pub min_rpm: f64,

    /// Floor on the primary window (samples)
    #[serde(default = "default_min_window_samples")]
    pub min_window_samples: usize,

    /// Window used when the median sample interval is undefined (samples)
    #[serde(default = "default_fallback_window_samples")]
    pub fallback_window_samples: usize,

    /// Minimum observations for the primary-window statistics
    #[serde(default = "default_min_periods")]
    pub min_periods: usize,

    /// Torque baseline window = multiplier × primary window
    #[serde(default = "default_baseline_window_multiplier")]
    pub baseline_window_multiplier: usize,

    /// Floor on the torque baseline window (samples)
    #[serde(default = "default_min_baseline_window_samples")]
    pub min_baseline_window_samples: usize,

    /// Minimum observations for the torque baseline median
    #[serde(default = "default_baseline_min_periods")]
    pub baseline_min_periods: usize,

    /// Smallest torque baseline used as a divisor (kN·m)
    #[serde(default = "default_torque_baseline_floor")]
    pub torque_baseline_floor_knm: f64,

    /// Spike = torque above baseline + sigma × rolling std
    #[serde(default = "default_torque_spike_sigma")]
    pub torque_spike_sigma: f64,

    /// Samples a stale MWD reading may be carried forward
    #[serde(default = "default_mwd_ffill_limit")]
    pub mwd_ffill_limit: usize,

    /// CSS weight of the downhole (MWD) ratio
    #[serde(default = "default_weight_mwd")]
    pub weight_mwd: f64,

    /// CSS weight of the surface torque deviation
    #[serde(default = "default_weight_torque")]
    pub weight_torque: f64,

    /// CSS weight of the surface RPM index
    #[serde(default = "default_weight_rpm")]
    pub weight_rpm: f64,
}

fn default_window_s() -> f64 { 60.0 }
fn default_min_rpm() -> f64 { 15.0 }
fn default_min_window_samples() -> usize { 5 }
fn default_fallback_window_samples() -> usize { 15 }
fn default_min_periods() -> usize { 5 }
fn default_baseline_window_multiplier() -> usize { 3 }
fn default_min_baseline_window_samples() -> usize { 30 }
fn default_baseline_min_periods() -> usize { 10 }
fn default_torque_baseline_floor() -> f64 { 0.5 }
fn default_torque_spike_sigma() -> f64 { 1.5 }
fn default_mwd_ffill_limit() -> usize { 8 }
fn default_weight_mwd() -> f64 { 0.60 }
fn default_weight_torque() -> f64 { 0.30 }
fn default_weight_rpm() -> f64 { 0.10 }

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            window_s: default_window_s(),
            min_rpm: default_min_rpm(),
            min_window_samples: default_min_window_samples(),
            fallback_window_samples: default_fallback_window_samples(),
            min_periods: default_min_periods(),
            baseline_window_multiplier: default_baseline_window_multiplier(),
            min_baseline_window_samples: default_min_baseline_window_samples(),
            baseline_min_periods: default_baseline_min_periods(),
            torque_baseline_floor_knm: default_torque_baseline_floor(),
            torque_spike_sigma: default_torque_spike_sigma(),
            mwd_ffill_limit: default_mwd_ffill_limit(),
            weight_mwd: default_weight_mwd(),
            weight_torque: default_weight_torque(),
            weight_rpm: default_weight_rpm(),
        }
    }
}

// ============================================================================
// Event Detection
// ============================================================================

/// Debounced event segmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Raw flag = CSS >= threshold
    #[serde(default = "default_css_threshold")]
    pub css_threshold: f64,

    /// Raw flag must hold this long before the sustained flag rises (s)
    #[serde(default = "default_min_duration_s")]
    pub min_duration_s: f64,

    /// Floor on the debounce window (samples)
    #[serde(default = "default_min_debounce_samples")]
    pub min_debounce_samples: usize,

    /// Debounce window when the median interval is undefined (samples)
    #[serde(default = "default_fallback_debounce_samples")]
    pub fallback_debounce_samples: usize,
}

fn default_css_threshold() -> f64 { 0.25 }
fn default_min_duration_s() -> f64 { 20.0 }
fn default_min_debounce_samples() -> usize { 3 }
fn default_fallback_debounce_samples() -> usize { 5 }

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            css_threshold: default_css_threshold(),
            min_duration_s: default_min_duration_s(),
            min_debounce_samples: default_min_debounce_samples(),
            fallback_debounce_samples: default_fallback_debounce_samples(),
        }
    }
}

// ============================================================================
// MWD Validation
// ============================================================================

/// Cross-validation of CSS against the MWD downhole channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Largest PKtoPK amplitude observed in the dataset (rpm), used to normalise
    #[serde(default = "default_mwd_max_pktopk")]
    pub mwd_max_pktopk: f64,

    /// Normalised MWD at or above this counts as a true stick-slip sample
    #[serde(default = "default_positive_threshold")]
    pub positive_threshold: f64,
}

fn default_mwd_max_pktopk() -> f64 { 400.0 }
fn default_positive_threshold() -> f64 { 0.1 }

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            mwd_max_pktopk: default_mwd_max_pktopk(),
            positive_threshold: default_positive_threshold(),
        }
    }
}

// ============================================================================
// Spectral Analysis
// ============================================================================

/// Torsional frequency estimate of the worst event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectralConfig {
    /// Torque segment length from event onset (s)
    #[serde(default = "default_segment_s")]
    pub segment_s: f64,

    /// Fewer samples than this yields the zero result
    #[serde(default = "default_spectral_min_samples")]
    pub min_samples: usize,

    /// Exclusive lower band edge (Hz), rejects the DC/drift bins
    #[serde(default = "default_band_low_hz")]
    pub band_low_hz: f64,

    /// Exclusive upper band edge (Hz), rejects near-Nyquist bins
    #[serde(default = "default_band_high_hz")]
    pub band_high_hz: f64,
}

fn default_segment_s() -> f64 { 300.0 }
fn default_spectral_min_samples() -> usize { 16 }
fn default_band_low_hz() -> f64 { 0.005 }
fn default_band_high_hz() -> f64 { 0.5 }

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            segment_s: default_segment_s(),
            min_samples: default_spectral_min_samples(),
            band_low_hz: default_band_low_hz(),
            band_high_hz: default_band_high_hz(),
        }
    }
}

// ============================================================================
// Auto-Driller Controller
// ============================================================================

/// Tunable parameters of the auto-driller state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Enter DETECTING (and relapse from RECOVERING) at or above this CSS
    #[serde(default = "default_css_engage")]
    pub css_engage: f64,

    /// Leave MITIGATING below this CSS
    #[serde(default = "default_css_recovery")]
    pub css_recovery: f64,

    /// Seconds of sustained detection before mitigation engages
    #[serde(default = "default_detection_holdoff_s")]
    pub detection_holdoff_s: f64,

    /// WOB reduction per unit CSS excess (fraction of nominal)
    #[serde(default = "default_kp_wob")]
    pub kp_wob: f64,

    /// WOB floor as a fraction of nominal
    #[serde(default = "default_wob_min_fraction")]
    pub wob_min_fraction: f64,

    /// Fraction of nominal WOB restored per sample while ramping
    #[serde(default = "default_wob_ramp_rate")]
    pub wob_ramp_rate: f64,

    /// RPM increase gain on CSS excess
    #[serde(default = "default_kp_rpm")]
    pub kp_rpm: f64,

    /// Scale applied with `kp_rpm` to convert CSS excess to rpm
    #[serde(default = "default_rpm_gain_scale")]
    pub rpm_gain_scale: f64,

    /// Hard ceiling on the RPM increase above nominal (rpm)
    #[serde(default = "default_rpm_max_increase")]
    pub rpm_max_increase: f64,

    /// Fraction of `rpm_max_increase` removed per sample while ramping
    #[serde(default = "default_rpm_ramp_rate")]
    pub rpm_ramp_rate: f64,

    /// Seconds below the recovery threshold before the ramp starts
    #[serde(default = "default_recovery_hold_s")]
    pub recovery_hold_s: f64,

    /// WOB at or above this fraction of nominal ends the recovery
    #[serde(default = "default_recovered_fraction")]
    pub recovered_fraction: f64,

    /// Length of the early window used for nominal setpoints (s)
    #[serde(default = "default_nominal_window_s")]
    pub nominal_window_s: f64,

    /// Stable early samples required, else the whole run is used
    #[serde(default = "default_min_stable_samples")]
    pub min_stable_samples: usize,

    /// Physical minimum nominal WOB (kkgf)
    #[serde(default = "default_min_nominal_wob")]
    pub min_nominal_wob: f64,

    /// Physical minimum nominal RPM
    #[serde(default = "default_min_nominal_rpm")]
    pub min_nominal_rpm: f64,
}

fn default_css_engage() -> f64 { 0.30 }
fn default_css_recovery() -> f64 { 0.20 }
fn default_detection_holdoff_s() -> f64 { 25.0 }
fn default_kp_wob() -> f64 { 0.30 }
fn default_wob_min_fraction() -> f64 { 0.35 }
fn default_wob_ramp_rate() -> f64 { 0.008 }
fn default_kp_rpm() -> f64 { 0.15 }
fn default_rpm_gain_scale() -> f64 { 10.0 }
fn default_rpm_max_increase() -> f64 { 25.0 }
fn default_rpm_ramp_rate() -> f64 { 0.008 }
fn default_recovery_hold_s() -> f64 { 60.0 }
fn default_recovered_fraction() -> f64 { 0.98 }
fn default_nominal_window_s() -> f64 { 300.0 }
fn default_min_stable_samples() -> usize { 10 }
fn default_min_nominal_wob() -> f64 { 2.0 }
fn default_min_nominal_rpm() -> f64 { 30.0 }

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            css_engage: default_css_engage(),
            css_recovery: default_css_recovery(),
            detection_holdoff_s: default_detection_holdoff_s(),
            kp_wob: default_kp_wob(),
            wob_min_fraction: default_wob_min_fraction(),
            wob_ramp_rate: default_wob_ramp_rate(),
            kp_rpm: default_kp_rpm(),
            rpm_gain_scale: default_rpm_gain_scale(),
            rpm_max_increase: default_rpm_max_increase(),
            rpm_ramp_rate: default_rpm_ramp_rate(),
            recovery_hold_s: default_recovery_hold_s(),
            recovered_fraction: default_recovered_fraction(),
            nominal_window_s: default_nominal_window_s(),
            min_stable_samples: default_min_stable_samples(),
            min_nominal_wob: default_min_nominal_wob(),
            min_nominal_rpm: default_min_nominal_rpm(),
        }
    }
}

// ============================================================================
// Torsional Model
// ============================================================================

/// Lumped single-inertia spring-damper-friction drill-string model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorsionalModelConfig {
    /// Torsional stiffness k (kN·m/rad)
    #[serde(default = "default_stiffness")]
    pub stiffness: f64,

    /// Viscous damping c (kN·m·s/rad)
    #[serde(default = "default_damping")]
    pub damping: f64,

    /// Lumped rotational inertia I
    #[serde(default = "default_inertia")]
    pub inertia: f64,

    /// Bit-rock Coulomb friction coefficient μ
    #[serde(default = "default_friction_coefficient")]
    pub friction_coefficient: f64,

    /// kkgf → kN
    #[serde(default = "default_gravity")]
    pub gravity: f64,

    /// Effective bit radius (m); 0.155 m for a 12.25-in bit
    #[serde(default = "default_bit_radius_m")]
    pub bit_radius_m: f64,

    /// Drive proportional gain as a fraction of stiffness
    #[serde(default = "default_drive_kp_fraction")]
    pub drive_kp_fraction: f64,

    /// Drive damping feed-forward as a fraction of damping × ω_set
    #[serde(default = "default_drive_damping_fraction")]
    pub drive_damping_fraction: f64,

    /// |dω/dt| clamp (rad/s²)
    #[serde(default = "default_max_angular_accel")]
    pub max_angular_accel: f64,

    /// |twist| clamp (rad)
    #[serde(default = "default_max_twist_rad")]
    pub max_twist_rad: f64,

    /// Interval assumed for the first sample (s)
    #[serde(default = "default_initial_dt_s")]
    pub initial_dt_s: f64,

    /// Sample intervals are clamped to [min_dt_s, max_dt_s]
    #[serde(default = "default_min_dt_s")]
    pub min_dt_s: f64,

    #[serde(default = "default_max_dt_s")]
    pub max_dt_s: f64,

    /// Longest explicit Euler sub-step inside one sample interval (s)
    #[serde(default = "default_max_substep_s")]
    pub max_substep_s: f64,

    /// ROP model: coefficient × (WOB - threshold)^wob_exp × (rpm / rpm_ref)^rpm_exp
    #[serde(default = "default_rop_coefficient")]
    pub rop_coefficient: f64,

    #[serde(default = "default_rop_wob_threshold")]
    pub rop_wob_threshold: f64,

    #[serde(default = "default_rop_wob_exponent")]
    pub rop_wob_exponent: f64,

    #[serde(default = "default_rop_rpm_reference")]
    pub rop_rpm_reference: f64,

    #[serde(default = "default_rop_rpm_exponent")]
    pub rop_rpm_exponent: f64,

    /// Output safety bounds
    #[serde(default = "default_max_sim_rpm")]
    pub max_sim_rpm: f64,

    #[serde(default = "default_max_sim_torque")]
    pub max_sim_torque: f64,

    #[serde(default = "default_max_sim_rop")]
    pub max_sim_rop: f64,
}

fn default_stiffness() -> f64 { 450.0 }
fn default_damping() -> f64 { 40.0 }
fn default_inertia() -> f64 { 1800.0 }
fn default_friction_coefficient() -> f64 { 0.55 }
fn default_gravity() -> f64 { 9.81 }
fn default_bit_radius_m() -> f64 { 0.155 }
fn default_drive_kp_fraction() -> f64 { 0.4 }
fn default_drive_damping_fraction() -> f64 { 0.08 }
fn default_max_angular_accel() -> f64 { 50.0 }
fn default_max_twist_rad() -> f64 { 5.0 }
fn default_initial_dt_s() -> f64 { 4.0 }
fn default_min_dt_s() -> f64 { 0.5 }
fn default_max_dt_s() -> f64 { 30.0 }
fn default_max_substep_s() -> f64 { 1.0 }
fn default_rop_coefficient() -> f64 { 2.8 }
fn default_rop_wob_threshold() -> f64 { 1.2 }
fn default_rop_wob_exponent() -> f64 { 0.6 }
fn default_rop_rpm_reference() -> f64 { 80.0 }
fn default_rop_rpm_exponent() -> f64 { 0.4 }
fn default_max_sim_rpm() -> f64 { 300.0 }
fn default_max_sim_torque() -> f64 { 60.0 }
fn default_max_sim_rop() -> f64 { 200.0 }

impl Default for TorsionalModelConfig {
    fn default() -> Self {
        Self {
            stiffness: default_stiffness(),
            damping: default_damping(),
            inertia: default_inertia(),
            friction_coefficient: default_friction_coefficient(),
            gravity: default_gravity(),
            bit_radius_m: default_bit_radius_m(),
            drive_kp_fraction: default_drive_kp_fraction(),
            drive_damping_fraction: default_drive_damping_fraction(),
            max_angular_accel: default_max_angular_accel(),
            max_twist_rad: default_max_twist_rad(),
            initial_dt_s: default_initial_dt_s(),
            min_dt_s: default_min_dt_s(),
            max_dt_s: default_max_dt_s(),
            max_substep_s: default_max_substep_s(),
            rop_coefficient: default_rop_coefficient(),
            rop_wob_threshold: default_rop_wob_threshold(),
            rop_wob_exponent: default_rop_wob_exponent(),
            rop_rpm_reference: default_rop_rpm_reference(),
            rop_rpm_exponent: default_rop_rpm_exponent(),
            max_sim_rpm: default_max_sim_rpm(),
            max_sim_torque: default_max_sim_torque(),
            max_sim_rop: default_max_sim_rop(),
        }
    }
}

// ============================================================================
// Ingestion
// ============================================================================

/// On-bottom drilling gate applied while loading CSV logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Rows with WOB at or below this are off bottom (kkgf)
    #[serde(default = "default_ingest_min_wob")]
    pub min_wob_kkgf: f64,

    /// Rows with RPM at or below this are not rotating
    #[serde(default = "default_ingest_min_rpm")]
    pub min_rpm: f64,

    /// Torque beyond ±this is an instrument glitch (kN·m)
    #[serde(default = "default_max_torque_abs")]
    pub max_torque_abs_knm: f64,

    /// ROP quantile used as the spike reference
    #[serde(default = "default_rop_cap_quantile")]
    pub rop_cap_quantile: f64,

    /// ROP above this multiple of the reference quantile is blanked
    #[serde(default = "default_rop_spike_factor")]
    pub rop_spike_factor: f64,

    /// Longest run of missing ROP rows filled by interpolation
    #[serde(default = "default_rop_interp_limit")]
    pub rop_interp_limit: usize,
}

fn default_ingest_min_wob() -> f64 { 0.5 }
fn default_ingest_min_rpm() -> f64 { 15.0 }
fn default_max_torque_abs() -> f64 { 50.0 }
fn default_rop_cap_quantile() -> f64 { 0.99 }
fn default_rop_spike_factor() -> f64 { 1.5 }
fn default_rop_interp_limit() -> usize { 10 }

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            min_wob_kkgf: default_ingest_min_wob(),
            min_rpm: default_ingest_min_rpm(),
            max_torque_abs_knm: default_max_torque_abs(),
            rop_cap_quantile: default_rop_cap_quantile(),
            rop_spike_factor: default_rop_spike_factor(),
            rop_interp_limit: default_rop_interp_limit(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
