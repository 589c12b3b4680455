//! Config Validation Tests
//!
//! Typo detection (unknown keys with suggestions), consistency rules and
//! physical range checks, exercised independently of the pipeline.

use torsional_autodriller::config::validation::{
    known_config_keys, suggest_correction, validate_physical_ranges, validate_unknown_keys,
};
use torsional_autodriller::config::{ConfigError, WellConfig};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_controller_key_warns_with_suggestion() {
    let toml_str = r#"
[controller]
css_engag = 0.35
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("css_engag"));
    assert_eq!(warnings[0].suggestion.as_deref(), Some("controller.css_engage"));
}

#[test]
fn typo_in_well_section_warns() {
    let toml_str = r#"
[well]
naem = "Test-Well"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].suggestion.as_deref(), Some("well.name"));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[well]
name = "15/9-F-9 A"
field = "Volve"
rig = "Maersk Inspirer"

[signals]
window_s = 90.0

[controller]
css_engage = 0.35
css_recovery = 0.2
"#;
    assert!(validate_unknown_keys(toml_str).is_empty());
}

#[test]
fn garbage_key_gets_no_suggestion() {
    let warnings = validate_unknown_keys("[physics]\nzzzzzzzzzzzz = 1.0\n");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].suggestion.is_none());
}

#[test]
fn every_default_key_is_known() {
    let known = known_config_keys();
    let defaults = WellConfig::default().to_toml().unwrap();
    assert!(validate_unknown_keys(&defaults).is_empty());
    assert!(known.contains("physics.bit_radius_m"));
    assert!(known.contains("ingest.max_torque_abs_knm"));
    assert!(known.contains("ingest.rop_interp_limit"));
    assert_eq!(
        suggest_correction("physics.bit_radius", &known).as_deref(),
        Some("physics.bit_radius_m")
    );
}

// ============================================================================
// Consistency Rules
// ============================================================================

fn validation_errors(config: &WellConfig) -> Vec<String> {
    match config.validate() {
        Ok(()) => Vec::new(),
        Err(ConfigError::Validation(errors)) => errors,
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
fn defaults_validate() {
    assert!(WellConfig::default().validate().is_ok());
}

#[test]
fn recovery_must_sit_below_engage() {
    let mut config = WellConfig::default();
    config.controller.css_recovery = 0.4;
    let errors = validation_errors(&config);
    assert!(errors.iter().any(|e| e.contains("css_recovery")));
}

#[test]
fn weights_must_sum_to_one() {
    let mut config = WellConfig::default();
    config.signals.weight_mwd = 0.9;
    let errors = validation_errors(&config);
    assert!(errors.iter().any(|e| e.contains("sum to ~1.0")));
}

#[test]
fn inverted_spectral_band_rejected() {
    let mut config = WellConfig::default();
    config.spectral.band_low_hz = 0.6;
    let errors = validation_errors(&config);
    assert!(errors.iter().any(|e| e.contains("spectral band")));
}

#[test]
fn nan_anywhere_rejected() {
    let mut config = WellConfig::default();
    config.physics.gravity = f64::NAN;
    let errors = validation_errors(&config);
    assert!(errors.iter().any(|e| e.contains("NaN or Inf")));
}

#[test]
fn all_errors_collected_at_once() {
    let mut config = WellConfig::default();
    config.physics.inertia = 0.0;
    config.physics.stiffness = -1.0;
    config.controller.wob_min_fraction = 1.5;
    assert!(validation_errors(&config).len() >= 3);
}

#[test]
fn invalid_toml_value_rejected_on_parse() {
    let result = WellConfig::from_toml_str("[controller]\ncss_engage = 0.1\ncss_recovery = 0.2\n");
    assert!(matches!(result, Err(ConfigError::Validation(_))));
    let result = WellConfig::from_toml_str("[controller\n");
    assert!(matches!(result, Err(ConfigError::Parse(..))));
}

// ============================================================================
// Physical Ranges
// ============================================================================

#[test]
fn bit_radius_outside_physical_range_is_error() {
    let mut config = WellConfig::default();
    config.physics.bit_radius_m = 1.2;
    let (errors, _) = validate_physical_ranges(&config);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("bit_radius_m"));
}

#[test]
fn rop_conditioning_ranges_checked() {
    let mut config = WellConfig::default();
    config.ingest.rop_cap_quantile = 1.2;
    config.ingest.rop_spike_factor = 0.5;
    let (errors, _) = validate_physical_ranges(&config);
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.contains("rop_cap_quantile")));
    assert!(errors.iter().any(|e| e.contains("rop_spike_factor")));
}

#[test]
fn high_friction_is_warning_not_error() {
    let mut config = WellConfig::default();
    config.physics.friction_coefficient = 2.0;
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty());
    assert_eq!(warnings.len(), 1);
    assert!(config.validate().is_ok());
}

#[test]
fn unusual_window_warns() {
    let mut config = WellConfig::default();
    config.signals.window_s = 3600.0;
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty());
    assert!(warnings.iter().any(|w| w.field == "signals.window_s"));
}

#[test]
fn save_and_reload_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("well_config.toml");
    let mut config = WellConfig::default();
    config.well.name = "F-9A".to_string();
    config.controller.kp_wob = 0.45;
    config.save_to_file(&path).unwrap();

    let loaded = WellConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded.well.name, "F-9A");
    assert!((loaded.controller.kp_wob - 0.45).abs() < 1e-12);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = WellConfig::load_from_file(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::Io(..))));
}
