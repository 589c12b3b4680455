//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! The raw TOML is walked as a `toml::Value` tree first and every dotted key
//! is compared against the known field set. Unknown keys only warn; serde
//! still ignores them so an old config never stops a run.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `WellConfig`.
///
/// Maintained by hand alongside the structs in well_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [well]
        "well",
        "well.name",
        "well.field",
        "well.rig",
        "well.section",
        // [signals]
        "signals",
        "signals.window_s",
        "signals.min_rpm",
        "signals.min_window_samples",
        "signals.fallback_window_samples",
        "signals.min_periods",
        "signals.baseline_window_multiplier",
        "signals.min_baseline_window_samples",
        "signals.baseline_min_periods",
        "signals.torque_baseline_floor_knm",
        "signals.torque_spike_sigma",
        "signals.mwd_ffill_limit",
        "signals.weight_mwd",
        "signals.weight_torque",
        "signals.weight_rpm",
        // [detection]
        "detection",
        "detection.css_threshold",
        "detection.min_duration_s",
        "detection.min_debounce_samples",
        "detection.fallback_debounce_samples",
        // [validation]
        "validation",
        "validation.mwd_max_pktopk",
        "validation.positive_threshold",
        // [spectral]
        "spectral",
        "spectral.segment_s",
        "spectral.min_samples",
        "spectral.band_low_hz",
        "spectral.band_high_hz",
        // [controller]
        "controller",
        "controller.css_engage",
        "controller.css_recovery",
        "controller.detection_holdoff_s",
        "controller.kp_wob",
        "controller.wob_min_fraction",
        "controller.wob_ramp_rate",
        "controller.kp_rpm",
        "controller.rpm_gain_scale",
        "controller.rpm_max_increase",
        "controller.rpm_ramp_rate",
        "controller.recovery_hold_s",
        "controller.recovered_fraction",
        "controller.nominal_window_s",
        "controller.min_stable_samples",
        "controller.min_nominal_wob",
        "controller.min_nominal_rpm",
        // [physics]
        "physics",
        "physics.stiffness",
        "physics.damping",
        "physics.inertia",
        "physics.friction_coefficient",
        "physics.gravity",
        "physics.bit_radius_m",
        "physics.drive_kp_fraction",
        "physics.drive_damping_fraction",
        "physics.max_angular_accel",
        "physics.max_twist_rad",
        "physics.initial_dt_s",
        "physics.min_dt_s",
        "physics.max_dt_s",
        "physics.max_substep_s",
        "physics.rop_coefficient",
        "physics.rop_wob_threshold",
        "physics.rop_wob_exponent",
        "physics.rop_rpm_reference",
        "physics.rop_rpm_exponent",
        "physics.max_sim_rpm",
        "physics.max_sim_torque",
        "physics.max_sim_rop",
        // [ingest]
        "ingest",
        "ingest.min_wob_kkgf",
        "ingest.min_rpm",
        "ingest.max_torque_abs_knm",
        "ingest.rop_cap_quantile",
        "ingest.rop_spike_factor",
        "ingest.rop_interp_limit",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively collect every dotted key path in a TOML value tree.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let toml::Value::Table(table) = value {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            keys.extend(walk_toml_keys(v, &path));
        }
    }
    keys
}

// ============================================================================
// Levenshtein Suggestions
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
/// Ties resolve to the lexicographically smallest key.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are reported by serde
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Validate physical ranges on a parsed `WellConfig`.
///
/// Returns (errors, warnings). Errors are impossible values; warnings are
/// plausible but unusual for a rotary-drilled section.
pub fn validate_physical_ranges(
    config: &super::WellConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let p = &config.physics;

    // 2-in slimhole to 36-in conductor
    if !(0.025..=0.46).contains(&p.bit_radius_m) {
        errors.push(format!(
            "physics.bit_radius_m = {:.3} is outside physical range (0.025-0.46 m)",
            p.bit_radius_m
        ));
    }

    if p.friction_coefficient < 0.0 {
        errors.push(format!(
            "physics.friction_coefficient = {:.2} cannot be negative",
            p.friction_coefficient
        ));
    } else if p.friction_coefficient > 1.5 {
        warnings.push(ValidationWarning {
            field: "physics.friction_coefficient".to_string(),
            message: format!(
                "friction_coefficient = {:.2} is outside typical bit-rock range (0-1.5)",
                p.friction_coefficient
            ),
            suggestion: None,
        });
    }

    if p.damping < 0.0 {
        errors.push(format!("physics.damping = {:.1} cannot be negative", p.damping));
    }

    if config.ingest.min_wob_kkgf < 0.0 {
        errors.push(format!(
            "ingest.min_wob_kkgf = {:.2} cannot be negative",
            config.ingest.min_wob_kkgf
        ));
    }

    if config.ingest.max_torque_abs_knm <= 0.0 {
        errors.push(format!(
            "ingest.max_torque_abs_knm = {:.1} must be > 0",
            config.ingest.max_torque_abs_knm
        ));
    }

    if !(0.0..=1.0).contains(&config.ingest.rop_cap_quantile) {
        errors.push(format!(
            "ingest.rop_cap_quantile = {:.3} must be within [0, 1]",
            config.ingest.rop_cap_quantile
        ));
    }

    if config.ingest.rop_spike_factor < 1.0 {
        errors.push(format!(
            "ingest.rop_spike_factor = {:.2} must be >= 1 (below 1 blanks ordinary ROP)",
            config.ingest.rop_spike_factor
        ));
    }

    // Rolling windows: below 5 s is noise, beyond 30 min smears events together
    let w = config.signals.window_s;
    if w > 0.0 && !(5.0..=1800.0).contains(&w) {
        warnings.push(ValidationWarning {
            field: "signals.window_s".to_string(),
            message: format!("window_s = {w:.0} is outside typical range (5-1800 s)"),
            suggestion: None,
        });
    }

    let mwd_max = config.validation.mwd_max_pktopk;
    if mwd_max > 0.0 && !(50.0..=1000.0).contains(&mwd_max) {
        warnings.push(ValidationWarning {
            field: "validation.mwd_max_pktopk".to_string(),
            message: format!(
                "mwd_max_pktopk = {mwd_max:.0} is outside typical range (50-1000 rpm)"
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("holdoff", "holdoff"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("stifness", "stiffness"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [controller]
            css_engage = 0.3
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"controller".to_string()));
        assert!(keys.contains(&"controller.css_engage".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[controller]
css_engag = 0.3
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].field.contains("css_engag"));
        assert_eq!(warnings[0].suggestion.as_deref(), Some("controller.css_engage"));
        assert!(warnings[0].to_string().contains("did you mean"));
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[well]
name = "15/9-F-9 A"
section = "12.25 in"

[signals]
window_s = 45.0

[physics]
stiffness = 500.0
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {:?}", warnings);
    }

    #[test]
    fn test_default_config_keys_are_all_known() {
        let toml_str = crate::config::WellConfig::default().to_toml().unwrap();
        let warnings = validate_unknown_keys(&toml_str);
        assert!(warnings.is_empty(), "Serialized defaults must only use known keys: {:?}", warnings);
    }

    #[test]
    fn test_unknown_section_produces_warning() {
        let warnings = validate_unknown_keys("[mystery]\nvalue = 1\n");
        assert!(warnings.iter().any(|w| w.field == "mystery"));
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_physical_range_defaults_clean() {
        let config = crate::config::WellConfig::default();
        let (errors, warnings) = validate_physical_ranges(&config);
        assert!(errors.is_empty(), "Defaults should produce no errors: {:?}", errors);
        assert!(warnings.is_empty(), "Defaults should produce no warnings: {:?}", warnings);
    }

    #[test]
    fn test_bit_radius_out_of_range() {
        let mut config = crate::config::WellConfig::default();
        config.physics.bit_radius_m = 2.0;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("bit_radius_m")));
    }

    #[test]
    fn test_negative_friction_is_error() {
        let mut config = crate::config::WellConfig::default();
        config.physics.friction_coefficient = -0.1;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("friction_coefficient")));
    }

    #[test]
    fn test_long_window_is_warning() {
        let mut config = crate::config::WellConfig::default();
        config.signals.window_s = 3600.0;
        let (errors, warnings) = validate_physical_ranges(&config);
        assert!(errors.is_empty());
        assert!(warnings.iter().any(|w| w.field == "signals.window_s"));
    }
}
