//! System-wide default constants.
//!
//! Values that are not operator-tunable and so stay out of `WellConfig`.

// ============================================================================
// Ingestion
// ============================================================================

/// Pseudo-column names of the Volve real-time drilling CSV export.
pub const COL_TIME_S: &str = "Time s";
pub const COL_DATETIME: &str = "DateTime parsed";
pub const COL_RPM: &str = "Averaged RPM rpm";
pub const COL_TORQUE: &str = "Average Surface Torque kN.m";
pub const COL_WOB: &str = "Averaged WOB kkgf";
pub const COL_ROP: &str = "Rate of Penetration m/h";
pub const COL_BIT_DEPTH: &str = "Bit Depth m";
pub const COL_MWD_PKTOPK: &str = "MWD Stick-Slip PKtoPK RPM rpm";

// ============================================================================
// Pipeline Output
// ============================================================================

/// Output file names written by the `autodriller` binary.
pub const TELEMETRY_FILE: &str = "telemetry.json";
pub const EVENTS_FILE: &str = "events.json";
pub const METADATA_FILE: &str = "metadata.json";

/// Default output directory.
pub const DEFAULT_OUT_DIR: &str = "output";

/// Default downsample stride for `telemetry.json`.
///
/// 1 keeps every row; the dashboard export used 2 for a 1 Hz log.
pub const DEFAULT_DOWNSAMPLE: usize = 1;

// ============================================================================
// Synthetic Data
// ============================================================================

/// Fixed seed so generated CSVs are reproducible.
pub const SYNTHETIC_SEED: u64 = 42;

/// Default synthetic run length (samples at 1 Hz). 7 200 = 2 hours.
pub const SYNTHETIC_DEFAULT_SAMPLES: usize = 7_200;
