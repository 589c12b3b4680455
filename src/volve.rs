//! Volve Field Time-Log Ingestion Adapter
//!
//! Parses Equinor's Volve real-time drilling export (the Kaggle CSV with
//! descriptive, unit-suffixed column names such as "Averaged WOB kkgf") into
//! cleaned, on-bottom [`TelemetrySample`]s ready for the pipeline.
//!
//! Cleaning applied, in order:
//!
//! 1. Rows without a usable timestamp are counted as errors and dropped
//! 2. On-bottom filter on the raw readings: WOB (clipped at 0) >
//!    `min_wob_kkgf` and RPM > `min_rpm`; a blank WOB or RPM fails
//! 3. Sort by time, drop duplicate timestamps (first surviving row wins)
//! 4. ROP spikes above `rop_spike_factor` × the `rop_cap_quantile` quantile
//!    blanked, then gaps linearly interpolated up to `rop_interp_limit` rows
//! 5. Bit depth forward- then back-filled over dropouts
//! 6. Torque clipped to ±`max_torque_abs_knm`
//!
//! Elapsed time comes from the parsed date-time column when present
//! (seconds since the earliest row), otherwise from the numeric `Time s`.
//!
//! # Usage
//!
//! ```ignore
//! use torsional_autodriller::config::IngestConfig;
//! use torsional_autodriller::volve;
//!
//! let (samples, summary) = volve::load_csv("F-9A time.csv", &IngestConfig::default())?;
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::defaults::{
    COL_BIT_DEPTH, COL_DATETIME, COL_MWD_PKTOPK, COL_ROP, COL_RPM, COL_TIME_S, COL_TORQUE, COL_WOB,
};
use crate::config::IngestConfig;
use crate::processing::rolling::percentile;
use crate::types::TelemetrySample;

/// Parse errors logged individually before going quiet.
const MAX_LOGGED_ERRORS: usize = 10;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is empty")]
    Empty(PathBuf),

    #[error("{path} is missing required columns: {}", missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    #[error("no on-bottom rows in {path} ({rows_read} read, {errors} unparseable)")]
    NoUsableRows {
        path: PathBuf,
        rows_read: usize,
        errors: usize,
    },
}

// ============================================================================
// CSV Quote-Aware Parsing
// ============================================================================

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

// ============================================================================
// Column Mapping
// ============================================================================

/// Index of each known column in the header row.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct ColumnMap {
    time_s: Option<usize>,
    datetime: Option<usize>,
    rpm: Option<usize>,
    torque: Option<usize>,
    wob: Option<usize>,
    rop: Option<usize>,
    bit_depth: Option<usize>,
    mwd_pktopk: Option<usize>,
}

impl ColumnMap {
    /// Match header names case-insensitively; the first occurrence wins.
    fn from_header(header: &str) -> Self {
        let mut map = Self::default();
        for (idx, col) in csv_split(header).iter().enumerate() {
            let name = col.trim().trim_start_matches('\u{feff}');
            let slot = if name.eq_ignore_ascii_case(COL_TIME_S) {
                &mut map.time_s
            } else if name.eq_ignore_ascii_case(COL_DATETIME) {
                &mut map.datetime
            } else if name.eq_ignore_ascii_case(COL_RPM) {
                &mut map.rpm
            } else if name.eq_ignore_ascii_case(COL_TORQUE) {
                &mut map.torque
            } else if name.eq_ignore_ascii_case(COL_WOB) {
                &mut map.wob
            } else if name.eq_ignore_ascii_case(COL_ROP) {
                &mut map.rop
            } else if name.eq_ignore_ascii_case(COL_BIT_DEPTH) {
                &mut map.bit_depth
            } else if name.eq_ignore_ascii_case(COL_MWD_PKTOPK) {
                &mut map.mwd_pktopk
            } else {
                continue;
            };
            slot.get_or_insert(idx);
        }
        map
    }

    /// Names of required columns absent from the header.
    fn missing(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.time_s.is_none() && self.datetime.is_none() {
            missing.push(format!("{COL_TIME_S} or {COL_DATETIME}"));
        }
        for (name, idx) in [
            (COL_RPM, self.rpm),
            (COL_TORQUE, self.torque),
            (COL_WOB, self.wob),
            (COL_BIT_DEPTH, self.bit_depth),
        ] {
            if idx.is_none() {
                missing.push(name.to_string());
            }
        }
        missing
    }
}

// ============================================================================
// Summary
// ============================================================================

/// What the adapter read and what it kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub source: String,
    /// Data rows in the file (header excluded, blank lines ignored)
    pub rows_read: usize,
    /// On-bottom rows handed to the pipeline
    pub rows_kept: usize,
    /// Rows removed by the on-bottom filter
    pub rows_off_bottom: usize,
    /// Rows sharing a timestamp with an earlier row
    pub rows_duplicate: usize,
    /// Rows with no parseable timestamp
    pub rows_error: usize,
    /// Kept rows carrying a downhole stick-slip reading
    pub mwd_rows: usize,
    /// Elapsed time from the parsed date-time column rather than `Time s`
    pub time_from_datetime: bool,
    /// (first, last) kept time (s)
    pub time_range_s: (f64, f64),
    /// (min, max) kept bit depth (m)
    pub depth_range_m: (f64, f64),
}

// ============================================================================
// Loading
// ============================================================================

/// Raw row before cleaning.
#[derive(Debug, Clone)]
struct RawRow {
    time_s: f64,
    rpm: Option<f64>,
    torque: Option<f64>,
    wob: Option<f64>,
    rop: Option<f64>,
    depth: Option<f64>,
    mwd: Option<f64>,
}

/// Load and clean a Volve time-log CSV file.
pub fn load_csv(
    path: impl AsRef<Path>,
    config: &IngestConfig,
) -> Result<(Vec<TelemetrySample>, IngestSummary), IngestError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv(BufReader::new(file), path, config)
}

/// Parse and clean CSV content from any buffered reader.
///
/// `path` is only used for error messages and the summary.
pub fn parse_csv<R: BufRead>(
    reader: R,
    path: &Path,
    config: &IngestConfig,
) -> Result<(Vec<TelemetrySample>, IngestSummary), IngestError> {
    let io_err = |source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line.map_err(io_err)?,
        None => return Err(IngestError::Empty(path.to_path_buf())),
    };

    let columns = ColumnMap::from_header(&header);
    let missing = columns.missing();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        });
    }

    let mut rows = Vec::new();
    let mut rows_read = 0usize;
    let mut errors = 0usize;
    let time_from_datetime = columns.datetime.is_some();

    for (line_num, line) in lines.enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        rows_read += 1;

        let fields = csv_split(&line);
        let Some(time_s) = row_time(&fields, &columns) else {
            if errors < MAX_LOGGED_ERRORS {
                warn!(line = line_num + 2, "Row has no parseable timestamp, skipping");
            }
            errors += 1;
            continue;
        };

        rows.push(RawRow {
            time_s,
            rpm: get_f64(&fields, columns.rpm),
            torque: get_f64(&fields, columns.torque),
            wob: get_f64(&fields, columns.wob),
            rop: get_f64(&fields, columns.rop),
            depth: get_f64(&fields, columns.bit_depth),
            mwd: get_f64(&fields, columns.mwd_pktopk),
        });
    }

    if rows_read == 0 {
        return Err(IngestError::Empty(path.to_path_buf()));
    }

    // Datetime seconds are epoch-based; rebase them so elapsed starts at zero
    if time_from_datetime {
        let t0 = rows.iter().map(|r| r.time_s).fold(f64::INFINITY, f64::min);
        for r in &mut rows {
            r.time_s -= t0;
        }
    }

    // On-bottom gate on the raw readings: a blank WOB or RPM is not on bottom
    let parsed = rows.len();
    rows.retain(|r| {
        let wob = r.wob.map(|w| w.max(0.0));
        matches!((wob, r.rpm), (Some(w), Some(rpm)) if w > config.min_wob_kkgf && rpm > config.min_rpm)
    });
    let rows_off_bottom = parsed - rows.len();

    rows.sort_by(|a, b| a.time_s.total_cmp(&b.time_s));
    let before = rows.len();
    rows.dedup_by(|later, earlier| later.time_s == earlier.time_s);
    let rows_duplicate = before - rows.len();

    let rop = condition_rop(rows.iter().map(|r| r.rop).collect(), config);
    let depth = fill_forward_back(rows.iter().map(|r| r.depth));

    let samples: Vec<TelemetrySample> = rows
        .iter()
        .zip(depth)
        .zip(rop)
        .filter_map(|((r, depth), rop)| {
            let torque = r.torque.map_or(f64::NAN, |t| {
                t.clamp(-config.max_torque_abs_knm, config.max_torque_abs_knm)
            });
            Some(TelemetrySample {
                time_s: r.time_s,
                rpm: r.rpm?,
                torque_knm: torque,
                wob_kkgf: r.wob?.max(0.0),
                bit_depth_m: depth.unwrap_or(f64::NAN),
                mwd_pktopk: r.mwd,
                rop_mh: rop,
            })
        })
        .collect();

    if samples.is_empty() {
        return Err(IngestError::NoUsableRows {
            path: path.to_path_buf(),
            rows_read,
            errors,
        });
    }

    let summary = IngestSummary {
        source: path.display().to_string(),
        rows_read,
        rows_kept: samples.len(),
        rows_off_bottom,
        rows_duplicate,
        rows_error: errors,
        mwd_rows: samples.iter().filter(|s| s.mwd_pktopk.is_some()).count(),
        time_from_datetime,
        time_range_s: (
            samples.first().map_or(0.0, |s| s.time_s),
            samples.last().map_or(0.0, |s| s.time_s),
        ),
        depth_range_m: samples
            .iter()
            .map(|s| s.bit_depth_m)
            .filter(|d| d.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| (lo.min(d), hi.max(d))),
    };

    info!(
        source = %summary.source,
        read = summary.rows_read,
        kept = summary.rows_kept,
        off_bottom = summary.rows_off_bottom,
        duplicates = summary.rows_duplicate,
        errors = summary.rows_error,
        mwd_rows = summary.mwd_rows,
        depth_range = format!("{:.0}-{:.0} m", summary.depth_range_m.0, summary.depth_range_m.1),
        "Volve time log loaded"
    );

    Ok((samples, summary))
}

// ============================================================================
// Helpers
// ============================================================================

/// Row time in seconds.
///
/// The date-time column, when the header has one, is the only time source;
/// mixing it with `Time s` would splice two clocks.
fn row_time(fields: &[String], columns: &ColumnMap) -> Option<f64> {
    match columns.datetime {
        Some(idx) => parse_datetime_seconds(fields.get(idx)?),
        None => get_f64_str(fields.get(columns.time_s?)?),
    }
}

/// Parse a date-time string to fractional Unix seconds.
fn parse_datetime_seconds(s: &str) -> Option<f64> {
    let s = s.trim().trim_matches('"');
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return None;
    }

    let to_secs = |millis: i64| millis as f64 / 1000.0;

    // "2009-06-27 16:50:29+00:00" (Kaggle parsed format)
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"] {
        if let Ok(dt) = chrono::DateTime::parse_from_str(s, fmt) {
            return Some(to_secs(dt.timestamp_millis()));
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(to_secs(dt.timestamp_millis()));
    }

    // Without timezone (assume UTC)
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
    ] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(to_secs(dt.and_utc().timestamp_millis()));
        }
    }
    None
}

/// Finite numeric field, `None` for blanks, NaN markers and garbage.
fn get_f64(fields: &[String], idx: Option<usize>) -> Option<f64> {
    get_f64_str(fields.get(idx?)?)
}

fn get_f64_str(s: &str) -> Option<f64> {
    let s = s.trim().trim_matches('"');
    if s.is_empty() || s == "-" || s.eq_ignore_ascii_case("null") {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Blank ROP spikes, then linearly interpolate short gaps.
///
/// Each gap is filled forward from its last good value for at most
/// `rop_interp_limit` rows; a trailing gap holds the last value and a
/// leading gap stays empty.
fn condition_rop(mut rop: Vec<Option<f64>>, config: &IngestConfig) -> Vec<Option<f64>> {
    let mut present: Vec<f64> = rop.iter().flatten().copied().collect();
    present.sort_by(f64::total_cmp);
    if present.is_empty() {
        return rop;
    }
    let cap = percentile(&present, config.rop_cap_quantile * 100.0) * config.rop_spike_factor;
    for v in rop.iter_mut() {
        if v.is_some_and(|x| x > cap) {
            *v = None;
        }
    }

    let mut prev: Option<usize> = None;
    let mut i = 0;
    while i < rop.len() {
        if rop[i].is_some() {
            prev = Some(i);
            i += 1;
            continue;
        }
        let gap_end = (i..rop.len()).find(|&j| rop[j].is_some());
        let stop = gap_end.unwrap_or(rop.len());
        if let Some((a, va)) = prev.and_then(|a| rop[a].map(|v| (a, v))) {
            let next = gap_end.and_then(|b| rop[b].map(|v| (b, v)));
            let fill_to = stop.min(i + config.rop_interp_limit);
            for (k, slot) in rop.iter_mut().enumerate().take(fill_to).skip(i) {
                *slot = Some(match next {
                    Some((b, vb)) => va + (vb - va) * (k - a) as f64 / (b - a) as f64,
                    None => va,
                });
            }
        }
        i = stop;
    }
    rop
}

/// Forward-fill gaps, then back-fill any leading gap.
fn fill_forward_back(values: impl Iterator<Item = Option<f64>>) -> Vec<Option<f64>> {
    let mut last = None;
    let mut out: Vec<Option<f64>> = values
        .map(|v| {
            if v.is_some() {
                last = v;
            }
            last
        })
        .collect();
    if let Some(first) = out.iter().copied().find(Option::is_some).flatten() {
        for v in out.iter_mut().take_while(|v| v.is_none()) {
            *v = Some(first);
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
