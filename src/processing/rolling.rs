//! Trailing-window statistics over time-ordered samples
//!
//! Every output index `i` sees the window `[i + 1 - window, i]` (truncated at
//! the start of the series). A window holding fewer than `min_periods`
//! observations yields `None`. Windows are independent, so each statistic is
//! evaluated in parallel with rayon; the result order always matches the
//! input order.

use rayon::prelude::*;

/// Median of a slice. `None` for an empty slice. Even-length slices
/// average the two middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Linear-interpolated percentile of an ascending slice; 0 when empty.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let rank = q / 100.0 * (len - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Median spacing of consecutive timestamps, if it is a usable positive number.
pub fn median_interval(times: &[f64]) -> Option<f64> {
    let diffs: Vec<f64> = times
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| d.is_finite())
        .collect();
    median(&diffs).filter(|dt| *dt > 0.0)
}

/// Convert a duration to a sample count via the median interval.
///
/// `max(floor(duration_s / dt), floor)` when the interval is known, otherwise
/// `fallback`.
pub fn duration_to_samples(
    times: &[f64],
    duration_s: f64,
    floor: usize,
    fallback: usize,
) -> usize {
    match median_interval(times) {
        // Saturating float→int cast; durations are validated positive
        Some(dt) => ((duration_s / dt).floor() as usize).max(floor),
        None => fallback,
    }
}

/// Trailing-window slice ending at `i`.
fn window_at(values: &[f64], i: usize, window: usize) -> &[f64] {
    let start = (i + 1).saturating_sub(window.max(1));
    &values[start..=i]
}

/// Rolling arithmetic mean.
pub fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .into_par_iter()
        .map(|i| {
            let w = window_at(values, i, window);
            (w.len() >= min_periods.max(1)).then(|| w.iter().sum::<f64>() / w.len() as f64)
        })
        .collect()
}

/// Rolling sample standard deviation (n-1 denominator).
///
/// Needs at least two observations regardless of `min_periods`.
pub fn rolling_std(values: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .into_par_iter()
        .map(|i| {
            let w = window_at(values, i, window);
            let n = w.len();
            if n < min_periods.max(2) {
                return None;
            }
            let mean = w.iter().sum::<f64>() / n as f64;
            let ss: f64 = w.iter().map(|x| (x - mean).powi(2)).sum();
            Some((ss / (n - 1) as f64).sqrt())
        })
        .collect()
}

/// Rolling median. Robust to isolated spikes, used for baselines.
pub fn rolling_median(values: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .into_par_iter()
        .map(|i| {
            let w = window_at(values, i, window);
            if w.len() < min_periods.max(1) {
                None
            } else {
                median(w)
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
