//! Debounced event segmentation over the CSS series
//!
//! A sample is flagged only when the raw flag (CSS >= threshold) has held for
//! the last `min_samples` consecutive samples. A single dropout resets the
//! run. Segmentation is a strictly sequential scan.

use tracing::info;

use crate::config::DetectionConfig;
use crate::processing::rolling::duration_to_samples;
use crate::types::EventFlag;

/// Minimum run length (samples) for the configured minimum duration.
pub fn debounce_samples(times: &[f64], config: &DetectionConfig) -> usize {
    duration_to_samples(
        times,
        config.min_duration_s,
        config.min_debounce_samples,
        config.fallback_debounce_samples,
    )
}

/// Label every sample with a sustained stick-slip flag and event id.
///
/// Undefined CSS counts as below threshold. Ids start at 1 and increase on
/// each false→true transition of the sustained flag; unflagged samples get 0.
pub fn detect_events(
    times: &[f64],
    css: &[Option<f64>],
    config: &DetectionConfig,
) -> Vec<EventFlag> {
    let min_samples = debounce_samples(times, config);

    let mut run = 0usize;
    let mut event_id = 0u32;
    let mut prev_flag = false;

    let flags: Vec<EventFlag> = css
        .iter()
        .map(|c| {
            if c.unwrap_or(0.0) >= config.css_threshold {
                run += 1;
            } else {
                run = 0;
            }

            let stick_slip_flag = run >= min_samples;
            if stick_slip_flag && !prev_flag {
                event_id += 1;
            }
            prev_flag = stick_slip_flag;

            EventFlag {
                stick_slip_flag,
                event_id: if stick_slip_flag { event_id } else { 0 },
            }
        })
        .collect();

    let flagged = flags.iter().filter(|f| f.stick_slip_flag).count();
    let flagged_pct = if flags.is_empty() {
        0.0
    } else {
        100.0 * flagged as f64 / flags.len() as f64
    };
    info!(
        events = event_id,
        flagged_pct = format!("{flagged_pct:.1}"),
        css_threshold = config.css_threshold,
        min_duration_s = config.min_duration_s,
        min_samples,
        "Detection complete"
    );

    flags
}
