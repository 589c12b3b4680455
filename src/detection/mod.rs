//! Stick-slip detection: debounced event segmentation, event summaries and
//! MWD cross-validation

mod events;
mod mwd_validation;
mod segmenter;

pub use events::{count_by_severity, summarize_events, worst_event};
pub use mwd_validation::{p_value_for_r, pearson, validate_against_mwd};
pub use segmenter::{debounce_samples, detect_events};
