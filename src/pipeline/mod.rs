//! Analysis Pipeline Module
//!
//! Ordered end-to-end run over one well's telemetry
//! and flattening of the result into report documents.

mod coordinator;
pub mod report;

pub use coordinator::{run, PipelineOutput, PipelineStats};
