//! Shared data structures for stick-slip analysis
//!
//! One record type per stage of the analysis pipeline:
//! - Ingestion: TelemetrySample
//! - Signal Engine: DerivedSignals, SeverityLabel
//! - Event Segmenter: EventFlag, StickSlipEvent, ValidationMetrics
//! - Spectral: TorsionalFrequency
//! - Auto-Driller: ControllerState, ControlAction
//! - Simulator: SimulatedResponse
//! - All of the above per sample: EnrichedSample

mod control;
mod events;
mod severity;
mod telemetry;

pub use control::*;
pub use events::*;
pub use severity::*;
pub use telemetry::*;
