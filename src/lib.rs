//! Torsional Auto-Driller: stick-slip detection and closed-loop mitigation
//!
//! Offline analysis of surface drilling telemetry for torsional stick-slip.
//!
//! ## Architecture
//!
//! - **Signal Engine** (`processing`): rolling surface indices, torque
//!   deviation and the Composite Severity Score (CSS)
//! - **Event Segmenter** (`detection`): debounced stick-slip events, MWD
//!   cross-validation and event summaries
//! - **Spectral Analyzer** (`processing::fft`): dominant torsional frequency of
//!   the worst event
//! - **Auto-Driller** (`control`): NORMAL / DETECTING / MITIGATING / RECOVERING
//!   setpoint controller
//! - **Physics Engine** (`physics_engine`): lumped torsional response to the
//!   controller setpoints
//! - **Pipeline** (`pipeline`): ordered run over all of the above plus report
//!   assembly
//!
//! Telemetry enters through the Volve CSV adapter (`volve`) or the synthetic
//! scenario generator (`synthetic`).

pub mod config;
pub mod control;
pub mod detection;
pub mod physics_engine;
pub mod pipeline;
pub mod processing;
pub mod synthetic;
pub mod types;
pub mod volve;

// Re-export well configuration
pub use config::WellConfig;

// Re-export commonly used types
pub use types::{
    ControlAction, ControllerState, DerivedSignals, EnrichedSample, SeverityLabel,
    SimulatedResponse, StickSlipEvent, TelemetrySample, TorsionalFrequency, ValidationMetrics,
};

// Re-export the end-to-end run
pub use pipeline::{run, PipelineOutput, PipelineStats};
