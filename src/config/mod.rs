//! Well Configuration Module
//!
//! Per-well configuration loaded from TOML, holding every threshold, gain
//! and physical constant the analysis uses.
//!
//! ## Loading Order
//!
//! 1. `AUTODRILLER_CONFIG` environment variable (path to TOML file)
//! 2. `well_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The config is passed by reference into each stage; there is no global.
//!
//! ```ignore
//! let config = config::WellConfig::load();
//! let report = pipeline::run(&samples, &config);
//! ```

mod well_config;
pub mod defaults;
pub mod validation;

pub use well_config::*;
