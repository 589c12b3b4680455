//! Signal processing module - rolling statistics, CSS fusion, torsional FFT

mod fft;
pub mod rolling;
mod signals;

pub use fft::{compute_spectrum, find_peak_in_band, torsional_frequency, FrequencySpectrum};
pub use rolling::median_interval;
pub use signals::{compute_signals, run_signal_engine, SignalRun, SignalSummary, WindowSizing};
