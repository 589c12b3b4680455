//! Torsional spectrum of surface torque using rustfft
//!
//! Stick-slip shows up on surface torque as a low-frequency oscillation,
//! typically 0.05-0.3 Hz on a deep 12.25-in section. The dominant frequency
//! of the worst event is estimated from a fixed-length torque segment taken
//! at the event onset.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SpectralConfig;
use crate::types::{StickSlipEvent, TelemetrySample, TorsionalFrequency};

/// One-sided amplitude spectrum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencySpectrum {
    /// Frequency bins (Hz), `k / (N·dt)` for `k = 0..=N/2`
    pub frequencies: Vec<f64>,
    /// Amplitude at each bin
    pub magnitudes: Vec<f64>,
    /// Sampling interval used (s)
    pub sample_interval_s: f64,
}

/// Compute the amplitude spectrum of a mean-subtracted signal.
///
/// Transforms the full segment length with no zero padding, so bin spacing
/// is `1 / (N·dt)`. Returns `None` for an empty signal or a non-positive
/// interval.
pub fn compute_spectrum(signal: &[f64], sample_interval_s: f64) -> Option<FrequencySpectrum> {
    let n = signal.len();
    if n == 0 || !(sample_interval_s > 0.0) {
        return None;
    }

    let mean = signal.iter().sum::<f64>() / n as f64;
    let mut buffer: Vec<Complex<f64>> =
        signal.iter().map(|&x| Complex::new(x - mean, 0.0)).collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let n_positive = n / 2 + 1;
    let resolution = 1.0 / (n as f64 * sample_interval_s);
    let frequencies = (0..n_positive).map(|k| k as f64 * resolution).collect();

    // Uniform 2/N scaling keeps the argmax identical to the raw |X[k]|
    let scale = 2.0 / n as f64;
    let magnitudes = buffer.iter().take(n_positive).map(|c| c.norm() * scale).collect();

    Some(FrequencySpectrum {
        frequencies,
        magnitudes,
        sample_interval_s,
    })
}

/// Frequency and amplitude of the largest bin strictly inside `(low, high)`.
///
/// Ties resolve to the lowest frequency.
pub fn find_peak_in_band(spectrum: &FrequencySpectrum, low_hz: f64, high_hz: f64) -> Option<(f64, f64)> {
    spectrum
        .frequencies
        .iter()
        .zip(&spectrum.magnitudes)
        .filter(|(&f, _)| f > low_hz && f < high_hz)
        .fold(None, |best: Option<(f64, f64)>, (&f, &m)| match best {
            Some((_, best_m)) if m <= best_m => best,
            _ => Some((f, m)),
        })
}

/// Dominant torsional frequency of one event's torque segment.
///
/// The segment is every sample with `t_start <= time <= t_start + segment_s`
/// and a finite torque reading. Fewer than `min_samples` samples, an unknown
/// sampling interval, or an empty band gives the zero result.
pub fn torsional_frequency(
    samples: &[TelemetrySample],
    event: &StickSlipEvent,
    sample_interval_s: Option<f64>,
    config: &SpectralConfig,
) -> TorsionalFrequency {
    let t0 = event.start_time_s;
    let t1 = t0 + config.segment_s;
    let segment: Vec<f64> = samples
        .iter()
        .filter(|s| s.time_s >= t0 && s.time_s <= t1 && s.torque_knm.is_finite())
        .map(|s| s.torque_knm)
        .collect();

    if segment.len() < config.min_samples {
        debug!(
            event_id = event.event_id,
            samples = segment.len(),
            needed = config.min_samples,
            "Torque segment too short for FFT"
        );
        return TorsionalFrequency::zero();
    }

    let Some(dt) = sample_interval_s else {
        return TorsionalFrequency::zero();
    };
    let Some(spectrum) = compute_spectrum(&segment, dt) else {
        return TorsionalFrequency::zero();
    };
    // A flat segment has no oscillation to report
    let Some((freq, amplitude)) =
        find_peak_in_band(&spectrum, config.band_low_hz, config.band_high_hz)
            .filter(|(_, m)| *m > 0.0)
    else {
        return TorsionalFrequency::zero();
    };

    let result = TorsionalFrequency {
        dominant_freq_hz: freq,
        period_s: if freq > 0.0 { 1.0 / freq } else { 0.0 },
        oscillations_per_minute: freq * 60.0,
        event_id: Some(event.event_id),
        segment_samples: segment.len(),
    };

    info!(
        event_id = event.event_id,
        freq_hz = format!("{:.4}", result.dominant_freq_hz),
        period_s = format!("{:.1}", result.period_s),
        amplitude_knm = format!("{:.3}", amplitude),
        samples = result.segment_samples,
        "Torsional frequency estimated"
    );

    result
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SeverityLabel;
    use std::f64::consts::PI;

    fn event_at(start: f64) -> StickSlipEvent {
        StickSlipEvent {
            event_id: 1,
            start_time_s: start,
            end_time_s: start + 60.0,
            duration_s: 60.0,
            sample_count: 61,
            mean_depth_m: 2500.0,
            peak_css: 0.6,
            mean_css: 0.5,
            severity: SeverityLabel::Moderate,
            mean_wob_kkgf: 10.0,
            mean_rpm: 120.0,
            peak_mwd_pktopk: None,
            wob_reduction_kkgf: None,
        }
    }

    fn oscillating_torque(n: usize, dt: f64, freq: f64) -> Vec<TelemetrySample> {
        (0..n)
            .map(|i| {
                let t = i as f64 * dt;
                TelemetrySample::new(t, 120.0, 10.0 + 2.0 * (2.0 * PI * freq * t).sin(), 10.0, 2500.0)
            })
            .collect()
    }

    #[test]
    fn test_spectrum_bins() {
        let spectrum = compute_spectrum(&[1.0, 2.0, 3.0, 4.0], 0.5).unwrap();
        assert_eq!(spectrum.frequencies.len(), 3);
        assert!((spectrum.frequencies[1] - 0.5).abs() < 1e-12);
        // Mean removed
        assert!(spectrum.magnitudes[0].abs() < 1e-12);
    }

    #[test]
    fn test_spectrum_rejects_bad_interval() {
        assert!(compute_spectrum(&[1.0, 2.0], 0.0).is_none());
        assert!(compute_spectrum(&[], 1.0).is_none());
    }

    #[test]
    fn test_sine_recovered_on_exact_bin() {
        // 300 samples at 1 s: bin spacing 1/300 Hz, 0.1 Hz is bin 30
        let samples = oscillating_torque(400, 1.0, 0.1);
        let result = torsional_frequency(&samples, &event_at(0.0), Some(1.0), &SpectralConfig::default());
        assert_eq!(result.segment_samples, 301);
        assert!((result.dominant_freq_hz - 0.1).abs() < 1.0 / 301.0);
        assert!((result.period_s - 10.0).abs() < 0.5);
        assert!((result.oscillations_per_minute - 6.0).abs() < 0.3);
        assert_eq!(result.event_id, Some(1));
    }

    #[test]
    fn test_short_segment_gives_zero() {
        let samples = oscillating_torque(10, 1.0, 0.1);
        let result = torsional_frequency(&samples, &event_at(0.0), Some(1.0), &SpectralConfig::default());
        assert!(result.is_zero());
        assert_eq!(result.event_id, None);
    }

    #[test]
    fn test_flat_torque_gives_zero() {
        let samples: Vec<TelemetrySample> = (0..100)
            .map(|i| TelemetrySample::new(f64::from(i), 120.0, 10.0, 10.0, 2500.0))
            .collect();
        let result = torsional_frequency(&samples, &event_at(0.0), Some(1.0), &SpectralConfig::default());
        assert!(result.is_zero());
    }

    #[test]
    fn test_non_finite_torque_excluded() {
        let mut samples = oscillating_torque(40, 1.0, 0.1);
        for s in samples.iter_mut().skip(10) {
            s.torque_knm = f64::NAN;
        }
        let result = torsional_frequency(&samples, &event_at(0.0), Some(1.0), &SpectralConfig::default());
        assert!(result.is_zero(), "Only 10 finite samples remain");
    }

    #[test]
    fn test_peak_ties_resolve_low() {
        let spectrum = FrequencySpectrum {
            frequencies: vec![0.0, 0.1, 0.2, 0.3],
            magnitudes: vec![9.0, 1.0, 1.0, 0.5],
            sample_interval_s: 1.0,
        };
        assert_eq!(find_peak_in_band(&spectrum, 0.005, 0.5), Some((0.1, 1.0)));
    }

    #[test]
    fn test_band_is_exclusive() {
        let spectrum = FrequencySpectrum {
            frequencies: vec![0.0, 0.25, 0.5],
            magnitudes: vec![1.0, 2.0, 3.0],
            sample_interval_s: 1.0,
        };
        assert_eq!(find_peak_in_band(&spectrum, 0.005, 0.5), Some((0.25, 2.0)));
        assert_eq!(find_peak_in_band(&spectrum, 0.25, 0.5), None);
    }
}
