//! Pipeline Coordinator - ordered analysis passes over one run
//!
//! ```text
//! STAGE 1: Signal Engine        (rolling windows, rayon-parallel)
//! STAGE 2: Event Segmenter      (sequential scan)
//! STAGE 3: MWD validation + torsional FFT (read-only)
//! STAGE 4: Auto-Driller         (sequential state machine)
//! STAGE 5: Torsional simulator  (sequential integrator)
//! ```
//!
//! Stages 2, 4 and 5 carry state from sample to sample and always run as
//! ordered passes over the already-computed signals.

use std::time::Instant;

use tracing::info;

use crate::config::WellConfig;
use crate::control::{run_controller, NominalSetpoints, StateDistribution};
use crate::detection::{
    debounce_samples, detect_events, summarize_events, validate_against_mwd, worst_event,
};
use crate::physics_engine::simulate_response;
use crate::processing::{
    run_signal_engine, torsional_frequency, SignalRun, SignalSummary, WindowSizing,
};
use crate::types::{
    EnrichedSample, StickSlipEvent, TelemetrySample, TorsionalFrequency, ValidationMetrics,
};

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Input samples with every stage's output attached, in input order
    pub samples: Vec<EnrichedSample>,
    pub events: Vec<StickSlipEvent>,
    pub validation: Option<ValidationMetrics>,
    pub torsional: TorsionalFrequency,
    pub nominal: NominalSetpoints,
    pub distribution: StateDistribution,
    pub engagements: usize,
    pub window: WindowSizing,
    pub min_event_samples: usize,
    pub signal_summary: SignalSummary,
}

impl PipelineOutput {
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            samples_processed: self.samples.len(),
            events: self.events.len(),
            flagged_samples: self.samples.iter().filter(|s| s.event.stick_slip_flag).count(),
            engagements: self.engagements,
            dominant_freq_hz: self.torsional.dominant_freq_hz,
        }
    }
}

/// Run every stage over a cleaned, time-ordered sample sequence.
pub fn run(samples: &[TelemetrySample], config: &WellConfig) -> PipelineOutput {
    let started = Instant::now();
    info!(
        well = %config.well.name,
        samples = samples.len(),
        "Pipeline run starting"
    );

    let times: Vec<f64> = samples.iter().map(|s| s.time_s).collect();

    // STAGE 1
    let SignalRun {
        signals,
        sizing: window,
        summary: signal_summary,
    } = run_signal_engine(samples, &config.signals);

    // STAGE 2
    let css: Vec<Option<f64>> = signals.iter().map(|s| s.css).collect();
    let min_event_samples = debounce_samples(&times, &config.detection);
    let flags = detect_events(&times, &css, &config.detection);

    // STAGE 3
    let validation = validate_against_mwd(samples, &signals, &flags, &config.validation);
    let provisional = summarize_events(samples, &signals, &flags, None);
    let torsional = worst_event(&provisional).map_or_else(TorsionalFrequency::zero, |e| {
        torsional_frequency(samples, e, window.median_dt_s, &config.spectral)
    });

    // STAGE 4
    let controller = run_controller(samples, &signals, &config.controller);

    // STAGE 5
    let responses = simulate_response(&controller.actions, &config.physics);

    let events = summarize_events(samples, &signals, &flags, Some(&controller.actions));

    let enriched: Vec<EnrichedSample> = samples
        .iter()
        .zip(signals)
        .zip(flags)
        .zip(controller.actions)
        .zip(responses)
        .map(|((((sample, signals), event), control), response)| EnrichedSample {
            sample: sample.clone(),
            signals,
            event,
            control,
            response,
        })
        .collect();

    let output = PipelineOutput {
        samples: enriched,
        events,
        validation,
        torsional,
        nominal: controller.nominal,
        distribution: controller.distribution,
        engagements: controller.engagements,
        window,
        min_event_samples,
        signal_summary,
    };

    info!(
        elapsed_ms = started.elapsed().as_millis(),
        "{}",
        output.stats()
    );

    output
}

/// Headline counters for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineStats {
    pub samples_processed: usize,
    pub events: usize,
    pub flagged_samples: usize,
    pub engagements: usize,
    pub dominant_freq_hz: f64,
}

impl std::fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pipeline: {} samples, {} events ({} flagged samples), {} mitigation engagements, torsional {:.4} Hz",
            self.samples_processed,
            self.events,
            self.flagged_samples,
            self.engagements,
            self.dominant_freq_hz
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ControllerState, SeverityLabel};

    fn scenario() -> Vec<TelemetrySample> {
        (0..600)
            .map(|i| {
                let t = f64::from(i);
                let s = TelemetrySample::new(t, 120.0, 10.0, 10.0, 2500.0 + t * 0.005);
                if (300..360).contains(&i) {
                    s.with_mwd(200.0)
                } else {
                    s
                }
            })
            .collect()
    }

    #[test]
    fn test_output_aligned_with_input() {
        let samples = scenario();
        let out = run(&samples, &WellConfig::default());
        assert_eq!(out.samples.len(), samples.len());
        for (e, s) in out.samples.iter().zip(&samples) {
            assert_eq!(e.sample.time_s, s.time_s);
            assert_eq!(e.control.time_s, s.time_s);
        }
    }

    #[test]
    fn test_step_produces_one_event_and_full_cycle() {
        let out = run(&scenario(), &WellConfig::default());
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].severity, SeverityLabel::Moderate);
        assert!(out.events[0].wob_reduction_kkgf.unwrap() > 0.0);
        assert_eq!(out.engagements, 1);
        assert!(out.distribution.mitigating > 0);
        assert!(out.distribution.recovering > 0);
        assert_eq!(out.samples.last().unwrap().control.state, ControllerState::Normal);
        assert_eq!(out.min_event_samples, 20);
    }

    #[test]
    fn test_window_and_summary_match_signals() {
        let samples = scenario();
        let config = WellConfig::default();
        let out = run(&samples, &config);
        let times: Vec<f64> = samples.iter().map(|s| s.time_s).collect();
        assert_eq!(out.window, WindowSizing::resolve(&times, &config.signals));
        assert_eq!(out.window.window_samples, 60);

        let signals: Vec<_> = out.samples.iter().map(|e| e.signals.clone()).collect();
        assert_eq!(out.signal_summary, SignalSummary::from_signals(&samples, &signals));
        assert!(out.signal_summary.mwd_coverage_pct > 0.0);
    }

    #[test]
    fn test_empty_run() {
        let out = run(&[], &WellConfig::default());
        assert!(out.samples.is_empty());
        assert!(out.events.is_empty());
        assert!(out.validation.is_none());
        assert!(out.torsional.is_zero());
    }

    #[test]
    fn test_stats_display() {
        let out = run(&scenario(), &WellConfig::default());
        let text = out.stats().to_string();
        assert!(text.contains("600 samples"));
        assert!(text.contains("1 events"));
    }
}
