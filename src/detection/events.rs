//! Per-event summary table

use crate::types::{
    ControlAction, DerivedSignals, EventFlag, SeverityLabel, StickSlipEvent, TelemetrySample,
};

/// Running sums for one open event.
#[derive(Default)]
struct EventAccumulator {
    event_id: u32,
    start_time_s: f64,
    end_time_s: f64,
    count: usize,
    depth_sum: f64,
    wob_sum: f64,
    rpm_sum: f64,
    css_sum: f64,
    css_count: usize,
    peak_css: Option<f64>,
    peak_mwd: Option<f64>,
    setpoint_sum: f64,
    setpoint_count: usize,
}

impl EventAccumulator {
    fn open(event_id: u32, time_s: f64) -> Self {
        Self {
            event_id,
            start_time_s: time_s,
            end_time_s: time_s,
            ..Self::default()
        }
    }

    fn push(&mut self, sample: &TelemetrySample, signals: &DerivedSignals, control: Option<&ControlAction>) {
        self.end_time_s = sample.time_s;
        self.count += 1;
        self.depth_sum += sample.bit_depth_m;
        self.wob_sum += sample.wob_kkgf;
        self.rpm_sum += sample.rpm;

        if let Some(css) = signals.css {
            self.css_sum += css;
            self.css_count += 1;
            // Strict comparison keeps the first peak
            if self.peak_css.map_or(true, |p| css > p) {
                self.peak_css = Some(css);
            }
        }

        if let Some(mwd) = sample.mwd_pktopk.filter(|v| v.is_finite()) {
            self.peak_mwd = Some(self.peak_mwd.map_or(mwd, |p| p.max(mwd)));
        }

        if let Some(action) = control {
            self.setpoint_sum += action.wob_setpoint;
            self.setpoint_count += 1;
        }
    }

    fn close(self) -> StickSlipEvent {
        let n = self.count.max(1) as f64;
        let mean_wob = self.wob_sum / n;
        let peak_css = self.peak_css.unwrap_or(0.0);
        StickSlipEvent {
            event_id: self.event_id,
            start_time_s: self.start_time_s,
            end_time_s: self.end_time_s,
            duration_s: self.end_time_s - self.start_time_s,
            sample_count: self.count,
            mean_depth_m: self.depth_sum / n,
            peak_css,
            mean_css: if self.css_count > 0 {
                self.css_sum / self.css_count as f64
            } else {
                0.0
            },
            severity: SeverityLabel::classify(self.peak_css),
            mean_wob_kkgf: mean_wob,
            mean_rpm: self.rpm_sum / n,
            peak_mwd_pktopk: self.peak_mwd,
            wob_reduction_kkgf: (self.setpoint_count > 0)
                .then(|| mean_wob - self.setpoint_sum / self.setpoint_count as f64),
        }
    }
}

/// Build the event table from labelled samples.
///
/// `control` is optional so events can be summarised before the controller
/// runs; when present it fills `wob_reduction_kkgf`.
pub fn summarize_events(
    samples: &[TelemetrySample],
    signals: &[DerivedSignals],
    flags: &[EventFlag],
    control: Option<&[ControlAction]>,
) -> Vec<StickSlipEvent> {
    let mut events = Vec::new();
    let mut open: Option<EventAccumulator> = None;

    for (i, ((sample, sig), flag)) in samples.iter().zip(signals).zip(flags).enumerate() {
        let action = control.and_then(|c| c.get(i));

        if flag.event_id == 0 {
            if let Some(acc) = open.take() {
                events.push(acc.close());
            }
            continue;
        }

        match open.as_mut() {
            Some(acc) if acc.event_id == flag.event_id => acc.push(sample, sig, action),
            _ => {
                if let Some(acc) = open.take() {
                    events.push(acc.close());
                }
                let mut acc = EventAccumulator::open(flag.event_id, sample.time_s);
                acc.push(sample, sig, action);
                open = Some(acc);
            }
        }
    }

    if let Some(acc) = open {
        events.push(acc.close());
    }

    events
}

/// Event with the highest peak CSS; ties go to the earliest event.
pub fn worst_event(events: &[StickSlipEvent]) -> Option<&StickSlipEvent> {
    events
        .iter()
        .fold(None, |best: Option<&StickSlipEvent>, e| match best {
            Some(b) if e.peak_css <= b.peak_css => Some(b),
            _ => Some(e),
        })
}

/// Event counts per severity, in severity order.
pub fn count_by_severity(events: &[StickSlipEvent]) -> [(SeverityLabel, usize); 4] {
    [
        SeverityLabel::Stable,
        SeverityLabel::Mild,
        SeverityLabel::Moderate,
        SeverityLabel::Severe,
    ]
    .map(|label| (label, events.iter().filter(|e| e.severity == label).count()))
}
