//! Cross-validation of the surface detector against MWD downhole readings
//!
//! The MWD PKtoPK amplitude is the ground truth. Only samples carrying a
//! reading and a defined CSS take part.

use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::{info, warn};

use crate::config::ValidationConfig;
use crate::types::{DerivedSignals, EventFlag, TelemetrySample, ValidationMetrics};

/// Compare CSS and the event flag against the MWD channel.
///
/// Returns `None` when no sample has both a reading and a defined CSS.
pub fn validate_against_mwd(
    samples: &[TelemetrySample],
    signals: &[DerivedSignals],
    flags: &[EventFlag],
    config: &ValidationConfig,
) -> Option<ValidationMetrics> {
    let mut css = Vec::new();
    let mut mwd_raw = Vec::new();
    let mut predicted = Vec::new();

    for ((sample, sig), flag) in samples.iter().zip(signals).zip(flags) {
        if let (Some(mwd), Some(c)) = (sample.mwd_pktopk.filter(|v| v.is_finite()), sig.css) {
            css.push(c);
            mwd_raw.push(mwd);
            predicted.push(flag.stick_slip_flag);
        }
    }

    if css.is_empty() {
        warn!("No overlapping CSS + MWD data");
        return None;
    }

    let mwd_norm: Vec<f64> = mwd_raw
        .iter()
        .map(|v| (v / config.mwd_max_pktopk).clamp(0.0, 1.0))
        .collect();

    let pearson_r = pearson(&css, &mwd_norm);
    let p_value = p_value_for_r(pearson_r, css.len());

    let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
    for (&pred, &truth) in predicted.iter().zip(&mwd_norm) {
        let actual = truth >= config.positive_threshold;
        match (pred, actual) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, true) => fn_ += 1,
            (false, false) => {}
        }
    }

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    let n = css.len();
    let metrics = ValidationMetrics {
        pearson_r,
        p_value,
        precision,
        recall,
        f1,
        n_samples: n,
        true_positives: tp,
        false_positives: fp,
        false_negatives: fn_,
        mwd_mean_pktopk_rpm: mwd_raw.iter().sum::<f64>() / n as f64,
        mwd_max_pktopk_rpm: mwd_raw.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };

    info!(
        r = format!("{:.3}", metrics.pearson_r),
        p = format!("{:.4}", metrics.p_value),
        precision = format!("{:.2}", metrics.precision),
        recall = format!("{:.2}", metrics.recall),
        f1 = format!("{:.2}", metrics.f1),
        n = metrics.n_samples,
        "MWD validation"
    );

    Some(metrics)
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Pearson correlation coefficient; 0.0 when either series has zero variance.
///
/// r = Σ[(xi - x̄)(yi - ȳ)] / sqrt(Σ(xi - x̄)² × Σ(yi - ȳ)²)
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 {
        return 0.0;
    }
    let n_f = n as f64;
    let mean_x = x[..n].iter().sum::<f64>() / n_f;
    let mean_y = y[..n].iter().sum::<f64>() / n_f;

    let mut num = 0.0_f64;
    let mut den_x = 0.0_f64;
    let mut den_y = 0.0_f64;
    for (a, b) in x[..n].iter().zip(&y[..n]) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        num += dx * dy;
        den_x += dx * dx;
        den_y += dy * dy;
    }

    let denom = (den_x * den_y).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        (num / denom).clamp(-1.0, 1.0)
    }
}

/// Two-tailed p-value of `r` from Student's t with n-2 degrees of freedom.
///
/// t = r × sqrt(n-2) / sqrt(1-r²)
pub fn p_value_for_r(r: f64, n: usize) -> f64 {
    if n < 3 {
        return 1.0;
    }
    if r.abs() >= 0.9999 {
        return 0.0;
    }

    let df = (n - 2) as f64;
    let t_stat = r * df.sqrt() / (1.0 - r * r).sqrt();

    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => 2.0 * (1.0 - t_dist.cdf(t_stat.abs())),
        Err(_) => 1.0,
    }
}
