//! Heart-rate-variability metrics and the heuristic stress score.
//!
//! All functions are pure; IBI series are inter-beat intervals in
//! milliseconds.

use crate::config::StressConfig;
use crate::error::AnalyticsError;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Minimum number of intervals for any HRV metric.
const MIN_IBI_SAMPLES: usize = 2;

/// Root mean square of successive differences.
pub fn rmssd(ibi: &[f64]) -> Result<f64, AnalyticsError> {
    AnalyticsError::require(MIN_IBI_SAMPLES, ibi.len())?;

    let diffs = ibi.len() - 1;
    let sum_sq: f64 = ibi.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    Ok((sum_sq / diffs as f64).sqrt())
}

/// Population standard deviation of the intervals.
pub fn sdnn(ibi: &[f64]) -> Result<f64, AnalyticsError> {
    AnalyticsError::require(MIN_IBI_SAMPLES, ibi.len())?;
    Ok(ibi.iter().population_std_dev())
}

/// Stress estimate in [0, 100] from heart rate and HRV.
///
/// Heart rate pushes stress up, variability pulls it down:
/// `0.4·hr + 0.3·(1 − rmssd) + 0.3·(1 − sdnn)` over terms normalized to [0, 1].
pub fn stress_score(hr: f64, rmssd: f64, sdnn: f64, config: &StressConfig) -> f64 {
    let hr_norm = normalize(hr, config.hr_floor, config.hr_cap);
    let rmssd_norm = normalize(rmssd, config.rmssd_floor, config.rmssd_max);
    let sdnn_norm = normalize(sdnn, 0.0, config.sdnn_max);

    let score = 0.4 * hr_norm + 0.3 * (1.0 - rmssd_norm) + 0.3 * (1.0 - sdnn_norm);
    (score * 100.0).clamp(0.0, 100.0)
}

fn normalize(value: f64, low: f64, high: f64) -> f64 {
    let norm = (value - low) / (high - low);
    if norm.is_nan() {
        return 0.0;
    }
    norm.clamp(0.0, 1.0)
}

/// Synthesize inter-beat intervals (ms) from heart rates (BPM).
///
/// Non-positive rates carry no interval and are skipped.
pub fn ibi_from_heart_rates(heart_rates: &[f64]) -> Vec<f64> {
    heart_rates
        .iter()
        .filter(|&&hr| hr > 0.0)
        .map(|&hr| 60_000.0 / hr)
        .collect()
}

/// Time-domain HRV metrics for one IBI series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrvMetrics {
    pub rmssd: f64,
    pub sdnn: f64,
}

impl HrvMetrics {
    pub fn from_ibi(ibi: &[f64]) -> Result<Self, AnalyticsError> {
        Ok(Self {
            rmssd: rmssd(ibi)?,
            sdnn: sdnn(ibi)?,
        })
    }

    /// Stress score at the given heart rate.
    pub fn stress(&self, hr: f64, config: &StressConfig) -> f64 {
        stress_score(hr, self.rmssd, self.sdnn, config)
    }
}
