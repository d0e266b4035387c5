//! Thermal baseline tracking for an unoccupied bed.
//!
//! The baseline is the reference temperature thermal presence detection is
//! measured against. It bootstraps from the first reading, then follows slow
//! drift through exponential smoothing, but only while the bed is vacant so
//! body heat never leaks into the reference.

use crate::error::AnalyticsError;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median};

/// Adaptively smoothed resting temperature of the bed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalBaseline {
    baseline: Option<f64>,
    alpha: f64,
    min_calibration_readings: usize,
}

impl ThermalBaseline {
    pub fn new(alpha: f64, min_calibration_readings: usize) -> Self {
        Self {
            baseline: None,
            alpha,
            min_calibration_readings,
        }
    }

    /// Current baseline, if one has been established.
    pub fn current(&self) -> Option<f64> {
        self.baseline
    }

    /// Set the baseline from the first finite reading if none exists yet.
    pub fn bootstrap(&mut self, current_temp: f64) -> Option<f64> {
        if self.baseline.is_none() && current_temp.is_finite() {
            self.baseline = Some(current_temp);
        }
        self.baseline
    }

    /// Fold a new reading into the baseline and return the result.
    ///
    /// While occupied the baseline is left untouched. Non-finite readings
    /// are ignored.
    pub fn update(&mut self, current_occupied: bool, current_temp: f64) -> Option<f64> {
        match self.baseline {
            None => self.bootstrap(current_temp),
            Some(baseline) if current_occupied || !current_temp.is_finite() => Some(baseline),
            Some(baseline) => {
                let updated = (1.0 - self.alpha) * baseline + self.alpha * current_temp;
                self.baseline = Some(updated);
                Some(updated)
            }
        }
    }

    /// Overwrite the baseline with the median of a calibration capture.
    ///
    /// Non-finite readings are dropped. Fails without touching the baseline
    /// when fewer than the configured minimum readings remain.
    pub fn calibrate(&mut self, readings: &[f64]) -> Result<f64, AnalyticsError> {
        let finite: Vec<f64> = readings.iter().copied().filter(|r| r.is_finite()).collect();
        AnalyticsError::require(self.min_calibration_readings.max(1), finite.len())?;

        let median = Data::new(finite).median();
        self.baseline = Some(median);
        Ok(median)
    }

    /// Forget the baseline.
    pub fn reset(&mut self) {
        self.baseline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ThermalBaseline {
        ThermalBaseline::new(0.05, 3)
    }

    #[test]
    fn test_bootstrap_regardless_of_occupancy() {
        let mut baseline = tracker();
        assert_eq!(baseline.current(), None);
        assert_eq!(baseline.update(true, 23.0), Some(23.0));
        assert_eq!(baseline.current(), Some(23.0));
    }

    #[test]
    fn test_frozen_while_occupied() {
        let mut baseline = tracker();
        baseline.update(false, 22.0);
        for temp in [30.0, 35.0, 40.0] {
            assert_eq!(baseline.update(true, temp), Some(22.0));
        }
    }

    #[test]
    fn test_smoothing_while_vacant() {
        let mut baseline = tracker();
        baseline.update(false, 20.0);
        let updated = baseline.update(false, 30.0).unwrap();
        assert!((updated - 20.5).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_readings_ignored() {
        let mut baseline = tracker();
        assert_eq!(baseline.bootstrap(f64::NAN), None);
        assert_eq!(baseline.update(false, f64::INFINITY), None);

        baseline.update(false, 22.0);
        for temp in [f64::NAN, f64::NEG_INFINITY, f64::INFINITY] {
            assert_eq!(baseline.update(false, temp), Some(22.0));
        }
        assert_eq!(baseline.current(), Some(22.0));
    }

    #[test]
    fn test_calibrate_uses_median() {
        let mut baseline = tracker();
        baseline.update(false, 25.0);
        let median = baseline.calibrate(&[21.0, 21.5, 40.0, 21.2, 20.8]).unwrap();
        assert!((median - 21.2).abs() < 1e-12);
        assert_eq!(baseline.current(), Some(median));
    }

    #[test]
    fn test_calibrate_even_count() {
        let mut baseline = tracker();
        let median = baseline.calibrate(&[20.0, 21.0, 22.0, 23.0]).unwrap();
        assert!((median - 21.5).abs() < 1e-12);
    }

    #[test]
    fn test_calibrate_rejects_short_capture() {
        let mut baseline = tracker();
        baseline.update(false, 22.0);
        assert_eq!(
            baseline.calibrate(&[20.0, 21.0]),
            Err(AnalyticsError::InsufficientData {
                required: 3,
                actual: 2
            })
        );
        assert_eq!(baseline.current(), Some(22.0));
    }

    #[test]
    fn test_calibrate_skips_non_finite() {
        let mut baseline = tracker();
        baseline.update(false, 25.0);
        assert_eq!(
            baseline.calibrate(&[22.0, f64::NAN, 21.0]),
            Err(AnalyticsError::InsufficientData {
                required: 3,
                actual: 2
            })
        );
        assert_eq!(baseline.current(), Some(25.0));

        let median = baseline
            .calibrate(&[22.0, f64::NAN, 21.0, f64::INFINITY, 23.0])
            .unwrap();
        assert!((median - 22.0).abs() < 1e-12);
    }
}
