//! Epoch accumulation for sleep staging.
//!
//! Ticks arrive every few seconds, but stages are scored per fixed-duration
//! epoch (one minute by default). Samples are collected into the current
//! epoch until one arrives past its end, at which point the epoch is
//! completed and a new one starts at that sample.

use crate::sensor::SensorSample;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Aggregated readings for one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Epoch {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    activity_sum: f64,
    heart_rate_sum: f64,
    heart_rate_count: usize,
    sample_count: usize,
}

impl Epoch {
    /// Create an empty epoch starting at the given time.
    pub fn new(start: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            start,
            end: start + duration,
            activity_sum: 0.0,
            heart_rate_sum: 0.0,
            heart_rate_count: 0,
            sample_count: 0,
        }
    }

    /// Check if a timestamp falls within this epoch.
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    /// Add a sample's readings to this epoch.
    pub fn add(&mut self, sample: &SensorSample) {
        self.activity_sum += sample.activity;
        if let Some(hr) = sample.valid_heart_rate() {
            self.heart_rate_sum += hr;
            self.heart_rate_count += 1;
        }
        self.sample_count += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn mean_activity(&self) -> f64 {
        if self.sample_count == 0 {
            0.0
        } else {
            self.activity_sum / self.sample_count as f64
        }
    }

    /// Mean of the valid heart rates, if any were seen.
    pub fn mean_heart_rate(&self) -> Option<f64> {
        (self.heart_rate_count > 0).then(|| self.heart_rate_sum / self.heart_rate_count as f64)
    }
}

/// Groups occupied ticks into epochs.
#[derive(Debug, Clone)]
pub struct EpochAccumulator {
    duration: Duration,
    current: Option<Epoch>,
}

impl EpochAccumulator {
    pub fn new(duration: std::time::Duration) -> Self {
        Self {
            duration: Duration::from_std(duration).unwrap_or_else(|_| Duration::seconds(60)),
            current: None,
        }
    }

    /// Add a sample, returning the previous epoch if this sample closed it.
    pub fn push(&mut self, sample: &SensorSample) -> Option<Epoch> {
        let expired = self
            .current
            .as_ref()
            .is_some_and(|epoch| sample.timestamp >= epoch.end);
        let completed = if expired { self.current.take() } else { None };

        let duration = self.duration;
        self.current
            .get_or_insert_with(|| Epoch::new(sample.timestamp, duration))
            .add(sample);

        completed.filter(|epoch| !epoch.is_empty())
    }

    /// The epoch currently being filled.
    pub fn current(&self) -> Option<&Epoch> {
        self.current.as_ref()
    }

    /// Drop any partially filled epoch.
    pub fn discard(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T23:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
            + Duration::seconds(secs)
    }

    #[test]
    fn test_epoch_contains() {
        let epoch = Epoch::new(t(0), Duration::seconds(60));
        assert!(epoch.contains(t(0)));
        assert!(epoch.contains(t(59)));
        assert!(!epoch.contains(t(60)));
        assert!(epoch.is_empty());
    }

    #[test]
    fn test_epoch_means() {
        let mut epoch = Epoch::new(t(0), Duration::seconds(60));
        epoch.add(&SensorSample::new(30.0, 0.1, t(0)).with_heart_rate(60.0));
        epoch.add(&SensorSample::new(30.0, 0.3, t(5)));
        epoch.add(&SensorSample::new(30.0, 0.2, t(10)).with_heart_rate(64.0));

        assert!((epoch.mean_activity() - 0.2).abs() < 1e-12);
        assert_eq!(epoch.mean_heart_rate(), Some(62.0));
        assert_eq!(epoch.sample_count(), 3);
    }

    #[test]
    fn test_no_valid_heart_rate() {
        let mut epoch = Epoch::new(t(0), Duration::seconds(60));
        epoch.add(&SensorSample::new(30.0, 0.1, t(0)));
        assert_eq!(epoch.mean_heart_rate(), None);
    }

    #[test]
    fn test_accumulator_completes_epochs() {
        let mut acc = EpochAccumulator::new(std::time::Duration::from_secs(60));

        for secs in (0..60).step_by(5) {
            assert!(acc.push(&SensorSample::new(30.0, 0.0, t(secs))).is_none());
        }

        let completed = acc.push(&SensorSample::new(30.0, 0.0, t(60))).unwrap();
        assert_eq!(completed.start, t(0));
        assert_eq!(completed.sample_count(), 12);
        assert_eq!(acc.current().map(|e| e.start), Some(t(60)));
    }

    #[test]
    fn test_discard() {
        let mut acc = EpochAccumulator::new(std::time::Duration::from_secs(60));
        acc.push(&SensorSample::new(30.0, 0.0, t(0)));
        acc.discard();
        assert!(acc.current().is_none());
        assert!(acc.push(&SensorSample::new(30.0, 0.0, t(90))).is_none());
    }
}
