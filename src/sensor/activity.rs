//! Accelerometer activity integration.
//!
//! Raw accelerometer triples are turned into a slowly varying activity
//! magnitude in [0, 1): each movement spike pulls the level up by a fraction
//! of its remaining headroom, and after a quiet period the level decays
//! exponentially back towards zero.
//!
//! Captures without any movement data fall back to heart-rate variability:
//! the population standard deviation of the last three readings, divided by
//! ten and capped at 1.

use crate::config::ActivityConfig;
use crate::sensor::types::{SampleRecord, SensorSample};
use chrono::{DateTime, Utc};
use statrs::statistics::Statistics;
use std::collections::VecDeque;

/// Heart-rate readings used when no movement data is available.
const HR_ACTIVITY_WINDOW: usize = 3;

/// Leaky spike integrator over accelerometer readings.
#[derive(Debug, Clone)]
pub struct ActivityIntegrator {
    config: ActivityConfig,
    activity: f64,
    last_spike: Option<DateTime<Utc>>,
    last_accel: [f64; 3],
    last_time: Option<DateTime<Utc>>,
}

impl ActivityIntegrator {
    pub fn new(config: ActivityConfig) -> Self {
        Self {
            config,
            activity: 0.0,
            last_spike: None,
            last_accel: [0.0; 3],
            last_time: None,
        }
    }

    /// Feed one accelerometer reading and return the updated activity level.
    pub fn update(&mut self, accel: [f64; 3], now: DateTime<Utc>) -> f64 {
        let diff = ((accel[0] - self.last_accel[0])
            + (accel[1] - self.last_accel[1])
            + (accel[2] - self.last_accel[2]))
            .abs()
            / 3.0;

        let dt_ms = self
            .last_time
            .map(|t| (now - t).num_milliseconds().max(0) as f64)
            .unwrap_or(0.0);

        if diff > self.config.spike_threshold {
            self.activity += (1.0 - self.activity) * self.config.spike_strength;
            self.last_spike = Some(now);
        }

        let quiet = match self.last_spike {
            Some(spike) => {
                (now - spike).num_milliseconds() as f64 > self.config.decay_delay.as_millis() as f64
            }
            None => true,
        };
        if quiet && self.activity > self.config.lower_bound {
            let decay_ms = self.config.decay_constant.as_millis() as f64;
            self.activity -= self.activity / decay_ms * dt_ms;
        }

        if self.activity < self.config.lower_bound {
            self.activity = 0.0;
        }

        self.last_accel = accel;
        self.last_time = Some(now);
        self.activity
    }

    /// Current activity level.
    pub fn activity(&self) -> f64 {
        self.activity
    }

    /// Overwrite the level, e.g. from a heart-rate estimate.
    pub fn set_activity(&mut self, activity: f64) {
        self.activity = activity;
    }

    pub fn reset(&mut self) {
        self.activity = 0.0;
        self.last_spike = None;
        self.last_accel = [0.0; 3];
        self.last_time = None;
    }
}

/// Converts recorded capture lines into engine samples.
#[derive(Debug, Clone)]
pub struct SampleBuilder {
    integrator: ActivityIntegrator,
    recent_heart_rates: VecDeque<f64>,
}

impl SampleBuilder {
    pub fn new(config: ActivityConfig) -> Self {
        Self {
            integrator: ActivityIntegrator::new(config),
            recent_heart_rates: VecDeque::with_capacity(HR_ACTIVITY_WINDOW),
        }
    }

    /// Build a sample from a record.
    ///
    /// An explicit activity value wins over the accelerometer triple. With
    /// neither, activity is estimated from heart-rate variability once three
    /// readings are available, and the last level is carried forward before
    /// that.
    pub fn build(&mut self, record: &SampleRecord) -> SensorSample {
        if let Some(hr) = record.heart_rate.filter(|hr| hr.is_finite()) {
            if self.recent_heart_rates.len() == HR_ACTIVITY_WINDOW {
                self.recent_heart_rates.pop_front();
            }
            self.recent_heart_rates.push_back(hr);
        }

        let activity = match (record.activity, record.accel) {
            (Some(activity), _) => activity,
            (None, Some(accel)) => self.integrator.update(accel, record.timestamp),
            (None, None) => self.heart_rate_activity(),
        };

        let mut sample = SensorSample::new(record.bed_temperature, activity, record.timestamp)
            .with_contact(record.finger_contact);
        if let Some(hr) = record.heart_rate {
            sample = sample.with_heart_rate(hr);
        }
        sample
    }

    fn heart_rate_activity(&mut self) -> f64 {
        if self.recent_heart_rates.len() == HR_ACTIVITY_WINDOW {
            let spread = self.recent_heart_rates.iter().population_std_dev();
            self.integrator.set_activity((spread / 10.0).min(1.0));
        }
        self.integrator.activity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T22:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_spike_raises_activity() {
        let mut integrator = ActivityIntegrator::new(ActivityConfig::default());
        let t0 = start();

        assert_eq!(integrator.update([0.0, 0.0, 0.0], t0), 0.0);
        let level = integrator.update([40.0, 40.0, 40.0], t0 + Duration::seconds(2));
        assert!((level - 0.05).abs() < 1e-12);

        let level = integrator.update([0.0, 0.0, 0.0], t0 + Duration::seconds(4));
        assert!((level - (0.05 + 0.95 * 0.05)).abs() < 1e-12);
    }

    #[test]
    fn test_small_motion_is_not_a_spike() {
        let mut integrator = ActivityIntegrator::new(ActivityConfig::default());
        let t0 = start();
        integrator.update([0.0, 0.0, 0.0], t0);
        assert_eq!(integrator.update([5.0, 5.0, 5.0], t0 + Duration::seconds(2)), 0.0);
    }

    #[test]
    fn test_decay_after_quiet_period() {
        let mut integrator = ActivityIntegrator::new(ActivityConfig::default());
        let t0 = start();
        integrator.update([0.0, 0.0, 0.0], t0);
        let peak = integrator.update([40.0, 40.0, 40.0], t0 + Duration::seconds(1));

        // Still inside the decay delay: level holds.
        let held = integrator.update([40.0, 40.0, 40.0], t0 + Duration::minutes(4));
        assert_eq!(held, peak);

        // Past the delay the level decays towards zero.
        let decayed = integrator.update([40.0, 40.0, 40.0], t0 + Duration::minutes(6));
        assert!(decayed < peak);
    }

    #[test]
    fn test_builder_prefers_explicit_activity() {
        let mut builder = SampleBuilder::new(ActivityConfig::default());
        let record = SampleRecord {
            timestamp: start(),
            bed_temperature: 25.0,
            activity: Some(0.2),
            accel: Some([100.0, 100.0, 100.0]),
            heart_rate: None,
            finger_contact: true,
        };
        let sample = builder.build(&record);
        assert_eq!(sample.activity, 0.2);
        assert!(!sample.heart_rate_valid);
        assert!(sample.finger_contact);
    }

    #[test]
    fn test_builder_integrates_accel() {
        let mut builder = SampleBuilder::new(ActivityConfig::default());
        let mut record = SampleRecord {
            timestamp: start(),
            bed_temperature: 25.0,
            activity: None,
            accel: Some([0.0, 0.0, 0.0]),
            heart_rate: Some(60.0),
            finger_contact: false,
        };
        assert_eq!(builder.build(&record).activity, 0.0);

        record.timestamp = start() + Duration::seconds(2);
        record.accel = Some([30.0, 30.0, 30.0]);
        let sample = builder.build(&record);
        assert!(sample.activity > 0.0);
        assert_eq!(sample.valid_heart_rate(), Some(60.0));
    }

    #[test]
    fn test_builder_falls_back_to_heart_rate_spread() {
        let mut builder = SampleBuilder::new(ActivityConfig::default());
        let mut record = SampleRecord {
            timestamp: start(),
            bed_temperature: 25.0,
            activity: None,
            accel: None,
            heart_rate: Some(60.0),
            finger_contact: true,
        };
        assert_eq!(builder.build(&record).activity, 0.0);

        record.heart_rate = Some(70.0);
        assert_eq!(builder.build(&record).activity, 0.0);

        // Population std dev of 60, 70, 80 is sqrt(200 / 3).
        record.heart_rate = Some(80.0);
        let expected = (200.0_f64 / 3.0).sqrt() / 10.0;
        assert!((builder.build(&record).activity - expected).abs() < 1e-9);

        // No reading: the window and the level are unchanged.
        record.heart_rate = None;
        assert!((builder.build(&record).activity - expected).abs() < 1e-9);

        record.heart_rate = Some(200.0);
        assert_eq!(builder.build(&record).activity, 1.0);
    }
}
