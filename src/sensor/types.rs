//! Sensor sample types consumed by the engine.
//!
//! Samples are produced once per tick by the acquisition layer and are
//! immutable afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tick of already-sampled sensor readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// Bed surface temperature (°C)
    pub bed_temperature: f64,
    /// Unitless activity magnitude (>= 0)
    pub activity: f64,
    /// Heart rate in BPM; only meaningful when `heart_rate_valid` is set
    pub heart_rate: f64,
    /// Whether the pulse sensor produced a usable reading this tick
    pub heart_rate_valid: bool,
    /// Whether a finger is on the pulse sensor
    pub finger_contact: bool,
    /// When the sample was taken
    pub timestamp: DateTime<Utc>,
}

impl SensorSample {
    /// Create a sample with no heart rate and no contact.
    pub fn new(bed_temperature: f64, activity: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            bed_temperature,
            activity,
            heart_rate: 0.0,
            heart_rate_valid: false,
            finger_contact: false,
            timestamp,
        }
    }

    /// Attach a valid heart rate reading.
    pub fn with_heart_rate(mut self, heart_rate: f64) -> Self {
        self.heart_rate = heart_rate;
        self.heart_rate_valid = true;
        self
    }

    /// Set the finger-contact flag.
    pub fn with_contact(mut self, finger_contact: bool) -> Self {
        self.finger_contact = finger_contact;
        self
    }

    /// The heart rate if the reading is valid.
    pub fn valid_heart_rate(&self) -> Option<f64> {
        self.heart_rate_valid.then_some(self.heart_rate)
    }
}

/// One line of a recorded sensor capture (JSON Lines).
///
/// Activity may be supplied directly or derived from a raw accelerometer
/// triple; a missing heart rate means the pulse sensor was not valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub timestamp: DateTime<Utc>,
    pub bed_temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accel: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    #[serde(default)]
    pub finger_contact: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_builders() {
        let now = Utc::now();
        let sample = SensorSample::new(22.0, 0.0, now);
        assert!(!sample.heart_rate_valid);
        assert_eq!(sample.valid_heart_rate(), None);

        let sample = sample.with_heart_rate(62.0).with_contact(true);
        assert_eq!(sample.valid_heart_rate(), Some(62.0));
        assert!(sample.finger_contact);
    }

    #[test]
    fn test_record_parsing() {
        let line = r#"{"timestamp":"2024-01-01T23:00:00Z","bed_temperature":24.1,"heart_rate":58}"#;
        let record: SampleRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.heart_rate, Some(58.0));
        assert_eq!(record.activity, None);
        assert!(!record.finger_contact);
    }
}
