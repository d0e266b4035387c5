//! Configuration for the smartbed engine.
//!
//! Every parameter carries the default the detector was calibrated with and
//! can be overridden independently through the JSON config file.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Presence detection thresholds
    pub presence: PresenceConfig,
    /// Accelerometer integration parameters
    pub activity: ActivityConfig,
    /// Sleep-stage band boundaries
    pub classifier: ClassifierConfig,
    /// Stress score normalization bounds
    pub stress: StressConfig,
    /// Periodic analytics parameters
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Load configuration from the default location, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("smartbed")
            .join("config.json")
    }

    /// Check every section for out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.presence.validate()?;
        self.activity.validate()?;
        self.classifier.validate()?;
        self.stress.validate()?;
        self.analysis.validate()?;
        Ok(())
    }
}

/// Thresholds for the presence state machine and its thermal baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Minimum bed temperature elevation over baseline (°C)
    pub thermal_threshold: f64,
    /// Minimum activity magnitude counted as movement
    pub activity_threshold: f64,
    /// Activity at which the movement score saturates
    pub movement_saturation: f64,
    /// Lowest plausible heart rate (BPM)
    pub hr_min: f64,
    /// Highest plausible heart rate (BPM)
    pub hr_max: f64,
    /// Lower bound of the resting heart rate bonus band (BPM)
    pub hr_optimal_min: f64,
    /// Upper bound of the resting heart rate bonus band (BPM)
    pub hr_optimal_max: f64,
    /// Confidence required to enter OCCUPIED
    pub enter_threshold: f64,
    /// Confidence at or below which exit is considered
    pub exit_threshold: f64,
    /// Number of consecutive low ticks required to confirm exit
    pub confirmation_time: usize,
    /// Ceiling every confirming tick must stay at or below
    pub exit_confirmation_ceiling: f64,
    /// Capacity of the confidence history ring buffer
    pub history_size: usize,
    /// Number of recent history entries averaged by the temporal indicator
    pub temporal_window: usize,
    /// Average confidence above which the temporal indicator fires
    pub temporal_average_threshold: f64,
    /// Points awarded by the temporal indicator
    pub temporal_bonus: f64,
    /// Exponential smoothing factor for the vacant-bed baseline
    pub baseline_alpha: f64,
    /// Minimum readings accepted by manual calibration
    pub min_calibration_readings: usize,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            thermal_threshold: 1.5,
            activity_threshold: 0.001,
            movement_saturation: 0.1,
            hr_min: 40.0,
            hr_max: 150.0,
            hr_optimal_min: 50.0,
            hr_optimal_max: 80.0,
            enter_threshold: 60.0,
            exit_threshold: 20.0,
            confirmation_time: 15,
            exit_confirmation_ceiling: 30.0,
            history_size: 30,
            temporal_window: 5,
            temporal_average_threshold: 50.0,
            temporal_bonus: 10.0,
            baseline_alpha: 0.05,
            min_calibration_readings: 3,
        }
    }
}

impl PresenceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.thermal_threshold > 0.0,
            "thermal_threshold must be positive",
        )?;
        ensure(
            self.activity_threshold >= 0.0,
            "activity_threshold must not be negative",
        )?;
        ensure(
            self.movement_saturation > 0.0,
            "movement_saturation must be positive",
        )?;
        ensure(
            self.hr_min >= 0.0 && self.hr_min < self.hr_max,
            "hr_min must be non-negative and below hr_max",
        )?;
        ensure(
            self.hr_optimal_min <= self.hr_optimal_max,
            "hr_optimal_min must not exceed hr_optimal_max",
        )?;
        ensure(
            in_percent(self.enter_threshold) && in_percent(self.exit_threshold),
            "enter_threshold and exit_threshold must lie in [0, 100]",
        )?;
        ensure(
            self.exit_threshold < self.enter_threshold,
            "exit_threshold must be below enter_threshold",
        )?;
        ensure(
            in_percent(self.exit_confirmation_ceiling),
            "exit_confirmation_ceiling must lie in [0, 100]",
        )?;
        ensure(self.history_size >= 1, "history_size must be at least 1")?;
        ensure(
            (1..=self.history_size).contains(&self.confirmation_time),
            "confirmation_time must be between 1 and history_size",
        )?;
        ensure(
            (1..=self.history_size).contains(&self.temporal_window),
            "temporal_window must be between 1 and history_size",
        )?;
        ensure(
            in_percent(self.temporal_average_threshold) && in_percent(self.temporal_bonus),
            "temporal_average_threshold and temporal_bonus must lie in [0, 100]",
        )?;
        ensure(
            self.baseline_alpha > 0.0 && self.baseline_alpha <= 1.0,
            "baseline_alpha must lie in (0, 1]",
        )?;
        ensure(
            self.min_calibration_readings >= 1,
            "min_calibration_readings must be at least 1",
        )
    }
}

/// Parameters of the leaky accelerometer spike integrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Mean axis delta counted as a movement spike
    pub spike_threshold: f64,
    /// Fraction of remaining headroom added per spike
    pub spike_strength: f64,
    /// Decay time constant
    #[serde(with = "duration_millis")]
    pub decay_constant: Duration,
    /// Quiet time after the last spike before decay starts
    #[serde(with = "duration_millis")]
    pub decay_delay: Duration,
    /// Activity below this snaps to zero
    pub lower_bound: f64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            spike_threshold: 12.5,
            spike_strength: 0.05,
            decay_constant: Duration::from_secs(2 * 60),
            decay_delay: Duration::from_secs(5 * 60),
            lower_bound: 1e-3,
        }
    }
}

impl ActivityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.spike_threshold >= 0.0,
            "spike_threshold must not be negative",
        )?;
        ensure(
            self.spike_strength > 0.0 && self.spike_strength <= 1.0,
            "spike_strength must lie in (0, 1]",
        )?;
        ensure(
            !self.decay_constant.is_zero(),
            "decay_constant must be positive",
        )?;
        ensure(
            self.lower_bound >= 0.0,
            "lower_bound must not be negative",
        )
    }
}

/// Band boundaries for the rule-based sleep-stage classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Activity below which DEEP is possible
    pub deep_activity_max: f64,
    /// Heart rate below which DEEP is possible (BPM)
    pub deep_hr_max: f64,
    /// Activity below which REM is possible
    pub rem_activity_max: f64,
    /// Heart rate at or above which REM is possible (BPM)
    pub rem_hr_min: f64,
    /// Activity above which the occupant is awake
    pub wake_activity_min: f64,
    /// Heart rate above which the occupant is awake (BPM)
    pub wake_hr_min: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            deep_activity_max: 0.01,
            deep_hr_max: 55.0,
            rem_activity_max: 0.008,
            rem_hr_min: 70.0,
            wake_activity_min: 0.7,
            wake_hr_min: 75.0,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.deep_activity_max <= self.wake_activity_min,
            "deep_activity_max must not exceed wake_activity_min",
        )?;
        ensure(
            self.deep_hr_max <= self.wake_hr_min,
            "deep_hr_max must not exceed wake_hr_min",
        )
    }
}

/// Normalization bounds for the heuristic stress score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    /// Heart rate mapped to zero stress (BPM)
    pub hr_floor: f64,
    /// Heart rate mapped to full stress (BPM)
    pub hr_cap: f64,
    /// RMSSD mapped to full stress (ms)
    pub rmssd_floor: f64,
    /// RMSSD mapped to zero stress (ms)
    pub rmssd_max: f64,
    /// SDNN mapped to zero stress (ms)
    pub sdnn_max: f64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            hr_floor: 45.0,
            hr_cap: 110.0,
            rmssd_floor: 5.0,
            rmssd_max: 50.0,
            sdnn_max: 50.0,
        }
    }
}

impl StressConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.hr_cap > self.hr_floor, "hr_cap must exceed hr_floor")?;
        ensure(
            self.rmssd_max > self.rmssd_floor,
            "rmssd_max must exceed rmssd_floor",
        )?;
        ensure(self.sdnn_max > 0.0, "sdnn_max must be positive")
    }
}

/// Parameters for epoching and periodic sleep analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Duration of one sleep-stage epoch
    #[serde(with = "duration_secs")]
    pub epoch_duration: Duration,
    /// Window length (epochs) for sleep onset detection
    pub onset_window: usize,
    /// Fraction of the onset window that must be asleep
    pub onset_fraction: f64,
    /// Wake runs must be strictly longer than this (epochs)
    pub min_wake_duration: usize,
    /// Epochs required before a quality score is reported
    pub min_quality_epochs: usize,
    /// Recent valid heart rates used for HRV
    pub hrv_window: usize,
    /// Minimum valid heart rates before HRV is computed
    pub min_hrv_samples: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            epoch_duration: Duration::from_secs(60),
            onset_window: 10,
            onset_fraction: 0.8,
            min_wake_duration: 5,
            min_quality_epochs: 30,
            hrv_window: 10,
            min_hrv_samples: 5,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            !self.epoch_duration.is_zero(),
            "epoch_duration must be positive",
        )?;
        ensure(self.onset_window >= 1, "onset_window must be at least 1")?;
        ensure(
            self.onset_fraction > 0.0 && self.onset_fraction <= 1.0,
            "onset_fraction must lie in (0, 1]",
        )?;
        ensure(
            self.min_hrv_samples >= 2 && self.min_hrv_samples <= self.hrv_window,
            "min_hrv_samples must be between 2 and hrv_window",
        )
    }
}

fn ensure(condition: bool, message: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid(message.to_string()))
    }
}

fn in_percent(value: f64) -> bool {
    (0.0..=100.0).contains(&value)
}

/// Serde support for Duration as whole seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Serde support for Duration as milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
