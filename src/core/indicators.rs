//! Presence indicators.
//!
//! Each indicator is a pure function from a sample (plus whatever context it
//! needs) to an [`IndicatorResult`]. The presence engine sums their scores;
//! diagnostics can call them individually without touching engine state.
//!
//! Missing or invalid inputs are not errors here: they simply leave the
//! indicator inactive with a zero score.

use crate::config::PresenceConfig;
use crate::core::history::ConfidenceHistory;
use crate::sensor::SensorSample;
use serde::{Deserialize, Serialize};

/// Upper bound on the combined confidence score.
pub const MAX_CONFIDENCE: f64 = 100.0;

const THERMAL_SCORE: f64 = 30.0;
const THERMAL_HIGH_BONUS: f64 = 10.0;
const MOVEMENT_MAX_SCORE: f64 = 25.0;
const CARDIO_SCORE: f64 = 35.0;
const CARDIO_RESTING_BONUS: f64 = 5.0;
const CONTACT_SCORE: f64 = 20.0;

/// Which indicator produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Thermal,
    Movement,
    Cardiovascular,
    Contact,
    Temporal,
}

impl IndicatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            IndicatorKind::Thermal => "thermal",
            IndicatorKind::Movement => "movement",
            IndicatorKind::Cardiovascular => "cardiovascular",
            IndicatorKind::Contact => "contact",
            IndicatorKind::Temporal => "temporal",
        }
    }
}

/// The raw inputs and thresholds an indicator looked at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorInputs {
    Thermal {
        current_temp: f64,
        baseline_temp: Option<f64>,
        elevation: f64,
        threshold: f64,
    },
    Movement {
        activity: f64,
        threshold: f64,
        saturation: f64,
    },
    Cardiovascular {
        heart_rate: f64,
        valid: bool,
        in_range: bool,
        hr_min: f64,
        hr_max: f64,
    },
    Contact {
        finger_contact: bool,
    },
    Temporal {
        history_len: usize,
        average_confidence: Option<f64>,
        threshold: f64,
    },
}

/// Outcome of evaluating a single indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorResult {
    pub kind: IndicatorKind,
    pub active: bool,
    pub score: f64,
    pub raw: IndicatorInputs,
}

/// Elevated bed temperature over the vacant baseline (max 40).
///
/// Without a baseline the elevation is taken as zero.
pub fn thermal(sample: &SensorSample, baseline: Option<f64>, config: &PresenceConfig) -> IndicatorResult {
    let elevation = sample.bed_temperature - baseline.unwrap_or(sample.bed_temperature);
    let active = elevation > config.thermal_threshold;

    let mut score = 0.0;
    if active {
        score += THERMAL_SCORE;
        if elevation > 2.0 * config.thermal_threshold {
            score += THERMAL_HIGH_BONUS;
        }
    }

    IndicatorResult {
        kind: IndicatorKind::Thermal,
        active,
        score,
        raw: IndicatorInputs::Thermal {
            current_temp: sample.bed_temperature,
            baseline_temp: baseline,
            elevation,
            threshold: config.thermal_threshold,
        },
    }
}

/// Movement detected by the accelerometer (max 25), ramping linearly up to
/// the saturation level.
pub fn movement(sample: &SensorSample, config: &PresenceConfig) -> IndicatorResult {
    let active = sample.activity > config.activity_threshold;
    let score = if active {
        (sample.activity * MOVEMENT_MAX_SCORE / config.movement_saturation)
            .floor()
            .min(MOVEMENT_MAX_SCORE)
    } else {
        0.0
    };

    IndicatorResult {
        kind: IndicatorKind::Movement,
        active,
        score,
        raw: IndicatorInputs::Movement {
            activity: sample.activity,
            threshold: config.activity_threshold,
            saturation: config.movement_saturation,
        },
    }
}

/// A plausible heart rate on the pulse sensor (max 40), with a bonus for a
/// resting rate.
pub fn cardiovascular(sample: &SensorSample, config: &PresenceConfig) -> IndicatorResult {
    let hr = sample.heart_rate;
    let in_range = (config.hr_min..=config.hr_max).contains(&hr);
    let active = sample.heart_rate_valid && in_range;

    let mut score = 0.0;
    if active {
        score += CARDIO_SCORE;
        if (config.hr_optimal_min..=config.hr_optimal_max).contains(&hr) {
            score += CARDIO_RESTING_BONUS;
        }
    }

    IndicatorResult {
        kind: IndicatorKind::Cardiovascular,
        active,
        score,
        raw: IndicatorInputs::Cardiovascular {
            heart_rate: hr,
            valid: sample.heart_rate_valid,
            in_range,
            hr_min: config.hr_min,
            hr_max: config.hr_max,
        },
    }
}

/// Finger resting on the pulse sensor (max 20).
pub fn contact(sample: &SensorSample) -> IndicatorResult {
    IndicatorResult {
        kind: IndicatorKind::Contact,
        active: sample.finger_contact,
        score: if sample.finger_contact { CONTACT_SCORE } else { 0.0 },
        raw: IndicatorInputs::Contact {
            finger_contact: sample.finger_contact,
        },
    }
}

/// Sustained confidence over the recent history (max `temporal_bonus`).
///
/// Averages up to `temporal_window` of the most recent entries; an empty
/// history contributes nothing.
pub fn temporal(history: &ConfidenceHistory, config: &PresenceConfig) -> IndicatorResult {
    let average = history.recent_mean(config.temporal_window);
    let active = average.is_some_and(|avg| avg > config.temporal_average_threshold);

    IndicatorResult {
        kind: IndicatorKind::Temporal,
        active,
        score: if active { config.temporal_bonus } else { 0.0 },
        raw: IndicatorInputs::Temporal {
            history_len: history.len(),
            average_confidence: average,
            threshold: config.temporal_average_threshold,
        },
    }
}

/// All five indicators for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub thermal: IndicatorResult,
    pub movement: IndicatorResult,
    pub cardiovascular: IndicatorResult,
    pub contact: IndicatorResult,
    pub temporal: IndicatorResult,
}

impl IndicatorSet {
    /// Evaluate every indicator against the given context.
    pub fn evaluate(
        sample: &SensorSample,
        baseline: Option<f64>,
        history: &ConfidenceHistory,
        config: &PresenceConfig,
    ) -> Self {
        Self {
            thermal: thermal(sample, baseline, config),
            movement: movement(sample, config),
            cardiovascular: cardiovascular(sample, config),
            contact: contact(sample),
            temporal: temporal(history, config),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorResult> {
        [
            &self.thermal,
            &self.movement,
            &self.cardiovascular,
            &self.contact,
            &self.temporal,
        ]
        .into_iter()
    }

    /// Combined confidence, clamped to [0, 100].
    pub fn confidence(&self) -> f64 {
        let total: f64 = self.iter().map(|r| r.score).sum();
        if total.is_nan() {
            return 0.0;
        }
        total.clamp(0.0, MAX_CONFIDENCE)
    }

    /// Activation flags by indicator.
    pub fn flags(&self) -> IndicatorFlags {
        IndicatorFlags {
            thermal: self.thermal.active,
            movement: self.movement.active,
            cardiovascular: self.cardiovascular.active,
            contact: self.contact.active,
            temporal: self.temporal.active,
        }
    }
}

/// Which indicators fired on a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorFlags {
    pub thermal: bool,
    pub movement: bool,
    pub cardiovascular: bool,
    pub contact: bool,
    pub temporal: bool,
}

impl IndicatorFlags {
    pub fn get(&self, kind: IndicatorKind) -> bool {
        match kind {
            IndicatorKind::Thermal => self.thermal,
            IndicatorKind::Movement => self.movement,
            IndicatorKind::Cardiovascular => self.cardiovascular,
            IndicatorKind::Contact => self.contact,
            IndicatorKind::Temporal => self.temporal,
        }
    }

    pub fn active_count(&self) -> usize {
        [
            self.thermal,
            self.movement,
            self.cardiovascular,
            self.contact,
            self.temporal,
        ]
        .iter()
        .filter(|&&f| f)
        .count()
    }
}
