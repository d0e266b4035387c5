//! Rule-based sleep-stage classification.
//!
//! Maps an epoch's activity level and heart rate onto one of four stages.
//! The bands overlap, so they are tried in a fixed priority order and the
//! first match wins:
//!
//! | Priority | Stage | Activity              | Heart rate   |
//! |----------|-------|-----------------------|--------------|
//! | 1        | DEEP  | < 0.01                | < 55         |
//! | 2        | REM   | < 0.008               | ≥ 70         |
//! | 3        | LIGHT | 0.01 ..= 0.7          | 55 ..= 75    |
//! | 4        | AWAKE | anything else         |              |

use crate::config::ClassifierConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discrete sleep stage for one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepStage {
    Awake,
    Light,
    Rem,
    Deep,
}

impl SleepStage {
    pub const ALL: [SleepStage; 4] = [
        SleepStage::Awake,
        SleepStage::Light,
        SleepStage::Rem,
        SleepStage::Deep,
    ];

    /// Numeric code used by recorded stage series (0=AWAKE .. 3=DEEP).
    pub fn code(&self) -> u8 {
        match self {
            SleepStage::Awake => 0,
            SleepStage::Light => 1,
            SleepStage::Rem => 2,
            SleepStage::Deep => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SleepStage::Awake),
            1 => Some(SleepStage::Light),
            2 => Some(SleepStage::Rem),
            3 => Some(SleepStage::Deep),
            _ => None,
        }
    }

    /// Any stage other than AWAKE.
    pub fn is_asleep(&self) -> bool {
        !matches!(self, SleepStage::Awake)
    }
}

impl fmt::Display for SleepStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SleepStage::Awake => "AWAKE",
            SleepStage::Light => "LIGHT",
            SleepStage::Rem => "REM",
            SleepStage::Deep => "DEEP",
        };
        f.write_str(name)
    }
}

impl FromStr for SleepStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "awake" | "wake" | "0" => Ok(SleepStage::Awake),
            "light" | "1" => Ok(SleepStage::Light),
            "rem" | "2" => Ok(SleepStage::Rem),
            "deep" | "3" => Ok(SleepStage::Deep),
            other => Err(format!("unknown sleep stage: {other}")),
        }
    }
}

/// Activity/heart-rate band classifier.
#[derive(Debug, Clone, Default)]
pub struct SleepStageClassifier {
    config: ClassifierConfig,
}

impl SleepStageClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify one epoch. Only meaningful while the bed is occupied.
    pub fn classify(&self, activity: f64, heart_rate: f64) -> SleepStage {
        let c = &self.config;

        if activity < c.deep_activity_max && heart_rate < c.deep_hr_max {
            SleepStage::Deep
        } else if activity < c.rem_activity_max && heart_rate >= c.rem_hr_min {
            SleepStage::Rem
        } else if (c.deep_activity_max..=c.wake_activity_min).contains(&activity)
            && (c.deep_hr_max..=c.wake_hr_min).contains(&heart_rate)
        {
            SleepStage::Light
        } else {
            SleepStage::Awake
        }
    }
}
