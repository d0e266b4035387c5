//! Sleep report for one occupancy episode.
//!
//! Bundles every analytic over the episode's stage series together with a
//! qualitative rating for each, so callers can render or persist a single
//! value at the end of the night.

use crate::analytics::sleep::{
    sleep_onset, sleep_quality, sleep_transitions, wake_periods, StageDistribution,
    TransitionSummary, WakePeriod,
};
use crate::config::AnalysisConfig;
use crate::core::staging::SleepStage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Overall quality band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityRating {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            QualityRating::Excellent
        } else if score >= 60.0 {
            QualityRating::Good
        } else if score >= 40.0 {
            QualityRating::Fair
        } else {
            QualityRating::Poor
        }
    }
}

impl fmt::Display for QualityRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QualityRating::Excellent => "excellent",
            QualityRating::Good => "good",
            QualityRating::Fair => "fair",
            QualityRating::Poor => "poor",
        })
    }
}

/// How broken up the night was, by transitions per hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentationRating {
    VeryConsolidated,
    Consolidated,
    SlightlyFragmented,
    HighlyFragmented,
}

impl FragmentationRating {
    pub fn from_index(index: f64) -> Self {
        if index < 10.0 {
            FragmentationRating::VeryConsolidated
        } else if index < 15.0 {
            FragmentationRating::Consolidated
        } else if index < 25.0 {
            FragmentationRating::SlightlyFragmented
        } else {
            FragmentationRating::HighlyFragmented
        }
    }
}

impl fmt::Display for FragmentationRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FragmentationRating::VeryConsolidated => "very consolidated",
            FragmentationRating::Consolidated => "consolidated",
            FragmentationRating::SlightlyFragmented => "slightly fragmented",
            FragmentationRating::HighlyFragmented => "highly fragmented",
        })
    }
}

/// Time taken to fall asleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyRating {
    Normal,
    Elevated,
    VeryElevated,
}

impl LatencyRating {
    pub fn from_minutes(minutes: f64) -> Self {
        if minutes <= 15.0 {
            LatencyRating::Normal
        } else if minutes <= 30.0 {
            LatencyRating::Elevated
        } else {
            LatencyRating::VeryElevated
        }
    }
}

impl fmt::Display for LatencyRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LatencyRating::Normal => "normal",
            LatencyRating::Elevated => "elevated",
            LatencyRating::VeryElevated => "very elevated",
        })
    }
}

/// Amount of sustained wakefulness after onset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeRating {
    Minimal,
    Moderate,
    Excessive,
}

impl WakeRating {
    pub fn from_periods(count: usize, total_minutes: f64) -> Self {
        if count <= 2 && total_minutes <= 30.0 {
            WakeRating::Minimal
        } else if count <= 4 && total_minutes <= 60.0 {
            WakeRating::Moderate
        } else {
            WakeRating::Excessive
        }
    }
}

impl fmt::Display for WakeRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WakeRating::Minimal => "minimal",
            WakeRating::Moderate => "moderate",
            WakeRating::Excessive => "excessive",
        })
    }
}

/// Sleep onset details.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnsetSummary {
    /// Epoch index where the first qualifying window starts
    pub index: usize,
    pub latency_minutes: f64,
    pub rating: LatencyRating,
}

/// Analytics bundle for one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepReport {
    pub episode_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub epochs: usize,
    pub distribution: StageDistribution,
    /// Quality score, absent until enough epochs have been scored
    pub quality: Option<f64>,
    pub quality_rating: Option<QualityRating>,
    pub transitions: Option<TransitionSummary>,
    pub fragmentation_rating: Option<FragmentationRating>,
    pub onset: Option<OnsetSummary>,
    pub wake_periods: Vec<WakePeriod>,
    pub wake_rating: WakeRating,
}

impl SleepReport {
    /// Build a report over a recorded stage series.
    ///
    /// Heart rates and activity levels, when given, are paired with stages
    /// by epoch index.
    pub fn from_series(
        episode_id: Uuid,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        stages: &[SleepStage],
        heart_rates: Option<&[f64]>,
        activity_levels: Option<&[f64]>,
        config: &AnalysisConfig,
    ) -> Self {
        let epoch_minutes = config.epoch_duration.as_secs_f64() / 60.0;

        let quality = if stages.len() >= config.min_quality_epochs {
            sleep_quality(stages, heart_rates, activity_levels).ok()
        } else {
            None
        };

        let transitions = sleep_transitions(stages);

        let onset = sleep_onset(stages, config.onset_window, config.onset_fraction).map(|index| {
            let latency_minutes = index as f64 * epoch_minutes;
            OnsetSummary {
                index,
                latency_minutes,
                rating: LatencyRating::from_minutes(latency_minutes),
            }
        });

        let wake = wake_periods(stages, config.min_wake_duration);
        let wake_minutes = wake.iter().map(|p| p.duration).sum::<usize>() as f64 * epoch_minutes;

        Self {
            episode_id,
            started_at,
            ended_at,
            epochs: stages.len(),
            distribution: StageDistribution::from_series(stages),
            quality,
            quality_rating: quality.map(QualityRating::from_score),
            transitions,
            fragmentation_rating: transitions
                .map(|t| FragmentationRating::from_index(t.fragmentation_index)),
            onset,
            wake_rating: WakeRating::from_periods(wake.len(), wake_minutes),
            wake_periods: wake,
        }
    }

    /// Total epochs spent in wake periods.
    pub fn wake_epochs(&self) -> usize {
        self.wake_periods.iter().map(|p| p.duration).sum()
    }

    /// Human-readable multi-line summary.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Sleep report {} ({} epochs, {} - {})",
            self.episode_id,
            self.epochs,
            self.started_at.format("%Y-%m-%d %H:%M"),
            self.ended_at.format("%Y-%m-%d %H:%M"),
        )];

        lines.push(format!(
            "  Stages: awake {:.0}%, light {:.0}%, rem {:.0}%, deep {:.0}%",
            self.distribution.awake * 100.0,
            self.distribution.light * 100.0,
            self.distribution.rem * 100.0,
            self.distribution.deep * 100.0,
        ));

        match (self.quality, self.quality_rating) {
            (Some(score), Some(rating)) => {
                lines.push(format!("  Quality: {score:.1}/100 ({rating})"))
            }
            _ => lines.push("  Quality: not enough data".to_string()),
        }

        if let (Some(t), Some(rating)) = (self.transitions, self.fragmentation_rating) {
            lines.push(format!(
                "  Transitions: {} ({:.1}/h, {rating})",
                t.count, t.fragmentation_index
            ));
        }

        match self.onset {
            Some(onset) => lines.push(format!(
                "  Sleep onset: {:.0} min ({})",
                onset.latency_minutes, onset.rating
            )),
            None => lines.push("  Sleep onset: not reached".to_string()),
        }

        lines.push(format!(
            "  Wake periods: {} totalling {} epochs ({})",
            self.wake_periods.len(),
            self.wake_epochs(),
            self.wake_rating
        ));

        lines.join("\n")
    }
}
