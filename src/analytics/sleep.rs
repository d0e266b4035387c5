//! Sleep analytics over a stage series.
//!
//! A stage series holds one [`SleepStage`] per epoch, and every function here
//! assumes one epoch equals one minute. Functions are pure and may be called
//! concurrently.

use crate::core::staging::SleepStage;
use crate::error::AnalyticsError;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Target share of DEEP sleep.
const TARGET_DEEP: f64 = 0.20;
/// Target share of REM sleep.
const TARGET_REM: f64 = 0.25;
/// Target share of LIGHT sleep.
const TARGET_LIGHT: f64 = 0.50;
/// Ceiling for the AWAKE share.
const TARGET_AWAKE_MAX: f64 = 0.05;

/// Component score used when a supporting series is absent.
const NEUTRAL_COMPONENT: f64 = 50.0;

/// Share of each stage in a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageDistribution {
    pub awake: f64,
    pub light: f64,
    pub rem: f64,
    pub deep: f64,
    /// Number of epochs the shares were computed over
    pub epochs: usize,
}

impl StageDistribution {
    pub fn from_series(stages: &[SleepStage]) -> Self {
        if stages.is_empty() {
            return Self::default();
        }

        let total = stages.len() as f64;
        let share = |stage: SleepStage| stages.iter().filter(|&&s| s == stage).count() as f64 / total;

        Self {
            awake: share(SleepStage::Awake),
            light: share(SleepStage::Light),
            rem: share(SleepStage::Rem),
            deep: share(SleepStage::Deep),
            epochs: stages.len(),
        }
    }

    pub fn share(&self, stage: SleepStage) -> f64 {
        match stage {
            SleepStage::Awake => self.awake,
            SleepStage::Light => self.light,
            SleepStage::Rem => self.rem,
            SleepStage::Deep => self.deep,
        }
    }

    /// Minutes spent in a stage.
    pub fn minutes(&self, stage: SleepStage) -> f64 {
        self.share(stage) * self.epochs as f64
    }

    /// How closely the shares match the targets, in [0, 100].
    pub fn target_match_score(&self) -> f64 {
        let deep = (self.deep / TARGET_DEEP).min(1.0) * 100.0;
        let rem = (self.rem / TARGET_REM).min(1.0) * 100.0;
        let light = (1.0 - (self.light - TARGET_LIGHT).abs() * 2.0).max(0.0) * 100.0;
        let awake = (1.0 - self.awake / TARGET_AWAKE_MAX).max(0.0) * 100.0;

        deep * 0.3 + rem * 0.3 + light * 0.3 + awake * 0.1
    }
}

/// Overall sleep quality in [0, 100].
///
/// Half the score comes from how well the stage distribution matches the
/// targets, a quarter from heart-rate stability during sleep epochs and a
/// quarter from stillness during sleep epochs. Heart-rate and activity
/// values are paired with stages by index; when either series is absent
/// (or has no sleep epochs) its component takes a neutral value.
pub fn sleep_quality(
    stages: &[SleepStage],
    heart_rates: Option<&[f64]>,
    activity_levels: Option<&[f64]>,
) -> Result<f64, AnalyticsError> {
    AnalyticsError::require(1, stages.len())?;

    let distribution = StageDistribution::from_series(stages).target_match_score();

    let hr_component = heart_rates
        .map(|hr| asleep_values(stages, hr))
        .filter(|values| !values.is_empty())
        .map(|values| (100.0 - values.iter().population_std_dev() * 2.0).max(0.0))
        .unwrap_or(NEUTRAL_COMPONENT);

    let activity_component = activity_levels
        .map(|activity| asleep_values(stages, activity))
        .filter(|values| !values.is_empty())
        .map(|values| (100.0 - values.iter().mean() * 200.0).max(0.0))
        .unwrap_or(NEUTRAL_COMPONENT);

    let score = distribution * 0.5 + hr_component * 0.25 + activity_component * 0.25;
    Ok(score.clamp(0.0, 100.0))
}

fn asleep_values(stages: &[SleepStage], values: &[f64]) -> Vec<f64> {
    stages
        .iter()
        .zip(values)
        .filter(|(stage, _)| stage.is_asleep())
        .map(|(_, &value)| value)
        .collect()
}

/// Stage changes across a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionSummary {
    /// Number of consecutive-epoch stage changes
    pub count: usize,
    /// Transitions per hour of series duration
    pub fragmentation_index: f64,
}

/// Count stage transitions; `None` for fewer than two epochs.
pub fn sleep_transitions(stages: &[SleepStage]) -> Option<TransitionSummary> {
    if stages.len() < 2 {
        return None;
    }

    let count = stages.windows(2).filter(|w| w[0] != w[1]).count();
    let hours = stages.len() as f64 / 60.0;

    Some(TransitionSummary {
        count,
        fragmentation_index: count as f64 / hours,
    })
}

/// Index of the first window of `window` epochs in which at least
/// `fraction` of the epochs are asleep.
pub fn sleep_onset(stages: &[SleepStage], window: usize, fraction: f64) -> Option<usize> {
    if window == 0 || stages.len() < window {
        return None;
    }

    let required = window as f64 * fraction;
    stages.windows(window).position(|w| {
        let asleep = w.iter().filter(|s| s.is_asleep()).count();
        asleep as f64 >= required
    })
}

/// A contiguous run of AWAKE epochs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakePeriod {
    pub start: usize,
    pub duration: usize,
}

/// AWAKE runs strictly longer than `min_duration` epochs.
pub fn wake_periods(stages: &[SleepStage], min_duration: usize) -> Vec<WakePeriod> {
    let mut periods = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, stage) in stages.iter().enumerate() {
        match (stage.is_asleep(), run_start) {
            (false, None) => run_start = Some(i),
            (true, Some(start)) => {
                push_run(&mut periods, start, i - start, min_duration);
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        push_run(&mut periods, start, stages.len() - start, min_duration);
    }

    periods
}

fn push_run(periods: &mut Vec<WakePeriod>, start: usize, duration: usize, min_duration: usize) {
    if duration > min_duration {
        periods.push(WakePeriod { start, duration });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(codes: &[u8]) -> Vec<SleepStage> {
        codes
            .iter()
            .map(|&c| SleepStage::from_code(c).unwrap())
            .collect()
    }

    #[test]
    fn test_transitions() {
        // Four runs, three changes between them.
        let summary = sleep_transitions(&series(&[0, 0, 0, 1, 1, 2, 2, 2, 3])).unwrap();
        assert_eq!(summary.count, 3);
        assert!((summary.fragmentation_index - 20.0).abs() < 1e-9);

        let summary = sleep_transitions(&series(&[0, 1, 0, 1])).unwrap();
        assert_eq!(summary.count, 3);
        assert!((summary.fragmentation_index - 45.0).abs() < 1e-9);

        assert_eq!(sleep_transitions(&series(&[2])), None);
        assert_eq!(sleep_transitions(&[]), None);
    }

    #[test]
    fn test_onset() {
        let mut stages = series(&[0; 5]);
        stages.extend(series(&[1; 10]));
        assert_eq!(sleep_onset(&stages, 10, 0.8), Some(3));

        // 8 of 10 asleep is enough; 7 is not.
        let stages = series(&[1, 1, 0, 1, 1, 0, 1, 1, 1, 1]);
        assert_eq!(sleep_onset(&stages, 10, 0.8), Some(0));
        let stages = series(&[1, 0, 0, 1, 1, 0, 1, 1, 1, 1]);
        assert_eq!(sleep_onset(&stages, 10, 0.8), None);

        assert_eq!(sleep_onset(&series(&[1, 1]), 10, 0.8), None);
        assert_eq!(sleep_onset(&series(&[1, 1]), 0, 0.8), None);
    }

    #[test]
    fn test_wake_periods() {
        let stages = series(&[0, 0, 0, 0, 0, 0, 1, 1, 1]);
        assert_eq!(
            wake_periods(&stages, 5),
            vec![WakePeriod {
                start: 0,
                duration: 6
            }]
        );

        // Exactly min_duration long is not enough; trailing runs count.
        let stages = series(&[1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            wake_periods(&stages, 5),
            vec![WakePeriod {
                start: 7,
                duration: 7
            }]
        );

        assert!(wake_periods(&[], 5).is_empty());
    }

    #[test]
    fn test_distribution() {
        let dist = StageDistribution::from_series(&series(&[0, 1, 1, 3]));
        assert_eq!(dist.awake, 0.25);
        assert_eq!(dist.light, 0.5);
        assert_eq!(dist.rem, 0.0);
        assert_eq!(dist.deep, 0.25);
        assert_eq!(dist.minutes(SleepStage::Light), 2.0);
    }

    #[test]
    fn test_ideal_distribution_scores_full() {
        // 20% deep, 25% rem, 55% light, no wake
        let mut codes = vec![3u8; 20];
        codes.extend([2u8; 25]);
        codes.extend([1u8; 55]);
        let dist = StageDistribution::from_series(&series(&codes));
        let score = dist.target_match_score();
        // Light is 5 points off target: 0.9 * 100 * 0.3 = 27
        assert!((score - 97.0).abs() < 1e-9);
    }

    #[test]
    fn test_quality_neutral_components() {
        let stages = series(&[1; 10]);
        // Distribution: deep 0, rem 0, light 100 (at 100% light -> 0), wake 100
        // light score = max(0, 1 - 0.5*2) = 0 -> distribution = 10
        let score = sleep_quality(&stages, None, None).unwrap();
        assert!((score - (10.0 * 0.5 + 50.0 * 0.25 + 50.0 * 0.25)).abs() < 1e-9);
    }

    #[test]
    fn test_quality_uses_sleep_epochs_only() {
        let stages = series(&[0, 1, 1]);
        let steady = [120.0, 60.0, 60.0];
        let still = [0.9, 0.0, 0.0];
        let score = sleep_quality(&stages, Some(&steady), Some(&still)).unwrap();

        let dist = StageDistribution::from_series(&stages).target_match_score();
        assert!((score - (dist * 0.5 + 25.0 + 25.0)).abs() < 1e-9);
    }

    #[test]
    fn test_quality_empty_is_insufficient() {
        assert!(matches!(
            sleep_quality(&[], None, None),
            Err(AnalyticsError::InsufficientData { .. })
        ));
    }
}
