//! Per-tick sleep monitoring.
//!
//! [`SleepMonitor`] drives the whole pipeline for one bed: every tick goes
//! through the presence engine; while the bed is occupied, ticks are grouped
//! into epochs and each completed epoch is staged and appended to the
//! current episode. When the occupant leaves, the episode is closed and a
//! [`SleepReport`] is produced.

use crate::analytics::{ibi_from_heart_rates, HrvMetrics, SleepReport};
use crate::config::Config;
use crate::core::epoch::{Epoch, EpochAccumulator};
use crate::core::presence::{PresenceEngine, PresenceResult};
use crate::core::staging::{SleepStage, SleepStageClassifier};
use crate::error::{AnalyticsError, ConfigError};
use crate::monitor::stats::{create_shared_stats, SharedMonitorStats};
use crate::sensor::SensorSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::VecDeque;
use uuid::Uuid;

/// Heart rate assumed for staging before any valid reading has been seen.
const DEFAULT_HEART_RATE: f64 = 60.0;

/// Everything one tick produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickOutcome {
    pub presence: PresenceResult,
    /// Stage of the epoch completed by this tick, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<SleepStage>,
    /// Final report of the episode closed by this tick, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SleepReport>,
}

/// Heart-rate variability and stress over the recent valid readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Physiology {
    /// Mean of the readings used (BPM)
    pub heart_rate: f64,
    pub hrv: HrvMetrics,
    /// Stress score in [0, 100]
    pub stress: f64,
    pub samples: usize,
}

/// One continuous occupancy.
#[derive(Debug, Clone)]
struct Episode {
    id: Uuid,
    started_at: DateTime<Utc>,
    stages: Vec<SleepStage>,
    heart_rates: Vec<f64>,
    activity: Vec<f64>,
}

impl Episode {
    fn start(started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at,
            stages: Vec::new(),
            heart_rates: Vec::new(),
            activity: Vec::new(),
        }
    }

    fn report(&self, ended_at: DateTime<Utc>, config: &Config) -> SleepReport {
        SleepReport::from_series(
            self.id,
            self.started_at,
            ended_at,
            &self.stages,
            Some(&self.heart_rates),
            Some(&self.activity),
            &config.analysis,
        )
    }
}

/// Presence detection plus sleep staging for a single bed.
#[derive(Debug)]
pub struct SleepMonitor {
    config: Config,
    presence: PresenceEngine,
    classifier: SleepStageClassifier,
    epochs: EpochAccumulator,
    episode: Option<Episode>,
    recent_heart_rates: VecDeque<f64>,
    last_heart_rate: f64,
    stats: SharedMonitorStats,
}

impl SleepMonitor {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            presence: PresenceEngine::new(config.presence.clone())?,
            classifier: SleepStageClassifier::new(config.classifier.clone()),
            epochs: EpochAccumulator::new(config.analysis.epoch_duration),
            episode: None,
            recent_heart_rates: VecDeque::with_capacity(config.analysis.hrv_window),
            last_heart_rate: DEFAULT_HEART_RATE,
            stats: create_shared_stats(),
            config,
        })
    }

    /// Use an existing stats handle, e.g. one a status thread already holds.
    pub fn with_stats(mut self, stats: SharedMonitorStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn presence(&self) -> &PresenceEngine {
        &self.presence
    }

    pub fn stats(&self) -> SharedMonitorStats {
        SharedMonitorStats::clone(&self.stats)
    }

    /// Id of the running episode, if the bed is occupied.
    pub fn episode_id(&self) -> Option<Uuid> {
        self.episode.as_ref().map(|e| e.id)
    }

    /// Stages scored so far in the running episode.
    pub fn stage_series(&self) -> &[SleepStage] {
        self.episode
            .as_ref()
            .map(|e| e.stages.as_slice())
            .unwrap_or_default()
    }

    /// Process one tick.
    pub fn tick(&mut self, sample: &SensorSample) -> TickOutcome {
        self.stats
            .record_tick(sample.heart_rate_valid, sample.finger_contact);

        let presence = self.presence.evaluate(sample);
        let mut stage = None;
        let mut report = None;

        if presence.changed_this_tick {
            self.stats.record_transition(presence.occupied);
        }

        if presence.occupied {
            if presence.changed_this_tick {
                self.epochs.discard();
                self.last_heart_rate = DEFAULT_HEART_RATE;
                let episode = Episode::start(sample.timestamp);
                tracing::info!(episode = %episode.id, "sleep episode started");
                self.episode = Some(episode);
            }
            // Ticks at or below the exit threshold are not the occupant's.
            if presence.confidence > self.config.presence.exit_threshold {
                if let Some(epoch) = self.epochs.push(sample) {
                    stage = Some(self.score_epoch(&epoch));
                }
            }
        } else if presence.changed_this_tick {
            self.epochs.discard();
            if let Some(episode) = self.episode.take() {
                let closed = episode.report(sample.timestamp, &self.config);
                self.stats.record_report();
                tracing::info!(
                    episode = %closed.episode_id,
                    epochs = closed.epochs,
                    quality = ?closed.quality,
                    "sleep episode ended"
                );
                report = Some(closed);
            }
        }

        if let Some(hr) = sample.valid_heart_rate() {
            self.last_heart_rate = hr;
            if self.recent_heart_rates.len() == self.config.analysis.hrv_window {
                self.recent_heart_rates.pop_front();
            }
            self.recent_heart_rates.push_back(hr);
        }

        TickOutcome {
            presence,
            stage,
            report,
        }
    }

    fn score_epoch(&mut self, epoch: &Epoch) -> SleepStage {
        let activity = epoch.mean_activity();
        let heart_rate = epoch.mean_heart_rate().unwrap_or(self.last_heart_rate);
        let stage = self.classifier.classify(activity, heart_rate);

        if let Some(episode) = self.episode.as_mut() {
            episode.stages.push(stage);
            episode.heart_rates.push(heart_rate);
            episode.activity.push(activity);
        }
        self.stats.record_epoch();

        tracing::debug!(
            start = %epoch.start,
            activity,
            heart_rate,
            samples = epoch.sample_count(),
            %stage,
            "epoch classified"
        );
        stage
    }

    /// Interim report for the running episode, as of `now`.
    pub fn analyze(&self, now: DateTime<Utc>) -> Option<SleepReport> {
        let episode = self.episode.as_ref()?;
        self.stats.record_report();
        Some(episode.report(now, &self.config))
    }

    /// HRV and stress over the most recent valid heart rates.
    pub fn physiology(&self) -> Result<Physiology, AnalyticsError> {
        AnalyticsError::require(
            self.config.analysis.min_hrv_samples,
            self.recent_heart_rates.len(),
        )?;

        let heart_rates: Vec<f64> = self.recent_heart_rates.iter().copied().collect();
        let hrv = HrvMetrics::from_ibi(&ibi_from_heart_rates(&heart_rates))?;
        let heart_rate = heart_rates.iter().mean();

        Ok(Physiology {
            heart_rate,
            stress: hrv.stress(heart_rate, &self.config.stress),
            hrv,
            samples: heart_rates.len(),
        })
    }

    /// Calibrate the presence engine's thermal baseline.
    pub fn calibrate_baseline(&mut self, readings: &[f64]) -> Result<f64, AnalyticsError> {
        self.presence.calibrate_baseline(readings)
    }

    /// Drop the running episode and all presence state.
    pub fn reset(&mut self) {
        self.presence.reset();
        self.epochs.discard();
        self.episode = None;
        self.recent_heart_rates.clear();
        self.last_heart_rate = DEFAULT_HEART_RATE;
    }
}
