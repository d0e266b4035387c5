//! Bed presence state machine.
//!
//! One [`PresenceEngine::evaluate`] call per sampling tick. The engine scores
//! five independent indicators, keeps a rolling confidence history and moves
//! between VACANT and OCCUPIED with hysteresis:
//!
//! - VACANT → OCCUPIED on a single tick with confidence ≥ `enter_threshold`.
//! - OCCUPIED → VACANT only when the current confidence is ≤ `exit_threshold`
//!   and the last `confirmation_time` entries are all ≤ the confirmation
//!   ceiling.
//!
//! Entry is fast and exit is slow so long motionless stretches (deep sleep)
//! do not register as an empty bed.
//!
//! The engine never fails on a bad sample; missing sensors just lower the
//! confidence.

use crate::config::PresenceConfig;
use crate::core::baseline::ThermalBaseline;
use crate::core::history::ConfidenceHistory;
use crate::core::indicators::{IndicatorFlags, IndicatorSet};
use crate::error::{AnalyticsError, ConfigError};
use crate::sensor::SensorSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Occupancy state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupancy {
    Vacant,
    Occupied,
}

/// Mutable state owned by one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    occupied: bool,
    confidence_history: ConfidenceHistory,
    occupancy_started_at: Option<DateTime<Utc>>,
    baseline: ThermalBaseline,
}

impl EngineState {
    fn new(config: &PresenceConfig) -> Self {
        Self {
            occupied: false,
            confidence_history: ConfidenceHistory::new(config.history_size),
            occupancy_started_at: None,
            baseline: ThermalBaseline::new(config.baseline_alpha, config.min_calibration_readings),
        }
    }

    pub fn occupied(&self) -> bool {
        self.occupied
    }

    pub fn occupancy(&self) -> Occupancy {
        if self.occupied {
            Occupancy::Occupied
        } else {
            Occupancy::Vacant
        }
    }

    pub fn confidence_history(&self) -> &ConfidenceHistory {
        &self.confidence_history
    }

    pub fn occupancy_started_at(&self) -> Option<DateTime<Utc>> {
        self.occupancy_started_at
    }

    pub fn baseline_temperature(&self) -> Option<f64> {
        self.baseline.current()
    }

    fn minutes_occupied(&self, now: DateTime<Utc>) -> Option<f64> {
        self.occupancy_started_at
            .map(|start| (now - start).num_milliseconds() as f64 / 60_000.0)
    }
}

/// Per-tick presence verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceResult {
    pub occupied: bool,
    /// Combined confidence in [0, 100]
    pub confidence: f64,
    pub indicators: IndicatorFlags,
    /// Bed temperature above baseline (°C)
    pub temp_elevation: f64,
    /// Minutes since occupancy started; absent while vacant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_occupied_minutes: Option<f64>,
    /// Whether this tick flipped the occupancy state
    pub changed_this_tick: bool,
}

/// Point-in-time summary of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceSummary {
    pub occupied: bool,
    /// Most recent confidence, 0 before the first tick
    pub confidence: f64,
    pub baseline_temperature: Option<f64>,
    pub time_occupied_minutes: Option<f64>,
    pub history_len: usize,
}

/// Multi-indicator presence detector with hysteresis.
#[derive(Debug, Clone)]
pub struct PresenceEngine {
    config: PresenceConfig,
    state: EngineState,
}

impl PresenceEngine {
    /// Create an engine, rejecting invalid thresholds up front.
    pub fn new(config: PresenceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = EngineState::new(&config);
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn is_occupied(&self) -> bool {
        self.state.occupied
    }

    /// Evaluate one tick and advance the state machine.
    pub fn evaluate(&mut self, sample: &SensorSample) -> PresenceResult {
        let baseline = self.state.baseline.bootstrap(sample.bed_temperature);

        let indicators = IndicatorSet::evaluate(
            sample,
            baseline,
            &self.state.confidence_history,
            &self.config,
        );
        let confidence = indicators.confidence();

        self.state.confidence_history.push(confidence);

        let changed_this_tick = self.apply_hysteresis(confidence, sample.timestamp);

        self.state
            .baseline
            .update(self.state.occupied, sample.bed_temperature);

        let flags = indicators.flags();
        tracing::debug!(
            confidence,
            occupied = self.state.occupied,
            thermal = flags.thermal,
            movement = flags.movement,
            cardiovascular = flags.cardiovascular,
            contact = flags.contact,
            temporal = flags.temporal,
            "presence tick"
        );

        PresenceResult {
            occupied: self.state.occupied,
            confidence,
            indicators: flags,
            temp_elevation: baseline.map_or(0.0, |b| sample.bed_temperature - b),
            time_occupied_minutes: self.state.minutes_occupied(sample.timestamp),
            changed_this_tick,
        }
    }

    /// Returns true if the occupancy state changed.
    fn apply_hysteresis(&mut self, confidence: f64, now: DateTime<Utc>) -> bool {
        if !self.state.occupied {
            if confidence >= self.config.enter_threshold {
                self.state.occupied = true;
                self.state.occupancy_started_at = Some(now);
                tracing::info!(confidence, "bed presence detected");
                return true;
            }
            return false;
        }

        if confidence <= self.config.exit_threshold && self.exit_confirmed() {
            let minutes = self.state.minutes_occupied(now).unwrap_or(0.0);
            self.state.occupied = false;
            self.state.occupancy_started_at = None;
            tracing::info!(confidence, minutes, "bed vacated");
            return true;
        }

        false
    }

    /// Whether the last `confirmation_time` entries are all low.
    fn exit_confirmed(&self) -> bool {
        let history = &self.state.confidence_history;
        let needed = self.config.confirmation_time;
        history.len() >= needed
            && history
                .recent(needed)
                .all(|score| score <= self.config.exit_confirmation_ceiling)
    }

    /// Re-derive every indicator for a sample without mutating state.
    pub fn detailed_indicators(&self, sample: &SensorSample) -> IndicatorSet {
        IndicatorSet::evaluate(
            sample,
            self.state.baseline.current(),
            &self.state.confidence_history,
            &self.config,
        )
    }

    /// Calibrate the thermal baseline from a capture of vacant-bed readings.
    pub fn calibrate_baseline(&mut self, readings: &[f64]) -> Result<f64, AnalyticsError> {
        match self.state.baseline.calibrate(readings) {
            Ok(baseline) => {
                tracing::info!(baseline, readings = readings.len(), "thermal baseline calibrated");
                Ok(baseline)
            }
            Err(e) => {
                tracing::warn!("baseline calibration rejected: {e}");
                Err(e)
            }
        }
    }

    /// Summary of the current state as of `now`.
    pub fn summary(&self, now: DateTime<Utc>) -> PresenceSummary {
        PresenceSummary {
            occupied: self.state.occupied,
            confidence: self.state.confidence_history.latest().unwrap_or(0.0),
            baseline_temperature: self.state.baseline.current(),
            time_occupied_minutes: self.state.minutes_occupied(now),
            history_len: self.state.confidence_history.len(),
        }
    }

    /// Restore the initial state: vacant, empty history, no baseline.
    pub fn reset(&mut self) {
        self.state = EngineState::new(&self.config);
        tracing::info!("presence state reset");
    }
}

impl Default for PresenceEngine {
    fn default() -> Self {
        let config = PresenceConfig::default();
        let state = EngineState::new(&config);
        Self { config, state }
    }
}
