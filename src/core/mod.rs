//! Sensor fusion and state classification.
//!
//! This module contains:
//! - The rolling confidence history and thermal baseline tracker
//! - Pure presence indicators and the presence state machine
//! - Epoch accumulation and rule-based sleep-stage classification

pub mod baseline;
pub mod epoch;
pub mod history;
pub mod indicators;
pub mod presence;
pub mod staging;

// Re-export commonly used types
pub use baseline::ThermalBaseline;
pub use epoch::{Epoch, EpochAccumulator};
pub use history::ConfidenceHistory;
pub use indicators::{IndicatorFlags, IndicatorKind, IndicatorResult, IndicatorSet};
pub use presence::{EngineState, Occupancy, PresenceEngine, PresenceResult, PresenceSummary};
pub use staging::{SleepStage, SleepStageClassifier};
