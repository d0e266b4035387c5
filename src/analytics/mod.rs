//! Stateless sleep and physiology analytics.
//!
//! Everything here is a pure function of its inputs:
//! - HRV metrics (RMSSD, SDNN) and the heuristic stress score
//! - Stage-series analytics: quality, transitions, onset, wake periods
//! - The per-episode [`SleepReport`] bundling all of the above

pub mod hrv;
pub mod report;
pub mod sleep;

pub use hrv::{ibi_from_heart_rates, rmssd, sdnn, stress_score, HrvMetrics};
pub use report::{
    FragmentationRating, LatencyRating, OnsetSummary, QualityRating, SleepReport, WakeRating,
};
pub use sleep::{
    sleep_onset, sleep_quality, sleep_transitions, wake_periods, StageDistribution,
    TransitionSummary, WakePeriod,
};
