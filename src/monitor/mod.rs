//! Sleep monitoring session for one bed.
//!
//! Ties presence detection, epoch staging and the analytics together and
//! keeps session counters alongside.

pub mod session;
pub mod stats;

pub use session::{Physiology, SleepMonitor, TickOutcome};
pub use stats::{create_shared_stats, MonitorStats, MonitorStatsSnapshot, SharedMonitorStats};
