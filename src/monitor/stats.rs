//! Session counters for the sleep monitor.
//!
//! Counters are lock-free so a shared handle can be read from a status
//! thread while the tick loop keeps writing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running statistics for one monitor session.
#[derive(Debug)]
pub struct MonitorStats {
    /// Ticks evaluated
    ticks: AtomicU64,
    /// Ticks without a valid heart-rate reading
    degraded_heart_rate: AtomicU64,
    /// Ticks without finger contact
    missing_contact: AtomicU64,
    /// VACANT → OCCUPIED transitions
    occupancy_entries: AtomicU64,
    /// OCCUPIED → VACANT transitions
    occupancy_exits: AtomicU64,
    /// Epochs assigned a sleep stage
    epochs_classified: AtomicU64,
    /// Sleep reports produced
    reports_generated: AtomicU64,
    session_start: DateTime<Utc>,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            degraded_heart_rate: AtomicU64::new(0),
            missing_contact: AtomicU64::new(0),
            occupancy_entries: AtomicU64::new(0),
            occupancy_exits: AtomicU64::new(0),
            epochs_classified: AtomicU64::new(0),
            reports_generated: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    /// Record one tick and whether its pulse readings were usable.
    pub fn record_tick(&self, heart_rate_valid: bool, finger_contact: bool) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        if !heart_rate_valid {
            self.degraded_heart_rate.fetch_add(1, Ordering::Relaxed);
        }
        if !finger_contact {
            self.missing_contact.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an occupancy change.
    pub fn record_transition(&self, occupied: bool) {
        if occupied {
            self.occupancy_entries.fetch_add(1, Ordering::Relaxed);
        } else {
            self.occupancy_exits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_epoch(&self) {
        self.epochs_classified.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_report(&self) {
        self.reports_generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of the counters.
    pub fn stats(&self) -> MonitorStatsSnapshot {
        MonitorStatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            degraded_heart_rate: self.degraded_heart_rate.load(Ordering::Relaxed),
            missing_contact: self.missing_contact.load(Ordering::Relaxed),
            occupancy_entries: self.occupancy_entries.load(Ordering::Relaxed),
            occupancy_exits: self.occupancy_exits.load(Ordering::Relaxed),
            epochs_classified: self.epochs_classified.load(Ordering::Relaxed),
            reports_generated: self.reports_generated.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Ticks evaluated: {}\n\
             - Ticks without valid heart rate: {}\n\
             - Ticks without finger contact: {}\n\
             - Bed entries: {}\n\
             - Bed exits: {}\n\
             - Epochs classified: {}\n\
             - Reports generated: {}\n\
             - Session duration: {} seconds",
            stats.ticks,
            stats.degraded_heart_rate,
            stats.missing_contact,
            stats.occupancy_entries,
            stats.occupancy_exits,
            stats.epochs_classified,
            stats.reports_generated,
            stats.session_duration_secs
        )
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in [
            &self.ticks,
            &self.degraded_heart_rate,
            &self.missing_contact,
            &self.occupancy_entries,
            &self.occupancy_exits,
            &self.epochs_classified,
            &self.reports_generated,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for MonitorStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`MonitorStats`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorStatsSnapshot {
    pub ticks: u64,
    pub degraded_heart_rate: u64,
    pub missing_contact: u64,
    pub occupancy_entries: u64,
    pub occupancy_exits: u64,
    pub epochs_classified: u64,
    pub reports_generated: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared statistics.
pub type SharedMonitorStats = Arc<MonitorStats>;

pub fn create_shared_stats() -> SharedMonitorStats {
    Arc::new(MonitorStats::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let stats = MonitorStats::new();

        stats.record_tick(true, true);
        stats.record_tick(false, false);
        stats.record_tick(false, true);
        stats.record_transition(true);
        stats.record_transition(false);
        stats.record_epoch();

        let snapshot = stats.stats();
        assert_eq!(snapshot.ticks, 3);
        assert_eq!(snapshot.degraded_heart_rate, 2);
        assert_eq!(snapshot.missing_contact, 1);
        assert_eq!(snapshot.occupancy_entries, 1);
        assert_eq!(snapshot.occupancy_exits, 1);
        assert_eq!(snapshot.epochs_classified, 1);
        assert_eq!(snapshot.reports_generated, 0);
    }

    #[test]
    fn test_reset() {
        let stats = MonitorStats::new();
        stats.record_tick(false, false);
        stats.record_report();
        stats.reset();

        let snapshot = stats.stats();
        assert_eq!(snapshot.ticks, 0);
        assert_eq!(snapshot.reports_generated, 0);
    }

    #[test]
    fn test_shared_across_threads() {
        let stats = create_shared_stats();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        stats.record_tick(true, true);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(stats.stats().ticks, 400);
    }

    #[test]
    fn test_summary_format() {
        let summary = MonitorStats::new().summary();
        assert!(summary.contains("Ticks evaluated"));
        assert!(summary.contains("Bed entries"));
    }
}
