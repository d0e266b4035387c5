//! Smartbed Core - bed presence detection and sleep analytics.
//!
//! This library turns per-tick readings from a smart bed (surface
//! temperature, an accelerometer-derived activity level and a fingertip
//! pulse sensor) into an occupancy verdict, per-epoch sleep stages and an
//! end-of-night sleep report.
//!
//! # Guarantees
//!
//! - **Never fails on bad input**: missing or invalid sensors only lower the
//!   presence confidence
//! - **Hysteresis**: entry is immediate, exit needs a sustained run of
//!   low-confidence ticks so still sleepers are not reported as gone
//! - **Pure analytics**: HRV, stress and stage-series metrics are stateless
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Sleep Monitor                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Sensor    │──▶│  Presence   │──▶│   Epochs    │       │
//! │  │  (samples)  │   │  (engine)   │   │ (60s bins)  │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                           │                  │              │
//! │                           ▼                  ▼              │
//! │                    ┌─────────────┐   ┌─────────────┐       │
//! │                    │   Monitor   │   │   Stage     │       │
//! │                    │    Stats    │   │ Classifier  │       │
//! │                    └─────────────┘   └─────────────┘       │
//! │                                              │              │
//! │                                              ▼              │
//! │                                      ┌─────────────┐       │
//! │                                      │   Sleep     │       │
//! │                                      │   Report    │       │
//! │                                      └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use smartbed_core::{Config, SensorSample, SleepMonitor};
//!
//! let mut monitor = SleepMonitor::new(Config::default()).expect("valid config");
//!
//! let sample = SensorSample::new(24.5, 0.02, Utc::now())
//!     .with_heart_rate(58.0)
//!     .with_contact(true);
//! let outcome = monitor.tick(&sample);
//! println!("occupied: {}", outcome.presence.occupied);
//! ```

pub mod analytics;
pub mod config;
pub mod core;
pub mod error;
pub mod monitor;
pub mod sensor;

// Re-export key types at crate root for convenience
pub use analytics::{HrvMetrics, SleepReport};
pub use config::{
    ActivityConfig, AnalysisConfig, ClassifierConfig, Config, PresenceConfig, StressConfig,
};
pub use core::{PresenceEngine, PresenceResult, SleepStage, SleepStageClassifier};
pub use error::{AnalyticsError, ConfigError};
pub use monitor::{MonitorStats, SharedMonitorStats, SleepMonitor, TickOutcome};
pub use sensor::{SampleBuilder, SampleRecord, SensorSample};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
