//! Sensor input for the engine.
//!
//! Acquisition itself happens outside this crate; this module defines the
//! per-tick sample and the helpers that turn recorded captures into samples.

pub mod activity;
pub mod types;

pub use activity::{ActivityIntegrator, SampleBuilder};
pub use types::{SampleRecord, SensorSample};
