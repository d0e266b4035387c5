//! Integration tests for the presence engine state machine

use chrono::{DateTime, Duration, Utc};
use smartbed_core::config::PresenceConfig;
use smartbed_core::core::indicators::{cardiovascular, contact, movement};
use smartbed_core::{PresenceEngine, SensorSample};

fn t(secs: i64) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-03-10T23:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
        + Duration::seconds(secs)
}

fn occupant(secs: i64, temperature: f64) -> SensorSample {
    SensorSample::new(temperature, 0.2, t(secs))
        .with_heart_rate(62.0)
        .with_contact(true)
}

fn vacant(secs: i64) -> SensorSample {
    SensorSample::new(22.0, 0.0, t(secs))
}

/// An engine that has seen one empty tick and then an occupant.
fn occupied_engine() -> PresenceEngine {
    let mut engine = PresenceEngine::default();
    engine.evaluate(&vacant(0));
    for secs in (5..60).step_by(5) {
        engine.evaluate(&occupant(secs, 22.0));
    }
    assert!(engine.is_occupied());
    engine
}

#[test]
fn test_body_signals_alone_reach_85() {
    let config = PresenceConfig::default();

    for hr in [50.0, 57.5, 65.0, 72.5, 80.0] {
        for activity in [0.1001, 0.5, 3.0, 1e6] {
            for temperature in [-5.0, 18.0, 22.0, 37.0] {
                let sample = SensorSample::new(temperature, activity, t(0))
                    .with_heart_rate(hr)
                    .with_contact(true);

                let body = movement(&sample, &config).score
                    + cardiovascular(&sample, &config).score
                    + contact(&sample).score;
                assert!(body >= 85.0, "hr={hr} activity={activity}: {body}");

                let mut engine = PresenceEngine::default();
                let result = engine.evaluate(&sample);
                assert!(result.confidence >= 85.0);
                assert!(result.occupied);
            }
        }
    }
}

#[test]
fn test_confidence_always_clamped() {
    let samples = [
        SensorSample::new(1e9, 1e9, t(0))
            .with_heart_rate(60.0)
            .with_contact(true),
        SensorSample::new(f64::NAN, f64::NAN, t(5)).with_heart_rate(f64::NAN),
        SensorSample::new(-1e9, -1e9, t(10)).with_heart_rate(-60.0),
        SensorSample::new(f64::INFINITY, f64::INFINITY, t(15))
            .with_heart_rate(f64::INFINITY)
            .with_contact(true),
    ];

    let mut engine = PresenceEngine::default();
    engine.evaluate(&vacant(0));
    for _ in 0..3 {
        for sample in &samples {
            let result = engine.evaluate(sample);
            assert!(
                (0.0..=100.0).contains(&result.confidence),
                "confidence out of range: {}",
                result.confidence
            );
        }
    }
    assert!(engine
        .state()
        .baseline_temperature()
        .is_some_and(f64::is_finite));
}

#[test]
fn test_non_finite_temperature_keeps_thermal_working() {
    let mut engine = PresenceEngine::default();
    engine.evaluate(&vacant(0));
    engine.evaluate(&SensorSample::new(f64::NAN, 0.0, t(5)));

    for i in 0..100 {
        engine.evaluate(&vacant(10 + i * 5));
    }
    let baseline = engine.state().baseline_temperature().unwrap();
    assert!((baseline - 22.0).abs() < 1e-9);

    let warm = engine.evaluate(&SensorSample::new(26.0, 0.0, t(600)));
    assert!(warm.indicators.thermal);
    assert!((warm.temp_elevation - 4.0).abs() < 1e-6);
}

#[test]
fn test_exit_needs_full_confirmation_run() {
    let mut engine = occupied_engine();
    let mut secs = 60;

    for tick in 1..=14 {
        let result = engine.evaluate(&vacant(secs));
        assert!(result.confidence <= 20.0);
        assert!(result.occupied, "left early on low tick {tick}");
        assert!(!result.changed_this_tick);
        secs += 5;
    }

    let result = engine.evaluate(&vacant(secs));
    assert!(!result.occupied);
    assert!(result.changed_this_tick);
    assert_eq!(result.time_occupied_minutes, None);
}

#[test]
fn test_mid_confidence_tick_restarts_confirmation() {
    let mut engine = occupied_engine();
    let mut secs = 60;

    for _ in 0..10 {
        engine.evaluate(&vacant(secs));
        secs += 5;
    }

    // Contact alone scores 20; the older high ticks still block the exit.
    let touch = SensorSample::new(22.0, 0.0, t(secs)).with_contact(true);
    assert!(engine.evaluate(&touch).occupied);
    secs += 5;

    // A heartbeat alone (40) breaks the run.
    let pulse = SensorSample::new(22.0, 0.0, t(secs)).with_heart_rate(62.0);
    assert!(engine.evaluate(&pulse).occupied);
    secs += 5;

    for _ in 0..14 {
        assert!(engine.evaluate(&vacant(secs)).occupied);
        secs += 5;
    }
    assert!(!engine.evaluate(&vacant(secs)).occupied);
}

#[test]
fn test_entry_is_single_tick() {
    let mut engine = PresenceEngine::default();
    assert!(!engine.evaluate(&vacant(0)).occupied);

    let mut changes = 0;
    for secs in (5..300).step_by(5) {
        let result = engine.evaluate(&occupant(secs, 22.0));
        assert!(result.occupied);
        if result.changed_this_tick {
            changes += 1;
            assert_eq!(secs, 5);
        }
    }
    assert_eq!(changes, 1);
}

#[test]
fn test_baseline_frozen_while_occupied() {
    let mut engine = occupied_engine();
    let baseline = engine.state().baseline_temperature();
    assert_eq!(baseline, Some(22.0));

    for (i, temperature) in [28.0, 33.0, 40.0, 45.0, 31.0].iter().enumerate() {
        let result = engine.evaluate(&occupant(60 + i as i64 * 5, *temperature));
        assert!(result.occupied);
        assert_eq!(engine.state().baseline_temperature(), baseline);
        assert!((result.temp_elevation - (temperature - 22.0)).abs() < 1e-9);
    }

    // Once vacant the baseline follows the room again.
    let mut secs = 100;
    while engine.is_occupied() {
        engine.evaluate(&vacant(secs));
        secs += 5;
    }
    engine.evaluate(&SensorSample::new(24.0, 0.0, t(secs)));
    let drifted = engine.state().baseline_temperature().unwrap();
    assert!(drifted > 22.0 && drifted < 24.0);
}

#[test]
fn test_calibrated_median_reads_as_no_elevation() {
    let mut engine = PresenceEngine::default();
    let readings = [21.6, 22.4, 21.9, 22.1, 22.0];

    let baseline = engine.calibrate_baseline(&readings).unwrap();
    assert!((baseline - 22.0).abs() < 1e-9);

    let result = engine.evaluate(&SensorSample::new(baseline, 0.0, t(0)));
    assert!(!result.indicators.thermal);
    assert!(result.temp_elevation.abs() < 1e-9);
    assert!(!result.occupied);
}

#[test]
fn test_calibration_rejects_short_capture() {
    let mut engine = PresenceEngine::default();
    engine.evaluate(&vacant(0));

    assert!(engine.calibrate_baseline(&[30.0, 31.0]).is_err());
    assert!(engine.calibrate_baseline(&[22.0, f64::NAN, 21.0]).is_err());
    assert_eq!(engine.state().baseline_temperature(), Some(22.0));

    let baseline = engine
        .calibrate_baseline(&[21.0, f64::NAN, 21.4, 21.2])
        .unwrap();
    assert!((baseline - 21.2).abs() < 1e-9);
}

#[test]
fn test_independent_engines() {
    let mut left = PresenceEngine::default();
    let mut right = PresenceEngine::default();

    left.evaluate(&vacant(0));
    right.evaluate(&vacant(0));
    left.evaluate(&occupant(5, 22.0));

    assert!(left.is_occupied());
    assert!(!right.is_occupied());
    assert!(right.evaluate(&vacant(5)).confidence < 20.0);
}
