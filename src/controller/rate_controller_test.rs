// ABOUTME: Tests for the rate controller - counting, rate math, throttle decisions, stop.
// ABOUTME: Time-sensitive cases run on tokio's paused clock so they are deterministic.

use std::sync::Arc;
use std::time::Duration;

use super::{ControllerState, Pacing, RateController, ThrottleAction};
use crate::config::PipelineConfig;
use crate::error::ConfigError;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn test_new_rejects_invalid_arguments() {
    assert!(matches!(
        RateController::new(0.0, 1),
        Err(ConfigError::InvalidTargetRate(_))
    ));
    assert!(matches!(
        RateController::new(f64::INFINITY, 1),
        Err(ConfigError::InvalidTargetRate(_))
    ));
    assert!(matches!(
        RateController::new(60.0, 0),
        Err(ConfigError::NoProducers)
    ));
}

#[test]
fn test_from_config_validates() {
    let config = PipelineConfig::new().queue_capacity(0);
    assert!(matches!(
        RateController::from_config(&config),
        Err(ConfigError::ZeroCapacity)
    ));

    let config = PipelineConfig::new().target_rate(600.0).producers(2);
    let controller = RateController::from_config(&config).unwrap();
    assert_eq!(controller.target_rate(), 600.0);
    assert_eq!(controller.state(), ControllerState::Running);
}

#[test]
fn test_controller_state_display() {
    assert_eq!(ControllerState::Running.to_string(), "running");
    assert_eq!(ControllerState::Stopped.to_string(), "stopped");
}

#[test]
fn test_record_production_is_atomic_across_threads() {
    let controller = Arc::new(RateController::new(60.0, 8).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let controller = controller.clone();
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    controller.record_production();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(controller.produced(), 8000);
}

#[test]
fn test_warm_up_threshold() {
    let controller = RateController::new(60.0, 1).unwrap();
    for expected in 1..=5 {
        assert_eq!(controller.record_production(), expected);
        assert!(!controller.warmed_up());
    }
    controller.record_production();
    assert!(controller.warmed_up());

    let controller = RateController::new(60.0, 1).unwrap().warmup_threshold(0);
    assert!(!controller.warmed_up());
    controller.record_production();
    assert!(controller.warmed_up());
}

#[tokio::test(start_paused = true)]
async fn test_current_rate_at_time_zero_is_finite() {
    let controller = RateController::new(60.0, 1).unwrap();
    assert_eq!(controller.current_rate(), 0.0);

    controller.record_production();
    assert!(controller.current_rate().is_finite());
}

#[tokio::test(start_paused = true)]
async fn test_current_rate_is_items_per_minute() {
    let controller = RateController::new(60.0, 1).unwrap();
    for _ in 0..10 {
        controller.record_production();
    }

    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(approx_eq(controller.current_rate(), 10.0));

    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(approx_eq(controller.current_rate(), 5.0));
}

#[tokio::test(start_paused = true)]
async fn test_throttle_below_target_speeds_up_without_waiting() {
    let controller = RateController::new(600.0, 2).unwrap();
    controller.record_production();
    tokio::time::advance(Duration::from_secs(60)).await;

    // rate = 1/min, delta = 599 / 120 seconds
    let mut pacing = Pacing::new(Duration::from_secs(10));
    let action = controller.throttle(&mut pacing).await;

    let expected_delta = Duration::from_secs_f64(599.0 / 120.0);
    assert_eq!(action, ThrottleAction::SpeedUp { delta: expected_delta });
    assert_eq!(pacing.sleep(), Duration::from_secs(10) - expected_delta);

    // A second call floors at zero
    let mut pacing = Pacing::new(Duration::from_secs(1));
    controller.throttle(&mut pacing).await;
    assert_eq!(pacing.sleep(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_throttle_above_target_waits_for_rate_to_settle() {
    let controller = Arc::new(RateController::new(60.0, 1).unwrap());
    let background = controller.spawn();

    for _ in 0..10 {
        controller.record_production();
    }
    tokio::time::advance(Duration::from_secs(1)).await;

    // rate = 600/min against a target of 60/min: needs 10s of elapsed time
    let mut pacing = Pacing::new(Duration::from_secs(1));
    let action = controller.throttle(&mut pacing).await;

    match action {
        ThrottleAction::SlowDown { delta, waited } => {
            assert_eq!(delta, Duration::from_secs(9));
            assert!(waited >= Duration::from_secs(9), "waited {:?}", waited);
            assert!(waited < Duration::from_secs(10), "waited {:?}", waited);
        }
        other => panic!("Expected SlowDown, got {:?}", other),
    }
    assert_eq!(pacing.sleep(), Duration::from_secs(10));
    assert!(controller.current_rate() <= 60.0);

    controller.stop();
    background.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stop_releases_throttled_producer() {
    // No background loop: only stop can wake the waiter
    let controller = Arc::new(RateController::new(1.0, 1).unwrap());
    for _ in 0..100 {
        controller.record_production();
    }
    tokio::time::advance(Duration::from_secs(1)).await;

    let waiter = {
        let controller = controller.clone();
        tokio::spawn(async move {
            let mut pacing = Pacing::default();
            controller.throttle(&mut pacing).await
        })
    };

    tokio::task::yield_now().await;
    assert!(!waiter.is_finished());

    controller.stop();
    let action = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("throttled producer should be released by stop")
        .unwrap();
    assert!(matches!(action, ThrottleAction::SlowDown { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_throttle_after_stop_returns_immediately() {
    let controller = RateController::new(1.0, 1).unwrap();
    for _ in 0..100 {
        controller.record_production();
    }
    tokio::time::advance(Duration::from_secs(1)).await;
    controller.stop();

    let mut pacing = Pacing::default();
    let action = controller.throttle(&mut pacing).await;
    match action {
        ThrottleAction::SlowDown { waited, .. } => assert_eq!(waited, Duration::ZERO),
        other => panic!("Expected SlowDown, got {:?}", other),
    }
}

#[tokio::test]
async fn test_background_loop_exits_on_stop() {
    let controller = Arc::new(RateController::new(60.0, 1).unwrap());
    let background = controller.spawn();

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!background.is_finished());

    controller.stop();
    tokio::time::timeout(Duration::from_secs(1), background)
        .await
        .expect("controller loop should exit")
        .unwrap();

    assert_eq!(controller.state(), ControllerState::Stopped);

    // Idempotent
    controller.stop();
    assert!(controller.is_stopped());
}
