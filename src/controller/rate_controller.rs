// ABOUTME: RateController - counts aggregate production and throttles producers toward a target rate.
// ABOUTME: A ticking background loop wakes throttled producers whenever the rate drops below target.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::Pacing;
use crate::config::PipelineConfig;
use crate::error::ConfigError;

/// Smallest elapsed time used when computing the rate, in seconds.
const MIN_ELAPSED_SECS: f64 = 1e-6;

const DEFAULT_WARMUP_THRESHOLD: u64 = 5;
const DEFAULT_TICK: Duration = Duration::from_millis(10);

/// Lifecycle of a rate controller. `Stopped` is terminal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ControllerState {
    Running = 0,
    Stopped = 1,
}

impl ControllerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ControllerState::Running,
            _ => ControllerState::Stopped,
        }
    }
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerState::Running => write!(f, "running"),
            ControllerState::Stopped => write!(f, "stopped"),
        }
    }
}

/// What a call to [`RateController::throttle`] did to the caller's pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleAction {
    /// Rate was above target: the sleep grew by `delta` and the caller waited
    /// `waited` for the rate to come back down.
    SlowDown { delta: Duration, waited: Duration },
    /// Rate was below target: the sleep shrank by up to `delta`.
    SpeedUp { delta: Duration },
    /// Rate was exactly on target.
    Hold,
}

/// Shared production-rate controller.
///
/// Rates are expressed in items per minute over the whole lifetime of the
/// controller: `60 * produced / elapsed_secs`.
///
/// Each producer is responsible for its own pacing: it calls
/// [`throttle`](Self::throttle) with a mutable borrow of its [`Pacing`],
/// and the controller adjusts that value inside the producer's own call.
/// Slowing down is synchronous (the caller waits until the rate is back at
/// or under target); speeding up never waits.
pub struct RateController {
    target_rate: f64,
    producer_count: usize,
    warmup_threshold: u64,
    tick: Duration,
    start: Instant,
    produced: AtomicU64,
    state: AtomicU8,
    /// Signalled by the background loop when the rate is under target.
    rate_ok: Notify,
    /// Wakes the background loop on stop.
    shutdown: Notify,
}

impl RateController {
    /// Create a running controller.
    ///
    /// # Arguments
    ///
    /// * `target_rate` - Target aggregate rate in items per minute.
    /// * `producer_count` - Number of producers sharing the adjustment.
    pub fn new(target_rate: f64, producer_count: usize) -> Result<Self, ConfigError> {
        if !(target_rate.is_finite() && target_rate > 0.0) {
            return Err(ConfigError::InvalidTargetRate(target_rate));
        }
        if producer_count == 0 {
            return Err(ConfigError::NoProducers);
        }

        Ok(Self {
            target_rate,
            producer_count,
            warmup_threshold: DEFAULT_WARMUP_THRESHOLD,
            tick: DEFAULT_TICK,
            start: Instant::now(),
            produced: AtomicU64::new(0),
            state: AtomicU8::new(ControllerState::Running as u8),
            rate_ok: Notify::new(),
            shutdown: Notify::new(),
        })
    }

    /// Build a controller from a validated pipeline config.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config.target_rate, config.producers)?
            .warmup_threshold(config.warmup_threshold)
            .tick(config.tick_duration()))
    }

    /// Set how many items must be produced before throttling is trusted.
    pub fn warmup_threshold(mut self, threshold: u64) -> Self {
        self.warmup_threshold = threshold;
        self
    }

    /// Set the background loop period. Clamped to at least one millisecond.
    pub fn tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    /// Count one produced item. Returns the new total.
    pub fn record_production(&self) -> u64 {
        self.produced.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn produced(&self) -> u64 {
        self.produced.load(Ordering::Acquire)
    }

    /// True once aggregate production exceeds the warm-up threshold.
    pub fn warmed_up(&self) -> bool {
        self.produced() > self.warmup_threshold
    }

    /// Aggregate rate since construction, in items per minute.
    pub fn current_rate(&self) -> f64 {
        let elapsed = self.start.elapsed().as_secs_f64().max(MIN_ELAPSED_SECS);
        60.0 * self.produced() as f64 / elapsed
    }

    /// Background loop period.
    pub fn tick_interval(&self) -> Duration {
        self.tick
    }

    pub fn target_rate(&self) -> f64 {
        self.target_rate
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn state(&self) -> ControllerState {
        ControllerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == ControllerState::Stopped
    }

    /// Adjust `pacing` toward the target rate.
    ///
    /// Above target, the sleep grows by
    /// `|rate - target| / (producer_count * 60)` seconds and the call waits
    /// until the rate is at or under target, or the controller stops. Below
    /// target, the sleep shrinks by the same amount, floored at zero, and the
    /// call returns immediately.
    pub async fn throttle(&self, pacing: &mut Pacing) -> ThrottleAction {
        let rate = self.current_rate();
        let diff = (rate - self.target_rate).abs();
        let delta = Duration::from_secs_f64(diff / (self.producer_count as f64 * 60.0));

        if rate > self.target_rate {
            pacing.slow_down(delta);
            debug!(rate, target = self.target_rate, ?delta, "rate above target, slowing down");

            let started = Instant::now();
            self.wait_until_under_target().await;
            ThrottleAction::SlowDown {
                delta,
                waited: started.elapsed(),
            }
        } else if rate < self.target_rate {
            pacing.speed_up(delta);
            debug!(rate, target = self.target_rate, ?delta, "rate below target, speeding up");
            ThrottleAction::SpeedUp { delta }
        } else {
            ThrottleAction::Hold
        }
    }

    async fn wait_until_under_target(&self) {
        loop {
            let notified = self.rate_ok.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_stopped() || self.current_rate() <= self.target_rate {
                return;
            }

            notified.await;
        }
    }

    /// Background re-evaluation loop. Returns once the controller is stopped.
    pub async fn run(&self) {
        info!(target_rate = self.target_rate, tick = ?self.tick, "rate controller started");

        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let shutdown = self.shutdown.notified();
            tokio::pin!(shutdown);
            shutdown.as_mut().enable();

            if self.is_stopped() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                () = &mut shutdown => {}
            }

            if self.is_stopped() {
                break;
            }

            if self.current_rate() < self.target_rate {
                self.rate_ok.notify_waiters();
            }
        }

        info!(produced = self.produced(), "rate controller quitting");
    }

    /// Run the background loop on a new tokio task.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.run().await })
    }

    /// Move to `Stopped`, ending the background loop and releasing every
    /// throttled producer. Idempotent.
    pub fn stop(&self) {
        let previous = self
            .state
            .swap(ControllerState::Stopped as u8, Ordering::SeqCst);
        if ControllerState::from_u8(previous) == ControllerState::Running {
            debug!("rate controller stopping");
        }

        self.shutdown.notify_waiters();
        self.rate_ok.notify_waiters();
    }
}
