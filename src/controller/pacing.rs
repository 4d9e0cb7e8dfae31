// ABOUTME: Pacing - a producer's adaptive sleep interval between items.
// ABOUTME: Only adjusted through RateController::throttle while the producer lends it.

use std::time::Duration;

/// How long a producer sleeps after each item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pacing {
    sleep: Duration,
}

impl Pacing {
    pub fn new(sleep: Duration) -> Self {
        Self { sleep }
    }

    pub fn sleep(&self) -> Duration {
        self.sleep
    }

    pub(crate) fn slow_down(&mut self, delta: Duration) {
        self.sleep = self.sleep.saturating_add(delta);
    }

    /// Shorten the interval, never below zero.
    pub(crate) fn speed_up(&mut self, delta: Duration) {
        self.sleep = self.sleep.saturating_sub(delta);
    }
}
