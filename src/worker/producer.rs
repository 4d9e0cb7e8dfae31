// ABOUTME: Producer worker - generates items, pushes them, reports production, and paces itself.
// ABOUTME: Its Pacing is lent to the rate controller on each throttle call and nowhere else.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, trace};
use uuid::Uuid;

use super::StopSignal;
use crate::channel::BoundedChannel;
use crate::controller::{Pacing, RateController};
use crate::source::ItemSource;

/// Final state of a producer after its loop ends.
#[derive(Debug, Clone, Serialize)]
pub struct ProducerSummary {
    pub id: String,
    /// Items this producer pushed onto the channel.
    pub produced: u64,
    /// Sleep interval the rate controller had settled this producer on when it stopped.
    pub final_sleep: Duration,
}

/// A producer worker.
pub struct Producer<T> {
    id: String,
    channel: Arc<BoundedChannel<T>>,
    controller: Arc<RateController>,
    source: Arc<dyn ItemSource<T>>,
    pacing: Pacing,
    stop: Arc<StopSignal>,
    produced: u64,
}

impl<T: Send + 'static> Producer<T> {
    /// Create a producer that starts out sleeping `initial_sleep` between items.
    pub fn new(
        channel: Arc<BoundedChannel<T>>,
        controller: Arc<RateController>,
        source: Arc<dyn ItemSource<T>>,
        initial_sleep: Duration,
    ) -> Self {
        Self {
            id: format!("producer-{}", Uuid::new_v4().simple()),
            channel,
            controller,
            source,
            pacing: Pacing::new(initial_sleep),
            stop: Arc::new(StopSignal::new()),
            produced: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Handle used to ask this producer to stop.
    pub fn stop_signal(&self) -> Arc<StopSignal> {
        Arc::clone(&self.stop)
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Produce until stopped or the channel closes.
    pub async fn run(mut self) -> ProducerSummary {
        debug!(id = %self.id, sleep = ?self.pacing.sleep(), "producer started");

        while !self.stop.is_stopped() {
            let item = self.source.next_item();

            let pushed = tokio::select! {
                biased;
                () = self.stop.stopped() => break,
                result = self.channel.push(item) => result,
            };
            if pushed.is_err() {
                debug!(id = %self.id, "channel closed");
                break;
            }

            self.controller.record_production();
            self.produced += 1;

            if self.controller.warmed_up() {
                let action = tokio::select! {
                    biased;
                    () = self.stop.stopped() => break,
                    action = self.controller.throttle(&mut self.pacing) => action,
                };
                trace!(id = %self.id, ?action, sleep = ?self.pacing.sleep(), "throttled");
            }

            let sleep = self.pacing.sleep();
            if sleep.is_zero() {
                tokio::task::yield_now().await;
            } else if !self.stop.sleep(sleep).await {
                break;
            }
        }

        info!(id = %self.id, produced = self.produced, "producer stopped");

        ProducerSummary {
            id: self.id,
            produced: self.produced,
            final_sleep: self.pacing.sleep(),
        }
    }
}
