// ABOUTME: Consumer worker - pops items and saves them through the resource guard.
// ABOUTME: Stops on its own only when the guard denies admission.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::StopSignal;
use crate::channel::BoundedChannel;
use crate::guard::{Admission, ResourceGuard};
use crate::saver::Saver;

/// Why a consumer loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerExit {
    /// The admission limit was reached.
    Denied,
    /// An external stop was requested, possibly in the middle of a save.
    Stopped,
    /// The channel was closed and empty.
    ChannelClosed,
}

impl std::fmt::Display for ConsumerExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsumerExit::Denied => write!(f, "denied"),
            ConsumerExit::Stopped => write!(f, "stopped"),
            ConsumerExit::ChannelClosed => write!(f, "channel closed"),
        }
    }
}

/// Final state of a consumer after its loop ends.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumerSummary {
    pub id: String,
    /// Items taken off the channel, including the one that was denied.
    pub processed: u64,
    /// Items whose save succeeded and kept their admission slot.
    pub saved: u64,
    /// Items whose save failed; their slots were released.
    pub failed: u64,
    /// Items whose save was abandoned by a stop; their slots were released.
    pub cancelled: u64,
    /// Why the loop ended.
    pub exit: ConsumerExit,
}

/// A consumer worker.
pub struct Consumer<T> {
    id: String,
    channel: Arc<BoundedChannel<T>>,
    guard: Arc<ResourceGuard>,
    saver: Arc<dyn Saver<T>>,
    stop: Arc<StopSignal>,
}

impl<T: Send + Sync + 'static> Consumer<T> {
    pub fn new(
        channel: Arc<BoundedChannel<T>>,
        guard: Arc<ResourceGuard>,
        saver: Arc<dyn Saver<T>>,
    ) -> Self {
        Self {
            id: format!("consumer-{}", Uuid::new_v4().simple()),
            channel,
            guard,
            saver,
            stop: Arc::new(StopSignal::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Handle used to force this consumer to stop.
    pub fn stop_signal(&self) -> Arc<StopSignal> {
        Arc::clone(&self.stop)
    }

    /// Consume until denied, stopped, or the channel closes.
    pub async fn run(self) -> ConsumerSummary {
        debug!(id = %self.id, "consumer started");

        let mut processed = 0;
        let mut saved = 0;
        let mut failed = 0;
        let mut cancelled = 0;

        let exit = loop {
            if self.stop.is_stopped() {
                break ConsumerExit::Stopped;
            }

            let item = tokio::select! {
                biased;
                () = self.stop.stopped() => break ConsumerExit::Stopped,
                item = self.channel.pop() => item,
            };
            let Some(item) = item else {
                break ConsumerExit::ChannelClosed;
            };

            processed += 1;

            match self
                .guard
                .perform_guarded_work_with_cancel(
                    &item,
                    self.saver.as_ref(),
                    self.stop.stopped(),
                )
                .await
            {
                Admission::Saved => saved += 1,
                Admission::Released { .. } => failed += 1,
                Admission::Cancelled => {
                    cancelled += 1;
                    debug!(id = %self.id, "save abandoned on stop");
                    break ConsumerExit::Stopped;
                }
                Admission::Denied => {
                    info!(id = %self.id, processed, "admission limit reached, quitting");
                    break ConsumerExit::Denied;
                }
            }
        };

        debug!(id = %self.id, %exit, processed, saved, failed, "consumer stopped");

        ConsumerSummary {
            id: self.id,
            processed,
            saved,
            failed,
            cancelled,
            exit,
        }
    }
}
