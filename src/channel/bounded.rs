// ABOUTME: Fixed-capacity FIFO channel with async push/pop for many producers and consumers.
// ABOUTME: Waiters register for wake-ups before re-checking state, so close and drain are never missed.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::error::{Closed, ConfigError};

/// Queue contents and the closed flag, protected by a single mutex.
struct ChannelState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// A bounded multi-producer, multi-consumer FIFO channel.
///
/// `push` waits while the channel is full and `pop` waits while it is empty.
/// Both observe [`close`](Self::close), which is how the pipeline guarantees
/// that no worker stays blocked after shutdown. Items are only ever lost
/// through [`try_drain_all`](Self::try_drain_all).
pub struct BoundedChannel<T> {
    state: Mutex<ChannelState<T>>,
    not_full: Notify,
    not_empty: Notify,
    capacity: usize,
}

impl<T> BoundedChannel<T> {
    /// Create a channel that holds at most `capacity` items.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        Ok(Self {
            state: Mutex::new(ChannelState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_full: Notify::new(),
            not_empty: Notify::new(),
            capacity,
        })
    }

    fn state(&self) -> MutexGuard<'_, ChannelState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item at the tail, waiting for space if the channel is full.
    ///
    /// Returns `Err(Closed(item))` if the channel is or becomes closed before
    /// the item could be queued.
    pub async fn push(&self, item: T) -> Result<(), Closed<T>> {
        loop {
            let notified = self.not_full.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state();
                if state.closed {
                    return Err(Closed(item));
                }
                if state.items.len() < self.capacity {
                    state.items.push_back(item);
                    drop(state);
                    self.not_empty.notify_one();
                    return Ok(());
                }
            }

            notified.await;
        }
    }

    /// Remove the item at the head, waiting if the channel is empty.
    ///
    /// Returns `None` once the channel is closed and has no items left.
    pub async fn pop(&self) -> Option<T> {
        loop {
            let notified = self.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state();
                if let Some(item) = state.items.pop_front() {
                    drop(state);
                    self.not_full.notify_one();
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Discard everything currently queued without waiting.
    ///
    /// Wakes every blocked pusher. Returns the number of items discarded.
    pub fn try_drain_all(&self) -> usize {
        let drained = {
            let mut state = self.state();
            let count = state.items.len();
            state.items.clear();
            count
        };
        self.not_full.notify_waiters();
        drained
    }

    /// Close the channel. Pending and future pushes fail; pops return the
    /// remaining items and then `None`. Idempotent.
    pub fn close(&self) {
        self.state().closed = true;
        self.not_full.notify_waiters();
        self.not_empty.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.state().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
