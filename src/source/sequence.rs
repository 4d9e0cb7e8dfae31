// ABOUTME: SequenceSource hands out strictly increasing u64 tags; FnSource wraps a closure.
// ABOUTME: Sequence tags let tests check FIFO order end to end.

use std::sync::atomic::{AtomicU64, Ordering};

use super::ItemSource;

/// Produces 0, 1, 2, ... across all callers.
#[derive(Debug, Default)]
pub struct SequenceSource {
    next: AtomicU64,
}

impl SequenceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tags handed out so far.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl ItemSource<u64> for SequenceSource {
    fn next_item(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

/// Adapts any `Fn() -> T` into an [`ItemSource`].
pub struct FnSource<F>(F);

impl<F> FnSource<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<T, F> ItemSource<T> for FnSource<F>
where
    F: Fn() -> T + Send + Sync,
{
    fn next_item(&self) -> T {
        (self.0)()
    }
}
