// ABOUTME: NullSaver - accepts every item and only counts how many it saw.
// ABOUTME: Used for dry runs and as the default saver in tests.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use super::Saver;

/// A saver that discards items and always succeeds.
#[derive(Debug, Default)]
pub struct NullSaver {
    saved: AtomicU64,
}

impl NullSaver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items saved so far.
    pub fn saved(&self) -> u64 {
        self.saved.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Sync> Saver<T> for NullSaver {
    async fn save(&self, _item: &T) -> Result<(), anyhow::Error> {
        self.saved.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
