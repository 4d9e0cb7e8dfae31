// ABOUTME: Defines the Saver trait - the external operation a consumer performs per item.
// ABOUTME: Failures are reported as errors and handled by the resource guard.

use async_trait::async_trait;

/// An operation that persists or otherwise consumes a single item.
///
/// Errors are never fatal to the pipeline: the guard logs them and returns
/// the admission slot.
#[async_trait]
pub trait Saver<T>: Send + Sync {
    /// Save one item.
    async fn save(&self, item: &T) -> Result<(), anyhow::Error>;
}
