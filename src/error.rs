// ABOUTME: Defines all error types for the ratepipe library using thiserror.
// ABOUTME: Configuration errors are fatal at construction; worker errors surface from joins.

use std::path::PathBuf;

/// Top-level error type for the ratepipe library.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Errors from building or loading a pipeline configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("queue capacity must be positive")]
    ZeroCapacity,

    #[error("target rate must be a positive number, got {0}")]
    InvalidTargetRate(f64),

    #[error("at least one producer is required")]
    NoProducers,

    #[error("at least one consumer is required")]
    NoConsumers,

    #[error("admission limit must be positive")]
    ZeroLimit,

    #[error("controller tick must be non-zero")]
    ZeroTick,

    #[error("fetch timeout must be non-zero")]
    ZeroFetchTimeout,

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Returned by [`BoundedChannel::push`](crate::channel::BoundedChannel::push)
/// when the channel has been closed. Carries the rejected item back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closed<T>(pub T);

impl<T> Closed<T> {
    /// Take back the item that could not be pushed.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::fmt::Display for Closed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "channel closed")
    }
}

impl<T: std::fmt::Debug> std::error::Error for Closed<T> {}
