// ABOUTME: Pipeline configuration - sizes, rates, limits and pacing defaults.
// ABOUTME: Loads from JSON, supports builder-style overrides, validates before startup.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Start parameters for a [`Pipeline`](crate::pipeline::Pipeline).
///
/// Every field has a default, so a config file only needs the values it
/// wants to change:
///
/// ```json
/// { "target_rate": 600.0, "admission_limit": 20 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capacity of the shared bounded channel.
    pub queue_capacity: usize,

    /// Target aggregate production, in items per minute.
    pub target_rate: f64,

    /// Number of producer workers.
    pub producers: usize,

    /// Number of consumer workers.
    pub consumers: usize,

    /// Total successful admissions the resource guard will grant.
    pub admission_limit: usize,

    /// Aggregate production count that must be exceeded before throttling starts.
    pub warmup_threshold: u64,

    /// Sleep interval each producer starts with, in milliseconds.
    pub initial_sleep_ms: u64,

    /// Rate controller re-evaluation period, in milliseconds.
    pub tick_ms: u64,

    /// Per-request timeout for savers that go over the network, in milliseconds.
    pub fetch_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 2000,
            target_rate: 550.0,
            producers: 3,
            consumers: 5,
            admission_limit: 100,
            warmup_threshold: 5,
            initial_sleep_ms: 1000,
            tick_ms: 10,
            fetch_timeout_ms: 30_000,
        }
    }
}

impl PipelineConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from a JSON string. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Set the channel capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the target rate in items per minute.
    pub fn target_rate(mut self, rate: f64) -> Self {
        self.target_rate = rate;
        self
    }

    /// Set the number of producers.
    pub fn producers(mut self, count: usize) -> Self {
        self.producers = count;
        self
    }

    /// Set the number of consumers.
    pub fn consumers(mut self, count: usize) -> Self {
        self.consumers = count;
        self
    }

    /// Set the admission limit.
    pub fn admission_limit(mut self, limit: usize) -> Self {
        self.admission_limit = limit;
        self
    }

    /// Set the warm-up threshold.
    pub fn warmup_threshold(mut self, threshold: u64) -> Self {
        self.warmup_threshold = threshold;
        self
    }

    /// Set the initial producer sleep interval. Sub-millisecond parts are dropped.
    pub fn initial_sleep(mut self, sleep: Duration) -> Self {
        self.initial_sleep_ms = whole_millis(sleep);
        self
    }

    /// Set the controller tick interval. Clamped to at least one millisecond,
    /// the same floor [`RateController::tick`](crate::controller::RateController::tick) applies.
    pub fn tick(mut self, tick: Duration) -> Self {
        self.tick_ms = whole_millis(tick).max(1);
        self
    }

    /// Set the network save timeout. Clamped to at least one millisecond.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_ms = whole_millis(timeout).max(1);
        self
    }

    pub fn initial_sleep_duration(&self) -> Duration {
        Duration::from_millis(self.initial_sleep_ms)
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn fetch_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Check that every value is usable before any worker starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !(self.target_rate.is_finite() && self.target_rate > 0.0) {
            return Err(ConfigError::InvalidTargetRate(self.target_rate));
        }
        if self.producers == 0 {
            return Err(ConfigError::NoProducers);
        }
        if self.consumers == 0 {
            return Err(ConfigError::NoConsumers);
        }
        if self.admission_limit == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTick);
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::ZeroFetchTimeout);
        }
        Ok(())
    }
}

fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
