// ABOUTME: PipelineReport - final counts and per-worker summaries from a completed run.
// ABOUTME: Serializable for JSON output and printable as a short human summary.

use std::time::Duration;

use serde::Serialize;

use crate::worker::{ConsumerSummary, ProducerSummary};

/// Final counts from a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Items pushed onto the channel.
    pub produced: u64,
    /// Guard invocations that were granted a slot.
    pub admitted: u64,
    /// Guard invocations that were refused.
    pub denied: u64,
    /// Admitted items whose save failed or was cancelled, and whose slot was returned.
    pub released: u64,
    /// Admitted items whose save succeeded.
    pub saved: u64,
    /// Items discarded from the channel during shutdown.
    pub drained: u64,
    /// Items left in the channel at the end. Always zero after shutdown.
    pub remaining: usize,
    /// Admission limit the guard was built with.
    pub limit: usize,
    /// Target rate in items per minute.
    pub target_rate: f64,
    /// Aggregate rate over the whole run, in items per minute.
    pub final_rate: f64,
    pub elapsed: Duration,
    pub producers: Vec<ProducerSummary>,
    pub consumers: Vec<ConsumerSummary>,
}

impl PipelineReport {
    /// Total calls into the resource guard.
    pub fn guard_invocations(&self) -> u64 {
        self.consumers.iter().map(|c| c.processed).sum()
    }

    /// Check the counters against each other.
    ///
    /// Every guard invocation was either admitted or denied, no more than
    /// `limit` saves were kept, and every produced item was either processed
    /// by a consumer or drained.
    pub fn is_consistent(&self) -> bool {
        let invocations = self.guard_invocations();
        self.admitted + self.denied == invocations
            && self.saved <= self.limit as u64
            && self.produced == invocations + self.drained
            && self.remaining == 0
    }
}

impl std::fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Produced:  {}", self.produced)?;
        writeln!(f, "Admitted:  {} (limit {})", self.admitted, self.limit)?;
        writeln!(f, "Saved:     {}", self.saved)?;
        if self.released > 0 {
            writeln!(f, "Released:  {}", self.released)?;
        }
        writeln!(f, "Denied:    {}", self.denied)?;
        writeln!(f, "Drained:   {}", self.drained)?;
        write!(
            f,
            "Rate:      {:.1}/min (target {:.1}/min) over {:.2}s",
            self.final_rate,
            self.target_rate,
            self.elapsed.as_secs_f64()
        )
    }
}
