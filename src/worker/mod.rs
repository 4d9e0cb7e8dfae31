// ABOUTME: Worker module - producer and consumer loops plus their cooperative stop signal.
// ABOUTME: Every blocking step races against the worker's StopSignal.

mod consumer;
mod producer;
mod signal;

pub use consumer::{Consumer, ConsumerExit, ConsumerSummary};
pub use producer::{Producer, ProducerSummary};
pub use signal::StopSignal;
