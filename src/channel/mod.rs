// ABOUTME: Channel module - the bounded FIFO buffer shared by producers and consumers.
// ABOUTME: Provides backpressure on full, waiting on empty, and shutdown via close/drain.

mod bounded;

pub use bounded::BoundedChannel;

#[cfg(test)]
mod bounded_test;
