// ABOUTME: Root module for ratepipe - a rate-governed producer/consumer pipeline.
// ABOUTME: Re-exports the public types from each submodule.

pub mod channel;
pub mod config;
pub mod controller;
pub mod error;
pub mod guard;
pub mod pipeline;
pub mod prelude;
pub mod saver;
pub mod source;
pub mod worker;

pub use error::{ConfigError, PipelineError};
