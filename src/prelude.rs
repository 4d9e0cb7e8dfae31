// ABOUTME: Prelude module - convenient imports for common use cases.
// ABOUTME: Use `use ratepipe::prelude::*;` to get started quickly.

pub use crate::channel::BoundedChannel;
pub use crate::config::PipelineConfig;
pub use crate::controller::{ControllerState, Pacing, RateController, ThrottleAction};
pub use crate::error::{Closed, ConfigError, PipelineError};
pub use crate::guard::{Admission, GuardStats, ResourceGuard};
pub use crate::pipeline::{Pipeline, PipelineReport};
pub use crate::saver::{FetchSaver, NullSaver, Saver};
pub use crate::source::{FnSource, ItemSource, SequenceSource, ThumbnailUrlSource};
pub use crate::worker::{
    Consumer, ConsumerExit, ConsumerSummary, Producer, ProducerSummary, StopSignal,
};
