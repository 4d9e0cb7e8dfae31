// ABOUTME: Source module - item generators that producers draw from.
// ABOUTME: Includes random thumbnail URLs, monotonic sequence tags, and a closure adapter.

mod sequence;
mod thumbnail;
mod traits;

pub use sequence::{FnSource, SequenceSource};
pub use thumbnail::ThumbnailUrlSource;
pub use traits::ItemSource;
