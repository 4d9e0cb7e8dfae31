// ABOUTME: Saver module - the opaque, possibly failing save operation behind the guard.
// ABOUTME: Ships a no-op counting saver and an HTTP thumbnailing saver.

mod fetch;
mod null;
mod traits;

pub use fetch::{make_thumbnail, thumbnail_filename, FetchSaver, THUMBNAIL_SIZE};
pub use null::NullSaver;
pub use traits::Saver;
