// ABOUTME: Defines the ItemSource trait - a cheap, non-blocking generator of items.
// ABOUTME: Shared by every producer in a pipeline, so implementations must be Sync.

/// Supplies a new item on demand.
///
/// Called from async producer loops, so it must not block materially.
pub trait ItemSource<T>: Send + Sync {
    fn next_item(&self) -> T;
}
