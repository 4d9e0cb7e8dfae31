// ABOUTME: Guard module - the bounded admission gate consumers pass before saving.
// ABOUTME: Grants at most `limit` slots; failed saves hand their slot back.

mod resource_guard;

pub use resource_guard::{Admission, GuardStats, ResourceGuard};
