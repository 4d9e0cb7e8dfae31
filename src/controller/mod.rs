// ABOUTME: Controller module - shared production rate tracking and producer throttling.
// ABOUTME: Producers lend their own Pacing to the controller; it never owns worker state.

mod pacing;
mod rate_controller;

pub use pacing::Pacing;
pub use rate_controller::{ControllerState, RateController, ThrottleAction};

#[cfg(test)]
mod rate_controller_test;
