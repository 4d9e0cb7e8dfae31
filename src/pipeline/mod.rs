// ABOUTME: Pipeline module - orchestrates controller, producers and consumers end to end.
// ABOUTME: Owns the startup order, the drain-then-stop shutdown sequence, and the final report.

mod orchestrator;
mod report;

pub use orchestrator::Pipeline;
pub use report::PipelineReport;
