//! Pipeline orchestration and progress reporting
//!
//! - **`orchestrator`**: wires dump, parser, worker pool and writer together
//! - **`progress`**: input counters, interim progress lines, final summary

pub mod orchestrator;
pub mod progress;

pub use orchestrator::{run, PipelineConfig, DEFAULT_PROGRESS_INTERVAL, DEFAULT_TERMINATION_TIMEOUT};
pub use progress::{display_progress, InputStats, ProgressReporter, Summary};
