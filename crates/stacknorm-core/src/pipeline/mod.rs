pub mod config;
mod orchestrator;
mod types;

pub use orchestrator::{run_batch, run_groups};
pub use types::{
    ChannelFailure, ChannelResult, FailureKind, NoOpReporter, ProgressReporter, RunSummary,
};
