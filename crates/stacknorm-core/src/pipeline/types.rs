use std::path::PathBuf;

use crate::error::StackNormError;
use crate::grouping::GroupingAmbiguity;
use crate::naming::ChannelFile;
use crate::stack::QuantizedStack;

/// A transformed and written channel, kept only while its group is open.
#[derive(Clone, Debug)]
pub struct ChannelResult {
    pub pixels: QuantizedStack,
    pub output_file_name: String,
    pub display_color: String,
    pub channel_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Decode,
    Shape,
    Ambiguous,
    Other,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode => write!(f, "decode"),
            Self::Shape => write!(f, "shape"),
            Self::Ambiguous => write!(f, "ambiguous"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A channel that was skipped, with enough context to find the bad input.
#[derive(Clone, Debug)]
pub struct ChannelFailure {
    pub base_name: String,
    pub channel_id: String,
    pub file_name: String,
    pub kind: FailureKind,
    pub message: String,
}

impl ChannelFailure {
    pub(super) fn new(member: &ChannelFile, error: &StackNormError) -> Self {
        let kind = match error {
            StackNormError::InputDecode { .. } => FailureKind::Decode,
            StackNormError::InputShape(_) => FailureKind::Shape,
            StackNormError::AmbiguousChannel { .. } => FailureKind::Ambiguous,
            _ => FailureKind::Other,
        };
        Self {
            base_name: member.base_name.clone(),
            channel_id: member.channel_id.clone(),
            file_name: member.file_name.clone(),
            kind,
            message: error.to_string(),
        }
    }
}

/// Outcome of a batch run.
///
/// A group counts as failed when any of its channels failed.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub groups_total: usize,
    pub groups_succeeded: usize,
    pub groups_failed: usize,
    pub channels_succeeded: usize,
    pub channels_failed: usize,
    pub failures: Vec<ChannelFailure>,
    pub ambiguities: Vec<GroupingAmbiguity>,
    pub metadata_files: Vec<PathBuf>,
    pub preview_failures: usize,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.channels_failed == 0 && self.preview_failures == 0
    }
}

/// Progress callbacks for a batch run. All methods default to no-ops.
pub trait ProgressReporter: Send + Sync {
    fn begin_run(&self, _total_groups: usize) {}

    fn begin_group(&self, _base_name: &str, _channels: usize) {}

    /// One channel of the current group finished, successfully or not.
    fn channel_done(&self, _channel_id: &str, _succeeded: bool) {}

    fn finish_group(&self, _groups_done: usize) {}

    fn finish_run(&self) {}
}

/// Reporter that ignores everything.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
