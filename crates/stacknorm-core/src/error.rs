use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackNormError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read input directory {}: {reason}", path.display())]
    InputDirectory { path: PathBuf, reason: String },

    #[error("Cannot decode {}: {reason}", path.display())]
    InputDecode { path: PathBuf, reason: String },

    #[error("Invalid input shape: {0}")]
    InputShape(String),

    #[error("Channel {channel_id} of group '{base_name}' is already taken by {kept}")]
    AmbiguousChannel {
        base_name: String,
        channel_id: String,
        kept: String,
    },

    #[error("Cannot write {}: {reason}", path.display())]
    OutputWrite { path: PathBuf, reason: String },

    #[error("Metadata error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StackNormError {
    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::InputDecode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::OutputWrite {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error must abort the whole run rather than a single channel.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::OutputWrite { .. } | Self::InputDirectory { .. } | Self::InvalidConfig(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StackNormError>;
