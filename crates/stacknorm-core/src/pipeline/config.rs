use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StackNormError};
use crate::policy::ProcessingPolicy;

/// Everything one batch run needs. Loaded once, then passed by reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Hand each finished group to the preview collaborator.
    #[serde(default)]
    pub show_preview: bool,
    #[serde(default)]
    pub policy: ProcessingPolicy,
}

impl RunConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            show_preview: false,
            policy: ProcessingPolicy::default(),
        }
    }

    /// Reject unusable settings before any file is touched.
    ///
    /// Directories are compared after resolving `.`/`..` and symlinks, so a
    /// second spelling of the input directory is refused too.
    pub fn validate(&self) -> Result<()> {
        if resolve_dir(&self.input_dir) == resolve_dir(&self.output_dir) {
            return Err(StackNormError::InvalidConfig(format!(
                "output directory {} must differ from the input directory",
                self.output_dir.display()
            )));
        }
        self.policy.validate()
    }
}

/// Canonical form of an existing directory; a missing one stays literal.
fn resolve_dir(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
