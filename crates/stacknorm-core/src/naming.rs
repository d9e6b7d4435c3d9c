//! Channel file-name convention.
//!
//! Per-channel exports are named `<base>_C<token>.<ext>`. The rule is:
//!
//! ```text
//! name     := base "_C" token rest "." ext      (rightmost "_C")
//! token    := [^._]*                            (upper-cased, "C" re-prefixed)
//! name     := stem "." ext                      (no "_C" anywhere)
//!          -> channel = SINGLECHANNEL, base = stem
//! ```
//!
//! Parsing is total: every name yields a channel id.

use std::path::Path;

use crate::consts::{CHANNEL_MARKER, SINGLE_CHANNEL_ID};

/// One physical per-channel input file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChannelFile {
    pub file_name: String,
    pub base_name: String,
    pub channel_id: String,
}

impl ChannelFile {
    pub fn is_single_channel(&self) -> bool {
        self.channel_id == SINGLE_CHANNEL_ID
    }
}

/// True for `.tif` / `.tiff` names, any case.
pub fn is_tiff_name(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    lower.ends_with(".tif") || lower.ends_with(".tiff")
}

/// Split a file name into its group key and channel id.
pub fn parse_channel_file(file_name: &str) -> ChannelFile {
    let (base_name, channel_id) = match file_name.rfind(CHANNEL_MARKER) {
        Some(pos) => {
            let rest = &file_name[pos + CHANNEL_MARKER.len()..];
            let token_end = rest
                .find(|c: char| c == '.' || c == '_')
                .unwrap_or(rest.len());
            let channel_id = format!("C{}", &rest[..token_end]).to_uppercase();
            (file_name[..pos].to_string(), channel_id)
        }
        None => (strip_extension(file_name), SINGLE_CHANNEL_ID.to_string()),
    };

    ChannelFile {
        file_name: file_name.to_string(),
        base_name,
        channel_id,
    }
}

/// Output image name for a channel: `{base}_{channel}_normalized.tiff`.
pub fn normalized_file_name(base_name: &str, channel_id: &str) -> String {
    format!(
        "{base_name}_{channel_id}_{}.{}",
        crate::consts::NORMALIZED_SUFFIX,
        crate::consts::OUTPUT_EXTENSION
    )
}

/// Metadata artifact name for a group: `{base}_metadata.json`.
pub fn metadata_file_name(base_name: &str) -> String {
    format!("{base_name}_metadata.{}", crate::consts::METADATA_EXTENSION)
}

fn strip_extension(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}
