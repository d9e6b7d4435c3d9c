use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::error::{Result, StackNormError};
use crate::naming::metadata_file_name;

/// One written channel of a group, as listed in `{base}_metadata.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMetadataRecord {
    /// Name of the normalized output image.
    pub file_name: String,
    pub original_channel_id: String,
    pub colormap: String,
}

/// Write a group's records, in member order, as an indented JSON array.
pub fn write_group_metadata(
    output_dir: &Path,
    base_name: &str,
    records: &[GroupMetadataRecord],
) -> Result<PathBuf> {
    let path = output_dir.join(metadata_file_name(base_name));
    let file = File::create(&path).map_err(|e| StackNormError::write(&path, e))?;
    let mut writer = BufWriter::new(file);

    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
    records
        .serialize(&mut ser)
        .map_err(|e| StackNormError::write(&path, e))?;
    writer
        .flush()
        .map_err(|e| StackNormError::write(&path, e))?;

    Ok(path)
}

pub fn read_group_metadata(path: &Path) -> Result<Vec<GroupMetadataRecord>> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
