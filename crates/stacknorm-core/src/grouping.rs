use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::Result;
use crate::naming::{is_tiff_name, parse_channel_file, ChannelFile};

/// Per-channel files sharing one acquisition base name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelGroup {
    pub base_name: String,
    /// Sorted by channel id, then file name.
    pub members: Vec<ChannelFile>,
}

impl ChannelGroup {
    fn new(base_name: String) -> Self {
        Self {
            base_name,
            members: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Two distinct files in one group that derive the same channel id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupingAmbiguity {
    pub base_name: String,
    pub channel_id: String,
    pub file_names: Vec<String>,
}

impl std::fmt::Display for GroupingAmbiguity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "group '{}' channel '{}' is claimed by {}",
            self.base_name,
            self.channel_id,
            self.file_names.join(", ")
        )
    }
}

/// All groups of a run, keyed and iterated by base name.
#[derive(Clone, Debug, Default)]
pub struct ChannelGroups {
    pub groups: BTreeMap<String, ChannelGroup>,
    pub ambiguities: Vec<GroupingAmbiguity>,
}

impl ChannelGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.groups.values().map(ChannelGroup::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelGroup> {
        self.groups.values()
    }

    pub fn get(&self, base_name: &str) -> Option<&ChannelGroup> {
        self.groups.get(base_name)
    }
}

/// List regular files in `dir` (symlinks followed), sorted by name.
pub fn scan_input_dir(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        } else {
            warn!(path = %entry.path().display(), "Skipping non UTF-8 file name");
        }
    }
    names.sort();
    Ok(names)
}

/// Build channel groups from a directory listing.
///
/// Non-TIFF names are ignored; every TIFF name lands in exactly one group.
pub fn group_channel_files<I, S>(file_names: I) -> ChannelGroups
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups: BTreeMap<String, ChannelGroup> = BTreeMap::new();

    for name in file_names {
        let name = name.as_ref();
        if !is_tiff_name(name) {
            debug!(file = name, "Ignoring non-TIFF file");
            continue;
        }
        let file = parse_channel_file(name);
        groups
            .entry(file.base_name.clone())
            .or_insert_with_key(|key| ChannelGroup::new(key.clone()))
            .members
            .push(file);
    }

    let mut ambiguities = Vec::new();
    for group in groups.values_mut() {
        group.members.sort_by(|a, b| {
            a.channel_id
                .cmp(&b.channel_id)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        ambiguities.extend(find_ambiguities(group));
    }

    for ambiguity in &ambiguities {
        warn!(%ambiguity, "Ambiguous channel naming; only the first file is processed");
    }

    ChannelGroups {
        groups,
        ambiguities,
    }
}

fn find_ambiguities(group: &ChannelGroup) -> Vec<GroupingAmbiguity> {
    let mut found = Vec::new();
    for run in group
        .members
        .chunk_by(|a, b| a.channel_id == b.channel_id)
        .filter(|run| run.len() > 1)
    {
        found.push(GroupingAmbiguity {
            base_name: group.base_name.clone(),
            channel_id: run[0].channel_id.clone(),
            file_names: run.iter().map(|m| m.file_name.clone()).collect(),
        });
    }
    found
}
