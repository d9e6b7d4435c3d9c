use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::error::{Result, StackNormError};
use crate::grouping::{group_channel_files, scan_input_dir, ChannelGroup, ChannelGroups};
use crate::io::tiff_io::{read_stack, write_stack};
use crate::metadata::{write_group_metadata, GroupMetadataRecord};
use crate::naming::{normalized_file_name, ChannelFile};
use crate::preview::{contrast_limits, PreviewGroup, PreviewLayer, PreviewSink};
use crate::transform::transform_channel;

use super::config::RunConfig;
use super::types::{ChannelFailure, ChannelResult, ProgressReporter, RunSummary};

/// Scan `config.input_dir`, group its channel files and process every group.
///
/// Channel-level failures are recorded in the summary; only configuration,
/// input-directory and output-write failures abort the run.
pub fn run_batch(
    config: &RunConfig,
    preview: &mut dyn PreviewSink,
    reporter: &dyn ProgressReporter,
) -> Result<RunSummary> {
    config.validate()?;

    let names = scan_input_dir(&config.input_dir).map_err(|e| StackNormError::InputDirectory {
        path: config.input_dir.clone(),
        reason: e.to_string(),
    })?;
    let groups = group_channel_files(&names);
    info!(
        groups = groups.len(),
        files = groups.file_count(),
        input = %config.input_dir.display(),
        "Detected channel groups"
    );

    run_groups(&groups, config, preview, reporter)
}

/// Process already-built groups in base-name order.
pub fn run_groups(
    groups: &ChannelGroups,
    config: &RunConfig,
    preview: &mut dyn PreviewSink,
    reporter: &dyn ProgressReporter,
) -> Result<RunSummary> {
    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| StackNormError::write(&config.output_dir, e))?;

    let mut summary = RunSummary {
        groups_total: groups.len(),
        ambiguities: groups.ambiguities.clone(),
        ..Default::default()
    };

    reporter.begin_run(groups.len());
    for (i, group) in groups.iter().enumerate() {
        process_group(group, config, preview, reporter, &mut summary)?;
        reporter.finish_group(i + 1);
    }
    reporter.finish_run();

    info!(
        channels_ok = summary.channels_succeeded,
        channels_failed = summary.channels_failed,
        groups_ok = summary.groups_succeeded,
        groups_failed = summary.groups_failed,
        "Batch complete"
    );
    Ok(summary)
}

fn process_group(
    group: &ChannelGroup,
    config: &RunConfig,
    preview: &mut dyn PreviewSink,
    reporter: &dyn ProgressReporter,
    summary: &mut RunSummary,
) -> Result<()> {
    info!(group = %group.base_name, channels = group.len(), "Processing group");
    reporter.begin_group(&group.base_name, group.len());

    let mut records = Vec::with_capacity(group.len());
    // Held only when a preview will consume them; otherwise each channel is
    // dropped right after its write.
    let mut results = Vec::new();
    let mut failed = 0;
    // Channel id -> first file claiming it; later claimants would overwrite
    // the same output.
    let mut claimed: BTreeMap<&str, &str> = BTreeMap::new();

    for member in &group.members {
        let outcome = match claimed.get(member.channel_id.as_str()) {
            Some(kept) => Err(StackNormError::AmbiguousChannel {
                base_name: member.base_name.clone(),
                channel_id: member.channel_id.clone(),
                kept: (*kept).to_string(),
            }),
            None => {
                claimed.insert(&member.channel_id, &member.file_name);
                process_channel(member, config)
            }
        };
        match outcome {
            Ok(result) => {
                records.push(GroupMetadataRecord {
                    file_name: result.output_file_name.clone(),
                    original_channel_id: result.channel_id.clone(),
                    colormap: result.display_color.clone(),
                });
                if config.show_preview {
                    results.push(result);
                }
                summary.channels_succeeded += 1;
                reporter.channel_done(&member.channel_id, true);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(
                    group = %member.base_name,
                    channel = %member.channel_id,
                    file = %member.file_name,
                    error = %e,
                    "Skipping channel"
                );
                summary.failures.push(ChannelFailure::new(member, &e));
                failed += 1;
                reporter.channel_done(&member.channel_id, false);
            }
        }
    }

    let metadata_path = write_group_metadata(&config.output_dir, &group.base_name, &records)?;
    debug!(path = %metadata_path.display(), records = records.len(), "Metadata written");
    summary.metadata_files.push(metadata_path);

    summary.channels_failed += failed;
    if failed == 0 {
        summary.groups_succeeded += 1;
    } else {
        summary.groups_failed += 1;
    }

    if config.show_preview && !results.is_empty() {
        let output_max = config.policy.output_max();
        let request = PreviewGroup {
            base_name: &group.base_name,
            title: format!("QC: {}", group.base_name),
            layers: results
                .iter()
                .map(|r| PreviewLayer {
                    pixels: &r.pixels,
                    label: format!("{} (Norm)", r.channel_id),
                    color: r.display_color.clone(),
                    contrast_limits: contrast_limits(&r.pixels, output_max),
                })
                .collect(),
        };
        if let Err(e) = preview.render(&request) {
            warn!(group = %group.base_name, error = %e, "Preview failed");
            summary.preview_failures += 1;
        }
    }

    Ok(())
}

fn process_channel(member: &ChannelFile, config: &RunConfig) -> Result<ChannelResult> {
    let policy = &config.policy;
    let resolved = policy.resolve(&member.channel_id);

    let raw = read_stack(&config.input_dir.join(&member.file_name))?;
    debug!(
        file = %member.file_name,
        shape = ?raw.dim(),
        format = %raw.sample_format(),
        "Decoded channel"
    );

    if policy.enhance_enabled && !resolved.enhance {
        info!(
            channel = %member.channel_id,
            "Saturated channel; skipping adaptive equalization"
        );
    }

    let pixels = transform_channel(&raw, policy, resolved.enhance)?;
    drop(raw);

    let output_file_name = normalized_file_name(&member.base_name, &member.channel_id);
    write_stack(&config.output_dir.join(&output_file_name), &pixels)?;
    debug!(output = %output_file_name, "Channel written");

    Ok(ChannelResult {
        pixels,
        output_file_name,
        display_color: resolved.display_color,
        channel_id: member.channel_id.clone(),
    })
}
