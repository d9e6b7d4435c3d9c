use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use stacknorm_core::grouping::{group_channel_files, scan_input_dir};
use stacknorm_core::naming::normalized_file_name;
use stacknorm_core::policy::ProcessingPolicy;

use super::policy_args::PolicyArgs;

#[derive(Args)]
pub struct GroupsArgs {
    /// Directory of per-channel TIFF files (defaults to the config's input_dir)
    pub input_dir: Option<PathBuf>,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

pub fn run(args: &GroupsArgs) -> Result<()> {
    let (input_dir, policy) = resolve(args)?;
    let names = scan_input_dir(&input_dir)
        .with_context(|| format!("Failed to list {}", input_dir.display()))?;
    let groups = group_channel_files(&names);

    println!(
        "{} group(s), {} file(s) in {}",
        groups.len(),
        groups.file_count(),
        input_dir.display()
    );
    for group in groups.iter() {
        println!();
        println!("  {}", group.base_name);
        for member in &group.members {
            let resolved = policy.resolve(&member.channel_id);
            println!(
                "    {:<16}{:<28}{:<8}{} -> {}",
                member.channel_id,
                member.file_name,
                resolved.display_color,
                if resolved.enhance { "clahe" } else { "linear" },
                normalized_file_name(&group.base_name, &member.channel_id)
            );
        }
    }

    if !groups.ambiguities.is_empty() {
        println!();
        println!("Ambiguous channel names (only the first file is processed):");
        for ambiguity in &groups.ambiguities {
            println!("  {ambiguity}");
        }
    }

    Ok(())
}

/// Input directory and policy as `run` would see them.
fn resolve(args: &GroupsArgs) -> Result<(PathBuf, ProcessingPolicy)> {
    let config = args.policy.load_config()?;
    let input_dir = args
        .input_dir
        .clone()
        .or_else(|| config.as_ref().map(|c| c.input_dir.clone()))
        .context("INPUT_DIR is required without --config")?;
    let mut policy = config.map(|c| c.policy).unwrap_or_default();
    args.policy.apply(&mut policy)?;
    Ok((input_dir, policy))
}
