use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use stacknorm_core::pipeline::config::RunConfig;
use stacknorm_core::pipeline::{run_batch, ProgressReporter};
use stacknorm_core::preview::{CompositePngPreview, NoPreview, PreviewSink};
use tracing::debug;

use super::policy_args::PolicyArgs;
use crate::summary::{print_run_settings, print_run_summary};

#[derive(Args)]
pub struct RunArgs {
    /// Directory of per-channel TIFF files
    pub input_dir: Option<PathBuf>,

    /// Directory receiving normalized stacks and metadata
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Write a composite PNG preview per group
    #[arg(long)]
    pub preview: bool,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = build_config(args)?;
    debug!(?config, "Resolved run config");
    print_run_settings(&config);

    let reporter = BarReporter::new()?;
    let mut png_preview;
    let mut no_preview = NoPreview;
    let preview: &mut dyn PreviewSink = if config.show_preview {
        png_preview = CompositePngPreview::new(&config.output_dir);
        &mut png_preview
    } else {
        &mut no_preview
    };

    let summary = run_batch(&config, preview, &reporter)?;
    print_run_summary(&summary);

    if summary.groups_total > 0 && summary.groups_succeeded == 0 {
        bail!("No group was processed cleanly");
    }
    Ok(())
}

/// Config file (if any) first, then command-line overrides on top.
fn build_config(args: &RunArgs) -> Result<RunConfig> {
    let mut config = match args.policy.load_config()? {
        Some(config) => config,
        None => match (&args.input_dir, &args.output_dir) {
            (Some(input), Some(output)) => RunConfig::new(input, output),
            _ => bail!("INPUT_DIR and OUTPUT_DIR are required without --config"),
        },
    };

    if let Some(ref input) = args.input_dir {
        config.input_dir = input.clone();
    }
    if let Some(ref output) = args.output_dir {
        config.output_dir = output.clone();
    }
    args.policy.apply(&mut config.policy)?;
    if args.preview {
        config.show_preview = true;
    }

    Ok(config)
}

/// Group-level progress bar; the message shows the group in flight.
struct BarReporter {
    pb: ProgressBar,
}

impl BarReporter {
    fn new() -> Result<Self> {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg:32} [{bar:40}] {pos}/{len}")?
                .progress_chars("=> "),
        );
        Ok(Self { pb })
    }
}

impl ProgressReporter for BarReporter {
    fn begin_run(&self, total_groups: usize) {
        self.pb.set_length(total_groups as u64);
    }

    fn begin_group(&self, base_name: &str, channels: usize) {
        self.pb.set_message(format!("{base_name} ({channels} ch)"));
    }

    fn channel_done(&self, channel_id: &str, succeeded: bool) {
        if !succeeded {
            self.pb.println(format!("  skipped {channel_id}"));
        }
    }

    fn finish_group(&self, groups_done: usize) {
        self.pb.set_position(groups_done as u64);
    }

    fn finish_run(&self) {
        self.pb.finish_with_message("Done");
    }
}
