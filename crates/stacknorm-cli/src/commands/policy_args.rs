use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use stacknorm_core::pipeline::config::RunConfig;
use stacknorm_core::policy::{OutputBitDepth, ProcessingPolicy};

/// Config file and policy overrides shared by `run` and `groups`.
#[derive(Args, Default)]
pub struct PolicyArgs {
    /// Run config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Skip min-max normalization
    #[arg(long)]
    pub no_normalize: bool,

    /// Skip adaptive histogram equalization on every channel
    #[arg(long)]
    pub no_enhance: bool,

    /// Output bit depth (8 or 16)
    #[arg(long)]
    pub bit_depth: Option<u8>,

    /// Channel never equalized
    #[arg(long)]
    pub saturated: Option<String>,

    /// Display colour override, as CHANNEL=COLOR (repeatable)
    #[arg(long = "color", value_parser = parse_color_override)]
    pub colors: Vec<(String, String)>,
}

impl PolicyArgs {
    pub fn load_config(&self) -> Result<Option<RunConfig>> {
        let Some(ref config_path) = self.config else {
            return Ok(None);
        };
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        let config = toml::from_str::<RunConfig>(&contents).context("Invalid run config")?;
        Ok(Some(config))
    }

    /// Apply the command-line overrides on top of `policy`.
    pub fn apply(&self, policy: &mut ProcessingPolicy) -> Result<()> {
        if self.no_normalize {
            policy.normalize_enabled = false;
        }
        if self.no_enhance {
            policy.enhance_enabled = false;
        }
        if let Some(bits) = self.bit_depth {
            policy.output_bit_depth = OutputBitDepth::try_from(bits)?;
        }
        if let Some(ref channel) = self.saturated {
            policy.saturated_channel_id = channel.to_uppercase();
        }
        for (channel, color) in &self.colors {
            policy
                .channel_color_map
                .insert(channel.clone(), color.clone());
        }
        Ok(())
    }
}

fn parse_color_override(s: &str) -> std::result::Result<(String, String), String> {
    let (channel, color) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CHANNEL=COLOR, got '{s}'"))?;
    let (channel, color) = (channel.trim(), color.trim());
    if channel.is_empty() || color.is_empty() {
        return Err(format!("expected CHANNEL=COLOR, got '{s}'"));
    }
    Ok((channel.to_uppercase(), color.to_lowercase()))
}
