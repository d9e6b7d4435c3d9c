use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::clahe::ClaheParams;
use crate::consts::{DEFAULT_DISPLAY_COLOR, DEFAULT_SATURATED_CHANNEL, SINGLE_CHANNEL_ID};
use crate::error::StackNormError;

/// Unsigned integer width of written images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OutputBitDepth {
    Eight,
    #[default]
    Sixteen,
}

impl OutputBitDepth {
    pub fn bits(self) -> u8 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
        }
    }

    pub fn max_value(self) -> u32 {
        match self {
            Self::Eight => u8::MAX as u32,
            Self::Sixteen => u16::MAX as u32,
        }
    }
}

impl TryFrom<u8> for OutputBitDepth {
    type Error = StackNormError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(Self::Eight),
            16 => Ok(Self::Sixteen),
            other => Err(StackNormError::InvalidConfig(format!(
                "output bit depth must be 8 or 16, got {other}"
            ))),
        }
    }
}

impl From<OutputBitDepth> for u8 {
    fn from(depth: OutputBitDepth) -> Self {
        depth.bits()
    }
}

impl std::fmt::Display for OutputBitDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Run-level processing policy. Built once, then only read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingPolicy {
    #[serde(rename = "normalize")]
    pub normalize_enabled: bool,
    /// Global default for adaptive histogram equalization.
    #[serde(rename = "enhance_contrast")]
    pub enhance_enabled: bool,
    /// Channel never enhanced, whatever the global default says.
    pub saturated_channel_id: String,
    pub output_bit_depth: OutputBitDepth,
    pub channel_color_map: BTreeMap<String, String>,
    pub clahe: ClaheParams,
}

impl Default for ProcessingPolicy {
    fn default() -> Self {
        let channel_color_map = [
            ("C00", "blue"),
            ("C01", "green"),
            ("C02", "red"),
            (SINGLE_CHANNEL_ID, DEFAULT_DISPLAY_COLOR),
        ]
        .into_iter()
        .map(|(id, color)| (id.to_string(), color.to_string()))
        .collect();

        Self {
            normalize_enabled: true,
            enhance_enabled: true,
            saturated_channel_id: DEFAULT_SATURATED_CHANNEL.to_string(),
            output_bit_depth: OutputBitDepth::default(),
            channel_color_map,
            clahe: ClaheParams::default(),
        }
    }
}

/// What the policy says about one particular channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelPolicy {
    pub display_color: String,
    pub enhance: bool,
}

impl ProcessingPolicy {
    pub fn display_color(&self, channel_id: &str) -> &str {
        self.channel_color_map
            .get(channel_id)
            .map(String::as_str)
            .unwrap_or(DEFAULT_DISPLAY_COLOR)
    }

    pub fn should_enhance(&self, channel_id: &str) -> bool {
        self.enhance_enabled && channel_id != self.saturated_channel_id
    }

    pub fn resolve(&self, channel_id: &str) -> ChannelPolicy {
        ChannelPolicy {
            display_color: self.display_color(channel_id).to_string(),
            enhance: self.should_enhance(channel_id),
        }
    }

    pub fn output_max(&self) -> u32 {
        self.output_bit_depth.max_value()
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        self.clahe.validate()
    }
}

/// RGBA tint for a display colour name. Unknown names render gray.
pub fn display_rgba(color: &str) -> [f32; 4] {
    match color.to_ascii_lowercase().as_str() {
        "blue" => [0.0, 0.0, 1.0, 1.0],
        "green" => [0.0, 1.0, 0.0, 1.0],
        "red" => [1.0, 0.0, 0.0, 1.0],
        "yellow" => [1.0, 1.0, 0.0, 1.0],
        "magenta" => [1.0, 0.0, 1.0, 1.0],
        "cyan" => [0.0, 1.0, 1.0, 1.0],
        _ => [1.0, 1.0, 1.0, 1.0],
    }
}
