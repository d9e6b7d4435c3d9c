//! One-way handoff of a finished group to a preview collaborator.
//!
//! The orchestrator calls [`PreviewSink::render`] once per group and blocks
//! until it returns. Collaborators never feed anything back.

use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage};
use ndarray::Array2;
use tracing::{info, warn};

use crate::error::{Result, StackNormError};
use crate::policy::display_rgba;
use crate::stack::QuantizedStack;

/// One channel layer, additively blended with its siblings.
#[derive(Clone, Debug)]
pub struct PreviewLayer<'a> {
    pub pixels: &'a QuantizedStack,
    pub label: String,
    pub color: String,
    pub contrast_limits: (u32, u32),
}

/// Everything a collaborator gets for one group.
#[derive(Clone, Debug)]
pub struct PreviewGroup<'a> {
    pub base_name: &'a str,
    pub title: String,
    pub layers: Vec<PreviewLayer<'a>>,
}

pub trait PreviewSink {
    fn render(&mut self, group: &PreviewGroup<'_>) -> Result<()>;
}

/// `[min, max]` of the stack, or `[0, output_max]` when it is flat.
pub fn contrast_limits(stack: &QuantizedStack, output_max: u32) -> (u32, u32) {
    match stack.min_max() {
        Some((lo, hi)) if lo != hi => (lo, hi),
        _ => (0, output_max),
    }
}

/// Collaborator that discards every group.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPreview;

impl PreviewSink for NoPreview {
    fn render(&mut self, _group: &PreviewGroup<'_>) -> Result<()> {
        Ok(())
    }
}

/// Writes `{base}_preview.png`: per layer a max-intensity projection, windowed
/// by its contrast limits, tinted by its colour, all layers summed.
#[derive(Clone, Debug)]
pub struct CompositePngPreview {
    output_dir: PathBuf,
    written: Vec<PathBuf>,
}

impl CompositePngPreview {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            written: Vec::new(),
        }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl PreviewSink for CompositePngPreview {
    fn render(&mut self, group: &PreviewGroup<'_>) -> Result<()> {
        let Some(first) = group.layers.first() else {
            return Ok(());
        };
        let (_, h, w) = first.pixels.dim();
        let mut rgb = Array2::<[f32; 3]>::from_elem((h, w), [0.0; 3]);

        for layer in &group.layers {
            let (_, lh, lw) = layer.pixels.dim();
            if (lh, lw) != (h, w) {
                warn!(
                    group = group.base_name,
                    layer = %layer.label,
                    "Layer size differs from the first layer; left out of composite"
                );
                continue;
            }
            blend_layer(&mut rgb, layer);
        }

        let path = self
            .output_dir
            .join(format!("{}_preview.png", group.base_name));
        save_composite(&rgb, &path)?;
        info!(title = %group.title, path = %path.display(), "Preview composite written");
        self.written.push(path);
        Ok(())
    }
}

fn blend_layer(rgb: &mut Array2<[f32; 3]>, layer: &PreviewLayer<'_>) {
    let [r, g, b, a] = display_rgba(&layer.color);
    let (lo, hi) = layer.contrast_limits;
    let span = (hi.saturating_sub(lo)).max(1) as f32;
    let projection = layer.pixels.max_projection();

    rgb.zip_mut_with(&projection, |px, &v| {
        let t = ((v.saturating_sub(lo)) as f32 / span).clamp(0.0, 1.0) * a;
        px[0] += t * r;
        px[1] += t * g;
        px[2] += t * b;
    });
}

fn save_composite(rgb: &Array2<[f32; 3]>, path: &Path) -> Result<()> {
    let (h, w) = rgb.dim();
    let mut img = RgbImage::new(w as u32, h as u32);
    for ((row, col), px) in rgb.indexed_iter() {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        img.put_pixel(col as u32, row as u32, Rgb([to_u8(px[0]), to_u8(px[1]), to_u8(px[2])]));
    }
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|e| StackNormError::write(path, e))
}
