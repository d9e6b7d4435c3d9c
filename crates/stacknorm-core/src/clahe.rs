//! Contrast-limited adaptive histogram equalization (CLAHE).
//!
//! Each plane is split into tiles, every tile gets a clipped histogram and
//! its CDF, and each pixel is mapped through a bilinear blend of the CDFs of
//! the four nearest tile centres. Input and output are in [0, 1].

use ndarray::{Array2, Array3, ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_CLAHE_BINS, DEFAULT_CLAHE_CLIP_LIMIT, DEFAULT_CLAHE_KERNEL_DIVISOR,
    PARALLEL_PLANE_THRESHOLD,
};
use crate::error::{Result, StackNormError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaheParams {
    /// Tile size `[height, width]`. Defaults to 1/8 of the plane.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel_size: Option<[usize; 2]>,
    /// Normalized clip limit: fraction of tile pixels any single bin may hold.
    pub clip_limit: f64,
    pub nbins: usize,
}

impl Default for ClaheParams {
    fn default() -> Self {
        Self {
            kernel_size: None,
            clip_limit: DEFAULT_CLAHE_CLIP_LIMIT,
            nbins: DEFAULT_CLAHE_BINS,
        }
    }
}

impl ClaheParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.clip_limit > 0.0 && self.clip_limit <= 1.0) {
            return Err(StackNormError::InvalidConfig(format!(
                "clahe clip_limit must be in (0, 1], got {}",
                self.clip_limit
            )));
        }
        if self.nbins < 2 {
            return Err(StackNormError::InvalidConfig(format!(
                "clahe nbins must be at least 2, got {}",
                self.nbins
            )));
        }
        if let Some([kh, kw]) = self.kernel_size {
            if kh == 0 || kw == 0 {
                return Err(StackNormError::InvalidConfig(
                    "clahe kernel_size entries must be positive".into(),
                ));
            }
        }
        Ok(())
    }

    fn tile_size(&self, rows: usize, cols: usize) -> (usize, usize) {
        let (kh, kw) = match self.kernel_size {
            Some([kh, kw]) => (kh, kw),
            None => (
                rows / DEFAULT_CLAHE_KERNEL_DIVISOR,
                cols / DEFAULT_CLAHE_KERNEL_DIVISOR,
            ),
        };
        (kh.clamp(1, rows), kw.clamp(1, cols))
    }
}

/// Equalize every plane of a `(depth, height, width)` stack in place.
///
/// Planes are independent, so the parallel path gives the same result as
/// the sequential one.
pub fn equalize_stack(data: &mut Array3<f64>, params: &ClaheParams) {
    let equalize_into = |mut plane: ndarray::ArrayViewMut2<f64>| {
        let equalized = equalize_plane(plane.view(), params);
        plane.assign(&equalized);
    };

    if data.len_of(Axis(0)) >= PARALLEL_PLANE_THRESHOLD {
        data.axis_iter_mut(Axis(0))
            .into_par_iter()
            .for_each(equalize_into);
    } else {
        data.axis_iter_mut(Axis(0)).for_each(equalize_into);
    }
}

/// Equalize one plane with values in [0, 1].
///
/// A plane without dynamic range has no histogram to redistribute and is
/// returned unchanged.
pub fn equalize_plane(plane: ArrayView2<f64>, params: &ClaheParams) -> Array2<f64> {
    let (rows, cols) = plane.dim();
    if rows == 0 || cols == 0 || params.nbins < 2 {
        return plane.to_owned();
    }

    let (lo, hi) = plane
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo >= hi {
        return plane.to_owned();
    }

    let nbins = params.nbins;
    let (tile_h, tile_w) = params.tile_size(rows, cols);
    let tiles_y = rows.div_ceil(tile_h);
    let tiles_x = cols.div_ceil(tile_w);
    let bin_of = |v: f64| (v.clamp(0.0, 1.0) * (nbins - 1) as f64).round() as usize;

    let mut cdfs: Vec<Vec<f64>> = Vec::with_capacity(tiles_y * tiles_x);
    for ty in 0..tiles_y {
        let r0 = ty * tile_h;
        let r1 = ((ty + 1) * tile_h).min(rows);
        for tx in 0..tiles_x {
            let c0 = tx * tile_w;
            let c1 = ((tx + 1) * tile_w).min(cols);

            let mut hist = vec![0.0f64; nbins];
            for r in r0..r1 {
                for c in c0..c1 {
                    hist[bin_of(plane[[r, c]])] += 1.0;
                }
            }

            let tile_pixels = ((r1 - r0) * (c1 - c0)) as f64;
            clip_histogram(&mut hist, (params.clip_limit * tile_pixels).max(1.0));
            cdfs.push(cumulative(&hist));
        }
    }

    // Tile-centre coordinates: fractional tile index of a pixel, clamped at the borders.
    let neighbours = |pos: usize, tile: usize, count: usize| -> (usize, usize, f64) {
        let f = (pos as f64 + 0.5) / tile as f64 - 0.5;
        let base = f.floor();
        let weight = f - base;
        let last = count as isize - 1;
        let i0 = (base as isize).clamp(0, last) as usize;
        let i1 = (base as isize + 1).clamp(0, last) as usize;
        (i0, i1, weight)
    };

    let mut out = Array2::<f64>::zeros((rows, cols));
    for r in 0..rows {
        let (ty0, ty1, dy) = neighbours(r, tile_h, tiles_y);
        for c in 0..cols {
            let (tx0, tx1, dx) = neighbours(c, tile_w, tiles_x);
            let bin = bin_of(plane[[r, c]]);

            let c00 = cdfs[ty0 * tiles_x + tx0][bin];
            let c01 = cdfs[ty0 * tiles_x + tx1][bin];
            let c10 = cdfs[ty1 * tiles_x + tx0][bin];
            let c11 = cdfs[ty1 * tiles_x + tx1][bin];

            let top = c00 * (1.0 - dx) + c01 * dx;
            let bottom = c10 * (1.0 - dx) + c11 * dx;
            out[[r, c]] = (top * (1.0 - dy) + bottom * dy).clamp(0.0, 1.0);
        }
    }
    out
}

/// Clip bins at `limit` and spread the excess uniformly over all bins.
fn clip_histogram(hist: &mut [f64], limit: f64) {
    let mut excess = 0.0;
    for h in hist.iter_mut() {
        if *h > limit {
            excess += *h - limit;
            *h = limit;
        }
    }
    let add = excess / hist.len() as f64;
    for h in hist.iter_mut() {
        *h += add;
    }
}

fn cumulative(hist: &[f64]) -> Vec<f64> {
    let total = hist.iter().sum::<f64>().max(1.0);
    let mut acc = 0.0;
    hist.iter()
        .map(|&h| {
            acc += h;
            (acc / total).clamp(0.0, 1.0)
        })
        .collect()
}
