use ndarray::Array3;
use tracing::debug;

use crate::clahe::equalize_stack;
use crate::consts::NORMALIZE_EPSILON;
use crate::error::{Result, StackNormError};
use crate::policy::{OutputBitDepth, ProcessingPolicy};
use crate::stack::{QuantizedStack, RawStack};

/// Normalize, sanitize, optionally equalize and quantize one channel.
///
/// `enhance` is the per-channel decision from [`ProcessingPolicy::resolve`].
pub fn transform_channel(
    raw: &RawStack,
    policy: &ProcessingPolicy,
    enhance: bool,
) -> Result<QuantizedStack> {
    if raw.is_empty() {
        return Err(StackNormError::InputShape(format!(
            "channel has no samples (shape {:?})",
            raw.dim()
        )));
    }

    let mut data = raw.to_unit_float();

    if policy.normalize_enabled {
        min_max_normalize(&mut data);
    }

    let replaced = sanitize_non_finite(&mut data);
    if replaced > 0 {
        debug!(replaced, "Replaced non-finite samples with zero");
    }

    if enhance {
        debug!(planes = data.len_of(ndarray::Axis(0)), "Equalizing");
        equalize_stack(&mut data, &policy.clahe);
    }

    Ok(quantize(&data, policy.output_bit_depth))
}

/// `(x - min) / (max - min + eps)` over the whole stack.
///
/// Min and max are taken over finite samples only; a stack with no finite
/// sample is left as is for sanitization to clear.
pub fn min_max_normalize(data: &mut Array3<f64>) {
    let Some((lo, hi)) = finite_min_max(data) else {
        return;
    };
    let denom = hi - lo + NORMALIZE_EPSILON;
    data.mapv_inplace(|v| (v - lo) / denom);
}

/// Replace NaN and infinities with zero. Returns how many samples changed.
pub fn sanitize_non_finite(data: &mut Array3<f64>) -> usize {
    let mut replaced = 0;
    data.map_inplace(|v| {
        if !v.is_finite() {
            *v = 0.0;
            replaced += 1;
        }
    });
    replaced
}

/// Map [0, 1] samples to `round(x * max)` in the output integer type.
pub fn quantize(data: &Array3<f64>, depth: OutputBitDepth) -> QuantizedStack {
    let max = depth.max_value() as f64;
    let scale = |v: f64| (v.clamp(0.0, 1.0) * max).round();
    match depth {
        OutputBitDepth::Eight => QuantizedStack::U8(data.mapv(|v| scale(v) as u8)),
        OutputBitDepth::Sixteen => QuantizedStack::U16(data.mapv(|v| scale(v) as u16)),
    }
}

fn finite_min_max(data: &Array3<f64>) -> Option<(f64, f64)> {
    data.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
