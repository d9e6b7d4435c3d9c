use ndarray::{Array2, Array3, Axis};
use num_traits::{Bounded, ToPrimitive};

/// Native sample type of a decoded channel file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleFormat {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
    F32,
    F64,
}

impl std::fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::U8 => write!(f, "8-bit unsigned"),
            Self::U16 => write!(f, "16-bit unsigned"),
            Self::U32 => write!(f, "32-bit unsigned"),
            Self::I8 => write!(f, "8-bit signed"),
            Self::I16 => write!(f, "16-bit signed"),
            Self::I32 => write!(f, "32-bit signed"),
            Self::F32 => write!(f, "32-bit float"),
            Self::F64 => write!(f, "64-bit float"),
        }
    }
}

/// Decoded samples of one channel file.
///
/// Shape is `(depth, height, width)`; a planar image has depth 1.
#[derive(Clone, Debug, PartialEq)]
pub enum RawStack {
    U8(Array3<u8>),
    U16(Array3<u16>),
    U32(Array3<u32>),
    I8(Array3<i8>),
    I16(Array3<i16>),
    I32(Array3<i32>),
    F32(Array3<f32>),
    F64(Array3<f64>),
}

impl RawStack {
    pub fn dim(&self) -> (usize, usize, usize) {
        match self {
            Self::U8(a) => a.dim(),
            Self::U16(a) => a.dim(),
            Self::U32(a) => a.dim(),
            Self::I8(a) => a.dim(),
            Self::I16(a) => a.dim(),
            Self::I32(a) => a.dim(),
            Self::F32(a) => a.dim(),
            Self::F64(a) => a.dim(),
        }
    }

    pub fn len(&self) -> usize {
        let (d, h, w) = self.dim();
        d * h * w
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn depth(&self) -> usize {
        self.dim().0
    }

    pub fn sample_format(&self) -> SampleFormat {
        match self {
            Self::U8(_) => SampleFormat::U8,
            Self::U16(_) => SampleFormat::U16,
            Self::U32(_) => SampleFormat::U32,
            Self::I8(_) => SampleFormat::I8,
            Self::I16(_) => SampleFormat::I16,
            Self::I32(_) => SampleFormat::I32,
            Self::F32(_) => SampleFormat::F32,
            Self::F64(_) => SampleFormat::F64,
        }
    }

    /// Map samples onto [0, 1] using the native type's full scale.
    ///
    /// Integer samples are divided by the type maximum, so signed samples
    /// land in [-1, 1]; float samples are taken as already scaled and pass
    /// through.
    pub fn to_unit_float(&self) -> Array3<f64> {
        match self {
            Self::U8(a) => integer_to_unit(a),
            Self::U16(a) => integer_to_unit(a),
            Self::U32(a) => integer_to_unit(a),
            Self::I8(a) => integer_to_unit(a),
            Self::I16(a) => integer_to_unit(a),
            Self::I32(a) => integer_to_unit(a),
            Self::F32(a) => a.mapv(f64::from),
            Self::F64(a) => a.clone(),
        }
    }
}

fn integer_to_unit<T>(data: &Array3<T>) -> Array3<f64>
where
    T: Copy + Bounded + ToPrimitive,
{
    let scale = T::max_value().to_f64().unwrap_or(1.0);
    // The signed minimum sits one step below -max.
    data.mapv(|v| (v.to_f64().unwrap_or(0.0) / scale).max(-1.0))
}

/// Output samples of a transformed channel, in the configured output depth.
#[derive(Clone, Debug, PartialEq)]
pub enum QuantizedStack {
    U8(Array3<u8>),
    U16(Array3<u16>),
}

impl QuantizedStack {
    pub fn dim(&self) -> (usize, usize, usize) {
        match self {
            Self::U8(a) => a.dim(),
            Self::U16(a) => a.dim(),
        }
    }

    pub fn len(&self) -> usize {
        let (d, h, w) = self.dim();
        d * h * w
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn output_max(&self) -> u32 {
        match self {
            Self::U8(_) => u8::MAX as u32,
            Self::U16(_) => u16::MAX as u32,
        }
    }

    /// Smallest and largest sample, or `None` for an empty stack.
    pub fn min_max(&self) -> Option<(u32, u32)> {
        match self {
            Self::U8(a) => fold_min_max(a.iter().map(|&v| v as u32)),
            Self::U16(a) => fold_min_max(a.iter().map(|&v| v as u32)),
        }
    }

    /// Maximum intensity projection along the depth axis.
    pub fn max_projection(&self) -> Array2<u32> {
        match self {
            Self::U8(a) => project_max(a),
            Self::U16(a) => project_max(a),
        }
    }
}

fn fold_min_max(values: impl Iterator<Item = u32>) -> Option<(u32, u32)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn project_max<T>(data: &Array3<T>) -> Array2<u32>
where
    T: Copy + Into<u32>,
{
    let (_, h, w) = data.dim();
    let mut out = Array2::<u32>::zeros((h, w));
    for plane in data.axis_iter(Axis(0)) {
        out.zip_mut_with(&plane, |acc, &v| *acc = (*acc).max(v.into()));
    }
    out
}
