use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ndarray::{Array3, Axis};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::ColorType;

use crate::error::{Result, StackNormError};
use crate::stack::{QuantizedStack, RawStack, SampleFormat};

/// Decoding buffer ceiling; confocal stacks routinely exceed the crate default.
const DECODE_LIMIT_BYTES: usize = 1024 * 1024 * 1024;

/// Page layout of a decoded file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackInfo {
    pub pages: usize,
    pub width: usize,
    pub height: usize,
    pub sample_format: SampleFormat,
}

impl StackInfo {
    pub fn of(stack: &RawStack) -> Self {
        let (pages, height, width) = stack.dim();
        Self {
            pages,
            width,
            height,
            sample_format: stack.sample_format(),
        }
    }
}

/// Read every page of a grayscale TIFF into a `(depth, height, width)` stack.
///
/// All pages must share dimensions and sample type.
pub fn read_stack(path: &Path) -> Result<RawStack> {
    let file = File::open(path).map_err(|e| StackNormError::decode(path, e))?;

    let mut limits = Limits::default();
    limits.decoding_buffer_size = DECODE_LIMIT_BYTES;
    limits.ifd_value_size = DECODE_LIMIT_BYTES;
    limits.intermediate_buffer_size = DECODE_LIMIT_BYTES;

    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| StackNormError::decode(path, e))?
        .with_limits(limits);

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| StackNormError::decode(path, e))?;

    let mut pages = Vec::new();
    loop {
        let page = pages.len();
        let dims = decoder
            .dimensions()
            .map_err(|e| StackNormError::decode(path, e))?;
        if dims != (width, height) {
            return Err(StackNormError::decode(
                path,
                format!(
                    "page {page} is {}x{}, expected {width}x{height}",
                    dims.0, dims.1
                ),
            ));
        }

        match decoder.colortype() {
            Ok(ColorType::Gray(_)) => {}
            Ok(other) => {
                return Err(StackNormError::decode(
                    path,
                    format!("page {page} has colour type {other:?}; expected single-channel gray"),
                ))
            }
            Err(e) => return Err(StackNormError::decode(path, e)),
        }

        pages.push(
            decoder
                .read_image()
                .map_err(|e| StackNormError::decode(path, e))?,
        );

        if !decoder.more_images() {
            break;
        }
        decoder
            .next_image()
            .map_err(|e| StackNormError::decode(path, e))?;
    }

    let shape = (pages.len(), height as usize, width as usize);
    let format = sample_format_of(&pages[0]).ok_or_else(|| {
        StackNormError::decode(path, "64-bit integer samples are not supported")
    })?;

    let stack = match format {
        SampleFormat::U8 => RawStack::U8(assemble(path, pages, shape, |p| match p {
            DecodingResult::U8(buf) => Some(buf),
            _ => None,
        })?),
        SampleFormat::U16 => RawStack::U16(assemble(path, pages, shape, |p| match p {
            DecodingResult::U16(buf) => Some(buf),
            _ => None,
        })?),
        SampleFormat::U32 => RawStack::U32(assemble(path, pages, shape, |p| match p {
            DecodingResult::U32(buf) => Some(buf),
            _ => None,
        })?),
        SampleFormat::I8 => RawStack::I8(assemble(path, pages, shape, |p| match p {
            DecodingResult::I8(buf) => Some(buf),
            _ => None,
        })?),
        SampleFormat::I16 => RawStack::I16(assemble(path, pages, shape, |p| match p {
            DecodingResult::I16(buf) => Some(buf),
            _ => None,
        })?),
        SampleFormat::I32 => RawStack::I32(assemble(path, pages, shape, |p| match p {
            DecodingResult::I32(buf) => Some(buf),
            _ => None,
        })?),
        SampleFormat::F32 => RawStack::F32(assemble(path, pages, shape, |p| match p {
            DecodingResult::F32(buf) => Some(buf),
            _ => None,
        })?),
        SampleFormat::F64 => RawStack::F64(assemble(path, pages, shape, |p| match p {
            DecodingResult::F64(buf) => Some(buf),
            _ => None,
        })?),
    };
    Ok(stack)
}

fn sample_format_of(page: &DecodingResult) -> Option<SampleFormat> {
    match page {
        DecodingResult::U8(_) => Some(SampleFormat::U8),
        DecodingResult::U16(_) => Some(SampleFormat::U16),
        DecodingResult::U32(_) => Some(SampleFormat::U32),
        DecodingResult::I8(_) => Some(SampleFormat::I8),
        DecodingResult::I16(_) => Some(SampleFormat::I16),
        DecodingResult::I32(_) => Some(SampleFormat::I32),
        DecodingResult::F32(_) => Some(SampleFormat::F32),
        DecodingResult::F64(_) => Some(SampleFormat::F64),
        _ => None,
    }
}

fn assemble<T>(
    path: &Path,
    pages: Vec<DecodingResult>,
    shape: (usize, usize, usize),
    extract: fn(DecodingResult) -> Option<Vec<T>>,
) -> Result<Array3<T>> {
    let (_, height, width) = shape;
    let page_len = height * width;
    let mut samples = Vec::with_capacity(shape.0 * page_len);

    for (page, result) in pages.into_iter().enumerate() {
        let buf = extract(result).ok_or_else(|| {
            StackNormError::decode(path, format!("page {page} has a different sample type"))
        })?;
        if buf.len() != page_len {
            return Err(StackNormError::decode(
                path,
                format!(
                    "page {page} holds {} samples, expected {page_len}",
                    buf.len()
                ),
            ));
        }
        samples.extend(buf);
    }

    Array3::from_shape_vec(shape, samples).map_err(|e| StackNormError::decode(path, e))
}

/// Write a quantized stack as a multi-page grayscale TIFF, one page per plane.
pub fn write_stack(path: &Path, stack: &QuantizedStack) -> Result<()> {
    let file = File::create(path).map_err(|e| StackNormError::write(path, e))?;
    let mut encoder =
        TiffEncoder::new(BufWriter::new(file)).map_err(|e| StackNormError::write(path, e))?;

    let (_, h, w) = stack.dim();
    let (w, h) = (w as u32, h as u32);

    match stack {
        QuantizedStack::U8(data) => {
            for plane in data.axis_iter(Axis(0)) {
                let buf: Vec<u8> = plane.iter().copied().collect();
                encoder
                    .write_image::<colortype::Gray8>(w, h, &buf)
                    .map_err(|e| StackNormError::write(path, e))?;
            }
        }
        QuantizedStack::U16(data) => {
            for plane in data.axis_iter(Axis(0)) {
                let buf: Vec<u16> = plane.iter().copied().collect();
                encoder
                    .write_image::<colortype::Gray16>(w, h, &buf)
                    .map_err(|e| StackNormError::write(path, e))?;
            }
        }
    }
    Ok(())
}
