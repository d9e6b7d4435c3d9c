#![allow(dead_code)]

use std::path::Path;

use ndarray::Array3;

use stacknorm_core::io::tiff_io::write_stack;
use stacknorm_core::stack::QuantizedStack;

/// 16-bit stack whose samples rise linearly from `lo` to `hi` in raster order.
pub fn ramp_u16(depth: usize, h: usize, w: usize, lo: u16, hi: u16) -> Array3<u16> {
    let n = (depth * h * w).max(2) - 1;
    Array3::from_shape_fn((depth, h, w), |(d, r, c)| {
        let i = (d * h + r) * w + c;
        lo + ((hi - lo) as f64 * i as f64 / n as f64).round() as u16
    })
}

/// Write a 16-bit multi-page TIFF fixture.
pub fn write_u16_tiff(path: &Path, data: Array3<u16>) {
    write_stack(path, &QuantizedStack::U16(data)).expect("write fixture");
}

/// Write an 8-bit multi-page TIFF fixture.
pub fn write_u8_tiff(path: &Path, data: Array3<u8>) {
    write_stack(path, &QuantizedStack::U8(data)).expect("write fixture");
}

/// Write a signed 16-bit multi-page TIFF fixture.
pub fn write_i16_tiff(path: &Path, data: &Array3<i16>) {
    let file = std::fs::File::create(path).expect("create fixture");
    let mut encoder = tiff::encoder::TiffEncoder::new(file).expect("tiff encoder");
    let (_, h, w) = data.dim();
    for plane in data.axis_iter(ndarray::Axis(0)) {
        let buf: Vec<i16> = plane.iter().copied().collect();
        encoder
            .write_image::<tiff::encoder::colortype::GrayI16>(w as u32, h as u32, &buf)
            .expect("write fixture page");
    }
}

/// Create a three-channel acquisition `sample_C00/C01/C02.tif` in `dir`.
pub fn write_three_channel_sample(dir: &Path) {
    for (i, channel) in ["C00", "C01", "C02"].iter().enumerate() {
        let lo = 1000 + 500 * i as u16;
        write_u16_tiff(
            &dir.join(format!("sample_{channel}.tif")),
            ramp_u16(2, 16, 16, lo, lo + 4000),
        );
    }
}

/// Channel ids of a group, in member order.
pub fn channel_ids(group: &stacknorm_core::grouping::ChannelGroup) -> Vec<&str> {
    group.members.iter().map(|m| m.channel_id.as_str()).collect()
}
