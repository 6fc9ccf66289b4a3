//! PNG transport encoding for every image buffer that crosses a worker
//! boundary.

use std::io::Cursor;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageFormat, ImageResult, RgbImage};

pub fn encode(img: &RgbImage) -> ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut buf),
        CompressionType::Fast,
        FilterType::Adaptive,
    );
    img.write_with_encoder(encoder)?;
    Ok(buf)
}

pub fn decode(bytes: &[u8]) -> ImageResult<RgbImage> {
    Ok(image::load_from_memory_with_format(bytes, ImageFormat::Png)?.into_rgb8())
}
