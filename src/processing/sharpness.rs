use image::RgbImage;
use imageproc::filter::gaussian_blur_f32;

const SIGMA: f32 = 1.0;

/// Blends the image with a blurred copy of itself.
///
/// `factor` 0 gives the blurred copy, 1 the original, and anything above 1
/// pushes pixels away from their neighbourhood average.
pub fn apply(img: RgbImage, factor: f32) -> RgbImage {
    if factor == 1.0 {
        return img;
    }

    let blurred = gaussian_blur_f32(&img, SIGMA);

    let mut out = img.clone();
    for (o, (s, b)) in out.pixels_mut().zip(img.pixels().zip(blurred.pixels())) {
        for c in 0..3 {
            let sharp = b[c] as f32 + factor * (s[c] as f32 - b[c] as f32);
            o[c] = sharp.round().clamp(0.0, 255.0) as u8;
        }
    }

    out
}
