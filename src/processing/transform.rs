use image::{DynamicImage, RgbImage};

use crate::codec;
use crate::error::EngineError;
use crate::state::EffectParams;

use super::downscale::{self, PreviewQuality};
use super::{color, sharpness};

/// Apply the colour and sharpness effects from `params` to `img`.
/// Order: hue/saturation/value → sharpness. Output has the input's size.
pub fn apply(img: RgbImage, params: &EffectParams) -> RgbImage {
    let out = color::apply(img, params);
    sharpness::apply(out, params.sharp)
}

/// Preview worker: decode transport bytes, bound the working copy to the
/// quality tier, apply effects, and re-encode.
///
/// `checkpoint` runs before the effects; an error from it aborts the render.
pub fn render_preview(
    raw: &[u8],
    params: &EffectParams,
    quality: PreviewQuality,
    checkpoint: impl Fn() -> Result<(), EngineError>,
) -> Result<Vec<u8>, EngineError> {
    let img = codec::decode(raw).map_err(EngineError::TransformFailed)?;
    let working = downscale::bound(DynamicImage::ImageRgb8(img), quality).into_rgb8();
    checkpoint()?;
    let out = apply(working, params);
    codec::encode(&out).map_err(EngineError::TransformFailed)
}
