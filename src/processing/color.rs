use image::RgbImage;
use rayon::prelude::*;

use crate::state::EffectParams;

/// Hue, saturation and value planes, one byte per pixel each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HsvPlanes {
    pub width: u32,
    pub height: u32,
    pub hue: Vec<u8>,
    pub sat: Vec<u8>,
    pub val: Vec<u8>,
}

/// Converts a hue rotation in degrees into a shift on the 8-bit hue circle,
/// where a full turn spans 255 steps.
pub fn hue_shift(hue_deg: f32) -> u8 {
    let deg = hue_deg.rem_euclid(360.0);
    ((deg * 255.0 / 360.0).round() as u32 % 255) as u8
}

/// Hue is cyclic, so the shift wraps instead of clamping.
pub fn shift_hue(sample: u8, shift: u8) -> u8 {
    sample.wrapping_add(shift)
}

/// Saturation and value are linear, so the scaled sample clamps.
pub fn scale_sample(sample: u8, multiplier: f32) -> u8 {
    (sample as f32 * multiplier).round().clamp(0.0, 255.0) as u8
}

/// Applies hue rotation and the saturation/value multipliers.
pub fn apply(img: RgbImage, params: &EffectParams) -> RgbImage {
    let shift = hue_shift(params.hue);
    if shift == 0 && params.sat == 1.0 && params.val == 1.0 {
        return img;
    }

    let mut planes = to_hsv(&img);
    planes.hue.par_iter_mut().for_each(|h| *h = shift_hue(*h, shift));
    planes
        .sat
        .par_iter_mut()
        .for_each(|s| *s = scale_sample(*s, params.sat));
    planes
        .val
        .par_iter_mut()
        .for_each(|v| *v = scale_sample(*v, params.val));
    to_rgb(&planes)
}

pub fn to_hsv(img: &RgbImage) -> HsvPlanes {
    let pixels: Vec<[u8; 3]> = img
        .as_raw()
        .par_chunks_exact(3)
        .map(|p| rgb_to_hsv(p[0], p[1], p[2]))
        .collect();

    let mut planes = HsvPlanes {
        width: img.width(),
        height: img.height(),
        hue: Vec::with_capacity(pixels.len()),
        sat: Vec::with_capacity(pixels.len()),
        val: Vec::with_capacity(pixels.len()),
    };
    for [h, s, v] in pixels {
        planes.hue.push(h);
        planes.sat.push(s);
        planes.val.push(v);
    }
    planes
}

pub fn to_rgb(planes: &HsvPlanes) -> RgbImage {
    let raw: Vec<u8> = planes
        .hue
        .par_iter()
        .zip(planes.sat.par_iter())
        .zip(planes.val.par_iter())
        .flat_map_iter(|((&h, &s), &v)| hsv_to_rgb(h, s, v))
        .collect();
    RgbImage::from_raw(planes.width, planes.height, raw)
        .unwrap_or_else(|| RgbImage::new(planes.width, planes.height))
}

fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max == min {
        return [0, 0, max];
    }

    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let maxf = max as f32;
    let delta = maxf - min as f32;
    let s = delta / maxf;
    let rc = (maxf - rf) / delta;
    let gc = (maxf - gf) / delta;
    let bc = (maxf - bf) / delta;
    let h = if r == max {
        bc - gc
    } else if g == max {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };
    let h = (h / 6.0).rem_euclid(1.0);

    [
        (h * 255.0).round() as u8,
        (s * 255.0).round() as u8,
        max,
    ]
}

fn hsv_to_rgb(h: u8, s: u8, v: u8) -> [u8; 3] {
    if s == 0 {
        return [v, v, v];
    }

    let vf = v as f32 / 255.0;
    let sf = s as f32 / 255.0;
    let hf = h as f32 / 255.0 * 6.0;
    let sector = hf.floor();
    let f = hf - sector;
    let p = vf * (1.0 - sf);
    let q = vf * (1.0 - sf * f);
    let t = vf * (1.0 - sf * (1.0 - f));

    let (r, g, b) = match sector as u32 % 6 {
        0 => (vf, t, p),
        1 => (q, vf, p),
        2 => (p, vf, t),
        3 => (p, q, vf),
        4 => (t, p, vf),
        _ => (vf, p, q),
    };
    [to_u8(r), to_u8(g), to_u8(b)]
}

fn to_u8(unit: f32) -> u8 {
    (unit * 255.0).round().clamp(0.0, 255.0) as u8
}
