pub mod color;
pub mod downscale;
pub mod sharpness;
pub mod transform;
