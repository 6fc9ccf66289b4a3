use image::DynamicImage;
use image::imageops::FilterType;

/// Preview quality tier, trading latency for fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewQuality {
    Fast,
    #[default]
    Low,
    Hq,
}

impl PreviewQuality {
    pub fn max_dimension(self) -> u32 {
        match self {
            PreviewQuality::Fast => 768,
            PreviewQuality::Low => 1024,
            PreviewQuality::Hq => 1280,
        }
    }

    pub fn filter(self) -> FilterType {
        match self {
            PreviewQuality::Fast | PreviewQuality::Low => FilterType::Triangle,
            PreviewQuality::Hq => FilterType::Lanczos3,
        }
    }

    /// Parses a tier name, falling back to [`PreviewQuality::Low`].
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "fast" => PreviewQuality::Fast,
            "hq" | "high" => PreviewQuality::Hq,
            _ => PreviewQuality::Low,
        }
    }
}

/// Shrinks `img` so neither side exceeds the tier's bound. Smaller images are
/// returned untouched.
pub fn bound(img: DynamicImage, quality: PreviewQuality) -> DynamicImage {
    let max = quality.max_dimension();
    if img.width() <= max && img.height() <= max {
        return img;
    }
    img.resize(max, max, quality.filter())
}
