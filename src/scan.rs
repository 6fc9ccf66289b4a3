use std::path::{Path, PathBuf};

use tracing::warn;

static IMAGE_EXTS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tiff", "webp"];

fn is_image(path: &Path) -> bool {
    let Some(ext) = path.extension().map(|e| e.to_string_lossy()) else {
        return false;
    };
    IMAGE_EXTS.iter().any(|known| ext.eq_ignore_ascii_case(known))
}

/// Lists the image files directly inside `dir`, sorted by path.
///
/// An unreadable directory yields an empty list.
pub fn list_images(dir: &Path) -> Vec<PathBuf> {
    let rd = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "cannot list directory");
            return Vec::new();
        }
    };

    let mut images: Vec<PathBuf> = rd
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    images.sort();
    images
}
