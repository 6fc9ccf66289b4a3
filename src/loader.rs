use std::path::Path;

use crate::codec;
use crate::error::EngineError;

/// First progress message of a load, sent before decoding starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadStarted {
    pub name: String,
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

/// Reads `path`, decodes it as RGB and re-encodes it into the transport
/// format. `on_start` receives the display name before the decode begins.
pub fn load(path: &Path, on_start: impl FnOnce(LoadStarted)) -> Result<Vec<u8>, EngineError> {
    on_start(LoadStarted {
        name: display_name(path),
    });

    let unreadable = |source| EngineError::PathUnreadable {
        path: path.to_path_buf(),
        source,
    };
    let decode_failed = |source| EngineError::DecodeFailed {
        path: path.to_path_buf(),
        source,
    };

    let img = image::ImageReader::open(path)
        .map_err(unreadable)?
        .with_guessed_format()
        .map_err(unreadable)?
        .decode()
        .map_err(decode_failed)?
        .into_rgb8();

    codec::encode(&img).map_err(decode_failed)
}
