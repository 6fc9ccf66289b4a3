use std::path::PathBuf;

use thiserror::Error;

pub const LOAD_FAILED: &str = "Failed to load Image";
pub const EFFECT_FAILED: &str = "Failed to apply effects (preview)";
pub const LOAD_LOST: &str = "Unknown: failed to load the image";
pub const EFFECT_LOST: &str = "Unknown: failed to apply effects";

/// Errors produced by the preview pipeline workers.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The source file could not be opened or read.
    #[error("cannot read {}: {source}", .path.display())]
    PathUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source file was read but is not a decodable image.
    #[error("cannot decode {}: {source}", .path.display())]
    DecodeFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Downscaling or applying effects to the working copy failed.
    #[error("preview transform failed: {0}")]
    TransformFailed(#[source] image::ImageError),

    /// The operation was superseded; its result must not be applied.
    #[error("operation superseded")]
    Cancelled,

    /// The worker panicked or was torn down before reporting.
    #[error("worker lost: {0}")]
    WorkerLost(String),
}

/// Which asynchronous flow an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Load,
    Effect,
}

impl EngineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled)
    }

    /// Placeholder text shown in place of the image, or `None` when the
    /// error must stay invisible.
    pub fn user_message(&self, flow: Flow) -> Option<&'static str> {
        match (self, flow) {
            (EngineError::Cancelled, _) => None,
            (EngineError::PathUnreadable { .. } | EngineError::DecodeFailed { .. }, _) => {
                Some(LOAD_FAILED)
            }
            (EngineError::TransformFailed(_), _) => Some(EFFECT_FAILED),
            (EngineError::WorkerLost(_), Flow::Load) => Some(LOAD_LOST),
            (EngineError::WorkerLost(_), Flow::Effect) => Some(EFFECT_LOST),
        }
    }
}
