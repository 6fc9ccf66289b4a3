use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::debounce::DEFAULT_WINDOW;

/// Startup settings for the preview engine.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    pub browse_path: Option<PathBuf>,
    pub preview_quality: Option<String>,
    pub debounce_ms: Option<u64>,
}

impl AppConfig {
    /// Returns the user config file path, if a config directory is available.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("desi").join("config.toml"))
    }

    /// Loads config from disk, falling back to defaults on any error.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Self {
        toml::from_str(contents).unwrap_or_default()
    }

    pub fn debounce_window(&self) -> Duration {
        self.debounce_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_WINDOW)
    }
}
