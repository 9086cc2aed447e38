use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = "profe-score.json";

/// Dashboard settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Table loaded at start-up when the user has not opened a file.
    pub fallback_path: PathBuf,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fallback_path: PathBuf::from("plantilla.xlsx"),
            window_width: 1280.0,
            window_height: 860.0,
        }
    }
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Settings> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing settings in {}", path.display()))
    }

    /// Settings for this run: the settings file if present (defaults on any
    /// problem), then the first command-line argument as the fallback path.
    pub fn resolve(settings_path: &Path, args: &[String]) -> Settings {
        let mut settings = if settings_path.exists() {
            match Settings::from_file(settings_path) {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("Ignoring settings file: {e:#}");
                    Settings::default()
                }
            }
        } else {
            Settings::default()
        };
        if let Some(path) = args.get(1) {
            settings.fallback_path = PathBuf::from(path);
        }
        settings
    }
}
