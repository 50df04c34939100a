// src/config.rs

//! Defines the configuration structures for `glyphstrip`.
//!
//! Settings are deserialized from a JSON file named by the
//! `GLYPHSTRIP_CONFIG` environment variable. Every field has a default, so a
//! config file only needs the values it changes, and a missing file means
//! the built-in defaults. Command-line flags override these per run.

use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV_VAR: &str = "GLYPHSTRIP_CONFIG";

/// Process-wide configuration, loaded on first use.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::load_or_default);

/// Root of the configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Glyph rendering settings.
    pub render: RenderConfig,
    /// Where the image goes.
    pub output: OutputConfig,
}

impl Config {
    /// Load from `$GLYPHSTRIP_CONFIG` if set, else defaults.
    ///
    /// An unreadable or malformed file is reported and ignored.
    pub fn load_or_default() -> Self {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(Path::new(&path)).unwrap_or_else(|e| {
                warn!("Ignoring config file: {:#}. Using defaults.", e);
                Config::default()
            }),
            None => Config::default(),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        let config = Self::from_json_str(&text)
            .with_context(|| format!("Failed to parse '{}'", path.display()))?;
        info!("Configuration loaded from '{}'", path.display());
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

// --- Render Configuration ---

/// Settings that control how glyphs are rasterized and spaced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderConfig {
    /// Target pixel size. Scalable fonts render at this size; color bitmap
    /// fonts use their closest embedded size.
    pub pixel_size: u32,
    /// Advance of U+0020 in pixels. `None` means half of `pixel_size`.
    pub space_width: Option<u32>,
    /// Hint scalable outlines.
    pub hinting: bool,
}

impl RenderConfig {
    pub fn space_width(&self) -> u32 {
        self.space_width.unwrap_or(self.pixel_size / 2)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            pixel_size: 128,
            space_width: None,
            hinting: true,
        }
    }
}

// --- Output Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the PPM file to write.
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            path: PathBuf::from("out.ppm"),
        }
    }
}
