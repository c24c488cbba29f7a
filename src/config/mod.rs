// SPDX-License-Identifier: MPL-2.0
//! Engine configuration: image limits per slot, crop bounds and storage.
//!
//! Configuration is stored as `engine.toml` with one section per concern:
//!
//! ```toml
//! [avatar]
//! max_upload_bytes = 5242880
//! max_edge_px = 1024
//! quality = 85
//! output_width = 400
//! output_height = 400
//! output_format = "png"
//!
//! [crop]
//! zoom_safety_margin = 1.0001
//! max_zoom = 8.0
//!
//! [storage]
//! endpoint = "https://api.example.test/v1"
//! ```
//!
//! # Path Resolution
//!
//! 1. Explicit directory passed to [`load_with_override`]
//! 2. `LINKPAGE_STUDIO_CONFIG_DIR` environment variable
//! 3. Platform config directory (`dirs::config_dir()/LinkpageStudio`)
//!
//! A missing file yields defaults. A file that cannot be read or parsed also
//! yields defaults, together with a warning key for the caller to surface.

pub mod defaults;

use crate::domain::settings::AssetSlot;
use crate::error::{Error, Result};
use defaults::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "engine.toml";
const APP_NAME: &str = "LinkpageStudio";

/// Environment variable to override the config directory.
pub const ENV_CONFIG_DIR: &str = "LINKPAGE_STUDIO_CONFIG_DIR";

/// Environment variable to override the data directory used by local adapters.
pub const ENV_DATA_DIR: &str = "LINKPAGE_STUDIO_DATA_DIR";

/// Warning key returned when an existing config file could not be used.
pub const LOAD_WARNING_KEY: &str = "notification-config-load-error";

// =============================================================================
// Sections
// =============================================================================

/// Encoding of the derived image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    #[must_use]
    pub fn image_format(self) -> image_rs::ImageFormat {
        match self {
            OutputFormat::Png => image_rs::ImageFormat::Png,
            OutputFormat::Jpeg => image_rs::ImageFormat::Jpeg,
        }
    }
}

/// Limits and output surface of one image slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageLimits {
    pub max_upload_bytes: usize,
    pub max_edge_px: u32,
    pub quality: u8,
    pub output_width: u32,
    pub output_height: u32,
    pub output_format: OutputFormat,
}

impl ImageLimits {
    #[must_use]
    pub fn avatar() -> Self {
        Self {
            max_upload_bytes: DEFAULT_AVATAR_MAX_UPLOAD_BYTES,
            max_edge_px: DEFAULT_AVATAR_MAX_EDGE_PX,
            quality: DEFAULT_AVATAR_QUALITY,
            output_width: DEFAULT_AVATAR_OUTPUT_WIDTH,
            output_height: DEFAULT_AVATAR_OUTPUT_HEIGHT,
            output_format: OutputFormat::Png,
        }
    }

    #[must_use]
    pub fn background() -> Self {
        Self {
            max_upload_bytes: DEFAULT_BACKGROUND_MAX_UPLOAD_BYTES,
            max_edge_px: DEFAULT_BACKGROUND_MAX_EDGE_PX,
            quality: DEFAULT_BACKGROUND_QUALITY,
            output_width: DEFAULT_BACKGROUND_OUTPUT_WIDTH,
            output_height: DEFAULT_BACKGROUND_OUTPUT_HEIGHT,
            output_format: OutputFormat::Jpeg,
        }
    }

    fn validate(&self, section: &str) -> Result<()> {
        let invalid = |message: String| Err(Error::Config(format!("[{section}] {message}")));
        if self.max_upload_bytes == 0 || self.max_upload_bytes > MAX_UPLOAD_CEILING_BYTES {
            return invalid(format!(
                "max_upload_bytes must be in 1..={MAX_UPLOAD_CEILING_BYTES}"
            ));
        }
        if !(MIN_EDGE_PX..=MAX_EDGE_PX).contains(&self.max_edge_px) {
            return invalid(format!("max_edge_px must be in {MIN_EDGE_PX}..={MAX_EDGE_PX}"));
        }
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.quality) {
            return invalid(format!("quality must be in {MIN_QUALITY}..={MAX_QUALITY}"));
        }
        if self.output_width == 0 || self.output_height == 0 {
            return invalid("output size must be non-zero".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    pub zoom_safety_margin: f64,
    pub max_zoom: f64,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            zoom_safety_margin: DEFAULT_ZOOM_SAFETY_MARGIN,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root for the file gateway and file asset host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Base URL of the HTTP backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub reopen_cache_entries: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            endpoint: None,
            reopen_cache_entries: DEFAULT_REOPEN_CACHE_ENTRIES,
        }
    }
}

// =============================================================================
// EngineConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "ImageLimits::avatar")]
    pub avatar: ImageLimits,
    #[serde(default = "ImageLimits::background")]
    pub background: ImageLimits,
    #[serde(default)]
    pub crop: CropConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            avatar: ImageLimits::avatar(),
            background: ImageLimits::background(),
            crop: CropConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Limits for `slot`.
    #[must_use]
    pub fn limits(&self, slot: AssetSlot) -> &ImageLimits {
        match slot {
            AssetSlot::Avatar => &self.avatar,
            AssetSlot::Background => &self.background,
        }
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending section.
    pub fn validate(&self) -> Result<()> {
        self.avatar.validate("avatar")?;
        self.background.validate("background")?;
        if self.crop.zoom_safety_margin < 1.0 {
            return Err(Error::Config(
                "[crop] zoom_safety_margin must be at least 1.0".to_string(),
            ));
        }
        if !(MIN_MAX_ZOOM..=MAX_MAX_ZOOM).contains(&self.crop.max_zoom) {
            return Err(Error::Config(format!(
                "[crop] max_zoom must be in {MIN_MAX_ZOOM}..={MAX_MAX_ZOOM}"
            )));
        }
        if self.storage.reopen_cache_entries == 0 {
            return Err(Error::Config(
                "[storage] reopen_cache_entries must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The data directory: configured value, then `LINKPAGE_STUDIO_DATA_DIR`,
    /// then the platform data directory.
    #[must_use]
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage
            .data_dir
            .clone()
            .or_else(|| std::env::var_os(ENV_DATA_DIR).map(PathBuf::from))
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_NAME)))
    }
}

// =============================================================================
// Config Path Resolution
// =============================================================================

fn config_dir_with_override(base_dir: Option<PathBuf>) -> Option<PathBuf> {
    base_dir
        .or_else(|| std::env::var_os(ENV_CONFIG_DIR).map(PathBuf::from))
        .or_else(|| dirs::config_dir().map(|dir| dir.join(APP_NAME)))
}

fn config_path_with_override(base_dir: Option<PathBuf>) -> Option<PathBuf> {
    config_dir_with_override(base_dir).map(|mut path| {
        path.push(CONFIG_FILE);
        path
    })
}

// =============================================================================
// Load / Save
// =============================================================================

/// Loads the configuration from the default path.
///
/// Returns the config and an optional warning key.
#[must_use]
pub fn load() -> (EngineConfig, Option<String>) {
    load_with_override(None)
}

/// Loads the configuration from a custom directory.
#[must_use]
pub fn load_with_override(base_dir: Option<PathBuf>) -> (EngineConfig, Option<String>) {
    let Some(path) = config_path_with_override(base_dir) else {
        return (EngineConfig::default(), None);
    };
    if !path.exists() {
        return (EngineConfig::default(), None);
    }
    match load_from_path(&path) {
        Ok(config) => (config, None),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "falling back to default config");
            (EngineConfig::default(), Some(LOAD_WARNING_KEY.to_string()))
        }
    }
}

/// Loads and validates configuration from a specific file.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read and [`Error::Config`]
/// when it is not valid TOML or a value is out of range.
pub fn load_from_path(path: &Path) -> Result<EngineConfig> {
    let content = fs::read_to_string(path)?;
    let config: EngineConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Saves the configuration to a custom directory (default path when `None`).
///
/// # Errors
///
/// Propagates serialization and I/O failures.
pub fn save_with_override(config: &EngineConfig, base_dir: Option<PathBuf>) -> Result<()> {
    if let Some(path) = config_path_with_override(base_dir) {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Saves configuration to a specific path, creating parent directories.
///
/// # Errors
///
/// Propagates serialization and I/O failures.
pub fn save_to_path(config: &EngineConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
