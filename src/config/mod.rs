// SPDX-License-Identifier: MPL-2.0
//! This module handles playback configuration, including loading and saving
//! it to a `playback.toml` file.
//!
//! # Examples
//!
//! ```no_run
//! use vidsync::config::{self, PlaybackConfig};
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Cap the frame cache
//! config.max_cached_frames = Some(120);
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//! ```

pub mod defaults;

use crate::application::port::OpenOptions;
use crate::domain::media::Size;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "playback.toml";
const APP_NAME: &str = "vidsync";

/// Settings shared by every playback instance created from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Keep decoded frames in memory.
    pub cache: bool,
    /// Stop caching after this many frames.
    pub max_cached_frames: Option<usize>,
    /// Stop caching once cached pixels exceed this many bytes.
    pub max_cache_bytes: Option<usize>,
    /// Extract the audio track in `prepare()` rather than at construction.
    pub load_audio_in_prepare: bool,
    /// Directory for extracted audio tracks.
    pub temp_dir: Option<PathBuf>,
    pub temp_audio_stem: String,
    pub temp_audio_extension: String,
    /// Decode the alpha mask.
    pub has_mask: bool,
    /// Resize frames at decode time, as `[width, height]`.
    pub target_resolution: Option<[u32; 2]>,
    /// Log every decoded frame during cache fills.
    pub log_progress: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            cache: defaults::DEFAULT_CACHE_ENABLED,
            max_cached_frames: None,
            max_cache_bytes: None,
            load_audio_in_prepare: defaults::DEFAULT_LOAD_AUDIO_IN_PREPARE,
            temp_dir: None,
            temp_audio_stem: defaults::DEFAULT_TEMP_AUDIO_STEM.to_string(),
            temp_audio_extension: defaults::DEFAULT_TEMP_AUDIO_EXTENSION.to_string(),
            has_mask: false,
            target_resolution: None,
            log_progress: false,
        }
    }
}

impl PlaybackConfig {
    /// Directory extracted audio tracks are written to.
    ///
    /// Explicit `temp_dir`, then `$VIDSYNC_TEMP`, then the system temp dir.
    #[must_use]
    pub fn resolved_temp_dir(&self) -> PathBuf {
        if let Some(dir) = &self.temp_dir {
            return dir.clone();
        }
        std::env::var_os(defaults::TEMP_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }

    #[must_use]
    pub fn target_size(&self) -> Option<Size> {
        self.target_resolution
            .map(|[width, height]| Size::new(width, height))
    }

    /// Decoder options derived from this config.
    #[must_use]
    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            has_mask: self.has_mask,
            target_resolution: self.target_size(),
        }
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Result<PlaybackConfig> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(PlaybackConfig::default())
}

pub fn save(config: &PlaybackConfig) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Reads a config file. Unparseable content yields the defaults.
pub fn load_from_path(path: &Path) -> Result<PlaybackConfig> {
    let content = fs::read_to_string(path)?;
    match toml::from_str(&content) {
        Ok(config) => Ok(config),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "invalid config, using defaults");
            Ok(PlaybackConfig::default())
        }
    }
}

pub fn save_to_path(config: &PlaybackConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
