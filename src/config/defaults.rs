// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! This module serves as the single source of truth for default values
//! used across the crate. Constants are organized by category.
//!
//! # Categories
//!
//! - **Frame Cache**: Per-instance decoded frame caching
//! - **Temp Audio**: Naming and placement of extracted audio tracks
//! - **Volume**: Audio channel volume steps
//! - **Demo**: Synthetic clip used by the `vidsync` binary

// ==========================================================================
// Frame Cache Defaults
// ==========================================================================

/// Frame caching is on unless disabled in the config.
pub const DEFAULT_CACHE_ENABLED: bool = true;

// ==========================================================================
// Temp Audio Defaults
// ==========================================================================

/// File stem of extracted audio tracks; collisions get `_2`, `_3`, ... suffixes.
pub const DEFAULT_TEMP_AUDIO_STEM: &str = "__vidsync_temp__";

/// Extension of extracted audio tracks.
pub const DEFAULT_TEMP_AUDIO_EXTENSION: &str = "mp3";

/// Environment variable overriding the temp directory.
pub const TEMP_DIR_ENV: &str = "VIDSYNC_TEMP";

/// Extract the audio track during `prepare()` instead of at construction.
pub const DEFAULT_LOAD_AUDIO_IN_PREPARE: bool = true;

// ==========================================================================
// Volume Defaults
// ==========================================================================

/// Upper bound used by `add_volume` when the caller passes none.
pub const MAX_VOLUME: f32 = 1.0;

/// Lower bound used by `sub_volume` when the caller passes none.
pub const MIN_VOLUME: f32 = 0.0;

// ==========================================================================
// Demo Defaults
// ==========================================================================

pub const DEMO_DURATION_SECS: f64 = 5.0;
pub const DEMO_FPS: f64 = 30.0;
pub const DEMO_WIDTH: u32 = 320;
pub const DEMO_HEIGHT: u32 = 180;
pub const DEMO_TICKS: u32 = 90;
pub const DEMO_TICK_MS: u64 = 33;

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    assert!(MIN_VOLUME >= 0.0);
    assert!(MAX_VOLUME > MIN_VOLUME);
    assert!(MAX_VOLUME <= 1.0);

    assert!(DEMO_FPS > 0.0);
    assert!(DEMO_DURATION_SECS > 0.0);
    assert!(DEMO_WIDTH > 0);
    assert!(DEMO_HEIGHT > 0);
    assert!(DEMO_TICK_MS > 0);
};
