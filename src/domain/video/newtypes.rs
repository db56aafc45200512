// SPDX-License-Identifier: MPL-2.0
//! Video playback newtypes.
//!
//! This module provides type-safe wrappers for video playback values,
//! ensuring they are always within valid ranges.

// =============================================================================
// Volume
// =============================================================================

/// Volume bounds (0.0 to 1.0, where 1.0 = 100%).
pub mod volume_bounds {
    /// Minimum volume level.
    pub const MIN: f32 = 0.0;
    /// Maximum volume level.
    pub const MAX: f32 = 1.0;
    /// Default volume level.
    pub const DEFAULT: f32 = 1.0;
}

/// Volume level, guaranteed to be within valid range (0.0–1.0).
///
/// This newtype enforces validity at the type level, making it impossible
/// to hand an invalid volume to the audio channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume(f32);

impl Volume {
    /// Creates a new volume level, clamping to valid range.
    ///
    /// NaN maps to the minimum.
    #[must_use]
    pub fn new(volume: f32) -> Self {
        if volume.is_nan() {
            return Self(volume_bounds::MIN);
        }
        Self(volume.clamp(volume_bounds::MIN, volume_bounds::MAX))
    }

    /// Returns the volume value as f32.
    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }

    /// Returns true if volume is effectively muted (below audible threshold).
    #[must_use]
    pub fn is_muted(self) -> bool {
        self.0 < 0.001
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self(volume_bounds::DEFAULT)
    }
}

// =============================================================================
// Loops
// =============================================================================

/// Number of extra playthroughs after the first one.
///
/// `-1` loops forever, `0` plays once, `N` repeats `N` more times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Loops(i32);

impl Loops {
    /// Loop forever.
    pub const INFINITE: Self = Self(-1);
    /// Play once, no repeat.
    pub const ONCE: Self = Self(0);

    /// Returns `None` for values below -1.
    #[must_use]
    pub fn new(value: i32) -> Option<Self> {
        (value >= -1).then_some(Self(value))
    }

    #[must_use]
    pub fn value(self) -> i32 {
        self.0
    }

    #[must_use]
    pub fn is_infinite(self) -> bool {
        self.0 < 0
    }

    /// True when no repeat is left.
    #[must_use]
    pub fn is_exhausted(self) -> bool {
        self.0 == 0
    }

    /// Loops remaining after one more playthrough. Infinite stays infinite.
    #[must_use]
    pub fn next(self) -> Self {
        if self.is_infinite() {
            Self::INFINITE
        } else {
            Self(self.0.saturating_sub(1).max(0))
        }
    }
}

// =============================================================================
// Alpha
// =============================================================================

/// Display opacity, 0 (transparent) to 255 (opaque).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Alpha(u8);

impl Alpha {
    pub const OPAQUE: Self = Self(u8::MAX);
    pub const TRANSPARENT: Self = Self(0);

    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Returns `None` outside `0..=255`.
    #[must_use]
    pub fn from_int(value: i64) -> Option<Self> {
        u8::try_from(value).ok().map(Self)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_opaque(self) -> bool {
        self.0 == u8::MAX
    }
}

impl Default for Alpha {
    fn default() -> Self {
        Self::OPAQUE
    }
}

// =============================================================================
// Tests
// =============================================================================
