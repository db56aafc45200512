// SPDX-License-Identifier: MPL-2.0
//! Per-instance cache of decoded frames.
//!
//! # Design
//!
//! - **Index-keyed**: frames are stored by frame index, not timestamp
//! - **Fail-soft**: when memory runs out the cache marks itself full and
//!   silently stops caching until [`FrameCache::clear`]
//! - **No eviction**: a full cache keeps what it has
//! - **Budgets**: optional frame and byte limits count as memory exhaustion,
//!   which makes the "full" path deterministic
//!
//! # Usage
//!
//! ```ignore
//! let mut cache = FrameCache::new(CacheConfig::default());
//! cache.put(12, frame);
//! if let Some(cached) = cache.get(12) {
//!     // Use cached frame
//! }
//! ```

use crate::config::PlaybackConfig;
use crate::domain::media::RawImage;
use std::collections::HashMap;

/// Configuration for the frame cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Whether caching is enabled.
    pub enabled: bool,

    /// Maximum number of frames to cache.
    pub max_frames: Option<usize>,

    /// Maximum total pixel bytes to cache.
    pub max_bytes: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_frames: None,
            max_bytes: None,
        }
    }
}

impl CacheConfig {
    /// Creates a disabled cache configuration.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Enabled cache holding at most `max_frames` frames.
    #[must_use]
    pub fn with_max_frames(max_frames: usize) -> Self {
        Self {
            max_frames: Some(max_frames),
            ..Default::default()
        }
    }
}

impl From<&PlaybackConfig> for CacheConfig {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            enabled: config.cache,
            max_frames: config.max_cached_frames,
            max_bytes: config.max_cache_bytes,
        }
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of frames currently in cache.
    pub frame_count: usize,

    /// Total bytes currently used by cached frames.
    pub total_bytes: usize,

    /// Number of cache hits (frame found).
    pub hits: u64,

    /// Number of cache misses (frame not found).
    pub misses: u64,

    /// Number of frames inserted.
    pub insertions: u64,

    /// Number of inserts dropped because the cache was full or disabled.
    pub rejected: u64,
}

impl CacheStats {
    /// Returns the cache hit rate as a percentage (0.0 - 100.0).
    // Allow cast_precision_loss: cache statistics - exact precision not required
    // for percentages. Hit/miss counts are unlikely to exceed f64 mantissa (2^52).
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Mapping from frame index to decoded frame.
pub struct FrameCache {
    frames: HashMap<usize, RawImage>,
    config: CacheConfig,
    full: bool,
    current_bytes: usize,
    stats: CacheStats,
}

impl FrameCache {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            frames: HashMap::new(),
            config,
            full: false,
            current_bytes: 0,
            stats: CacheStats::default(),
        }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Returns whether caching is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// True once an insert ran out of room; cleared by [`clear`](Self::clear).
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Returns a cached frame. Images share their pixels, so this is cheap.
    pub fn get(&mut self, index: usize) -> Option<RawImage> {
        if !self.config.enabled {
            return None;
        }
        if let Some(frame) = self.frames.get(&index) {
            self.stats.hits += 1;
            Some(frame.clone())
        } else {
            self.stats.misses += 1;
            None
        }
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.config.enabled && self.frames.contains_key(&index)
    }

    /// Stores a frame.
    ///
    /// Returns `false` without storing when the cache is disabled, already
    /// full, or this insert exhausts it (which marks it full).
    pub fn put(&mut self, index: usize, frame: RawImage) -> bool {
        if !self.config.enabled || self.full {
            self.stats.rejected += 1;
            return false;
        }

        let frame_bytes = frame.size_bytes();
        let replacing = self.frames.get(&index).map(RawImage::size_bytes);
        let new_len = self.frames.len() + usize::from(replacing.is_none());
        let new_bytes = self.current_bytes - replacing.unwrap_or(0) + frame_bytes;

        let over_frames = self.config.max_frames.is_some_and(|max| new_len > max);
        let over_bytes = self.config.max_bytes.is_some_and(|max| new_bytes > max);
        if over_frames || over_bytes || self.frames.try_reserve(1).is_err() {
            self.full = true;
            self.stats.rejected += 1;
            tracing::debug!(
                frames = self.frames.len(),
                bytes = self.current_bytes,
                "frame cache full, caching stopped"
            );
            return false;
        }

        self.frames.insert(index, frame);
        self.current_bytes = new_bytes;
        self.stats.insertions += 1;
        self.stats.frame_count = self.frames.len();
        self.stats.total_bytes = self.current_bytes;
        true
    }

    /// Empties the cache and makes it accept inserts again.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.full = false;
        self.current_bytes = 0;
        self.stats.frame_count = 0;
        self.stats.total_bytes = 0;
    }

    /// Returns the current cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Returns the current number of cached frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns the current memory usage in bytes.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.current_bytes
    }

    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

impl std::fmt::Debug for FrameCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCache")
            .field("enabled", &self.config.enabled)
            .field("full", &self.full)
            .field("frame_count", &self.frames.len())
            .field("memory_usage", &self.current_bytes)
            .field("max_bytes", &self.config.max_bytes)
            .field("max_frames", &self.config.max_frames)
            .field("stats", &self.stats)
            .finish()
    }
}
