// SPDX-License-Identifier: MPL-2.0
//! Media decoding port definition.
//!
//! This module defines the [`MediaDecoder`] and [`MediaSource`] traits.
//! Infrastructure adapters (a real demuxer, or the bundled synthetic decoder)
//! implement them.
//!
//! # Design Notes
//!
//! - A [`MediaSource`] is an opaque clip handle owned by one playback instance
//! - Transforms never mutate a source; they return a new one
//! - Copying a source is an explicit capability ([`MediaSource::duplicate`])
//! - Uses domain types only (`RawImage`, `MediaInfo`, `Transform`, `VideoError`)

use crate::domain::error::VideoError;
use crate::domain::media::{MediaInfo, RawImage, Size};
use crate::domain::video::Transform;
use std::fmt;
use std::path::Path;

/// Options applied when opening a clip.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OpenOptions {
    /// Decode the alpha mask along with the color planes.
    pub has_mask: bool,
    /// Resize every frame to this size at decode time.
    pub target_resolution: Option<Size>,
}

/// Port for opening clips.
pub trait MediaDecoder {
    /// Opens the clip at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`VideoError`] if the file cannot be read, the format is not
    /// supported, or no video stream is found.
    fn open(&self, path: &Path, options: &OpenOptions) -> Result<Box<dyn MediaSource>, VideoError>;
}

/// An opened, decodable clip.
///
/// # Thread Safety
///
/// Implementations must be `Send` so playback handles can move between
/// threads. Decoding is stateful (`frame_at` takes `&mut self`).
pub trait MediaSource: Send + fmt::Debug {
    /// Clip metadata.
    fn info(&self) -> MediaInfo;

    /// Decodes the frame displayed at `time_secs`.
    ///
    /// # Errors
    ///
    /// Returns a [`VideoError`] if the time is outside the clip or decoding
    /// fails.
    fn frame_at(&mut self, time_secs: f64) -> Result<RawImage, VideoError>;

    /// Returns a new clip with `transform` applied. `self` is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::TransformFailed`] if the edit cannot be applied.
    fn apply(&self, transform: &Transform) -> Result<Box<dyn MediaSource>, VideoError>;

    /// Writes the audio track to `dest`, replacing any existing file.
    ///
    /// May take time proportional to the clip duration.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::NoAudioStream`] when the clip has no audio, or an
    /// I/O error if the file cannot be written.
    fn extract_audio(&self, dest: &Path) -> Result<(), VideoError>;

    /// Returns an independent copy of this clip.
    ///
    /// # Errors
    ///
    /// Returns a [`VideoError`] if the underlying handle cannot be reopened.
    fn duplicate(&self) -> Result<Box<dyn MediaSource>, VideoError>;

    /// Releases decoder resources. Further `frame_at` calls fail.
    fn close(&mut self);
}
