// SPDX-License-Identifier: MPL-2.0
//! Clip edits on a live playback instance.
//!
//! Every edit runs the same pipeline: stop playback, drop cached frames,
//! build the new clip, swap it in and regenerate the audio track. An
//! instance that was prepared before the edit is prepared again afterwards,
//! stopped at the start.

use super::state::{Playback, PlaybackCore};
use crate::application::port::MediaSource;
use crate::domain::media::{MediaInfo, Rect};
use crate::domain::video::{Alpha, Axis, FadeDirection, ResizeSpec, Transform};
use crate::error::{Error, Result};

/// Checks the arguments of `transform` against the clip it will edit.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] describing the first bad argument.
pub fn validate_transform(transform: &Transform, info: &MediaInfo) -> Result<()> {
    match *transform {
        Transform::Crop(rect) => {
            if rect.is_empty() {
                return Err(Error::invalid("crop", "a non-empty rectangle", format!("{rect:?}")));
            }
            let fits = u64::from(rect.x) + u64::from(rect.width) <= u64::from(info.width)
                && u64::from(rect.y) + u64::from(rect.height) <= u64::from(info.height);
            if !fits {
                return Err(Error::invalid(
                    "crop",
                    "a rectangle inside the frame",
                    format!("{rect:?} on {}x{}", info.width, info.height),
                ));
            }
        }
        Transform::Rotate { degrees } => {
            if !degrees.is_finite() {
                return Err(Error::invalid("degrees", "a finite angle", degrees));
            }
        }
        Transform::Resize(ResizeSpec::Scale(factor)) => {
            if !(factor.is_finite() && factor > 0.0) {
                return Err(Error::invalid("scale", "a positive factor", factor));
            }
        }
        Transform::Resize(ResizeSpec::Exact(size)) => {
            if size.is_empty() {
                return Err(Error::invalid(
                    "size",
                    "a non-zero width and height",
                    format!("{}x{}", size.width, size.height),
                ));
            }
        }
        Transform::Speed(factor) => {
            if !(factor.is_finite() && factor > 0.0) {
                return Err(Error::invalid("speed", "a positive factor", factor));
            }
        }
        Transform::Fps(fps) => {
            if !(fps.is_finite() && fps > 0.0) {
                return Err(Error::invalid("fps", "a positive frame rate", fps));
            }
        }
        Transform::Fade { duration_secs, .. } => {
            if !(duration_secs.is_finite() && duration_secs >= 0.0) {
                return Err(Error::invalid(
                    "duration",
                    "a non-negative number of seconds",
                    duration_secs,
                ));
            }
        }
        Transform::Trim {
            start_secs,
            end_secs,
        } => {
            let valid = start_secs.is_finite()
                && end_secs.is_finite()
                && start_secs >= 0.0
                && start_secs < end_secs
                && end_secs <= info.duration_secs;
            if !valid {
                return Err(Error::invalid(
                    "trim",
                    "0 <= start < end <= duration",
                    format!("{start_secs}..{end_secs} of {}", info.duration_secs),
                ));
            }
        }
        Transform::Grayscale | Transform::Mirror(_) | Transform::InvertColors => {}
    }
    Ok(())
}

impl PlaybackCore {
    /// Swaps in the clip returned by `build` and regenerates the audio.
    ///
    /// An invalid clip is closed and the current one kept.
    pub(super) fn replace_source(
        &mut self,
        label: &str,
        build: impl FnOnce(&Self) -> Result<Box<dyn MediaSource>>,
    ) -> Result<()> {
        self.ensure_initialized()?;
        self.halt();
        self.cache.clear();

        let mut next = build(self)?;
        let info = next.info();
        if let Some(reason) = info.validate() {
            next.close();
            tracing::warn!(id = %self.id, transform = label, %reason, "transform produced an invalid clip");
            return Err(Error::InvalidSource(reason));
        }
        self.source = next;
        self.info = info;
        tracing::info!(
            id = %self.id,
            transform = label,
            width = self.info.width,
            height = self.info.height,
            fps = self.info.fps,
            duration_secs = self.info.duration_secs,
            "clip transformed"
        );
        self.refresh_audio()
    }

    fn refresh_audio(&mut self) -> Result<()> {
        let was_ready = self.ready;
        self.release();
        self.temp_audio.delete()?;
        if self.info.has_audio && (was_ready || !self.config.load_audio_in_prepare) {
            self.regenerate_audio()?;
        }
        if was_ready {
            self.prepare()?;
        }
        Ok(())
    }

    /// Writes the track of the current clip, overwriting any file left over
    /// from the previous one.
    pub(super) fn regenerate_audio(&mut self) -> Result<()> {
        self.assign_temp_audio_name();
        if self.temp_audio.is_present() {
            tracing::warn!(id = %self.id, "stale temp audio still on disk, overwriting");
        }
        let path = self.temp_audio.extract(self.source.as_ref())?;
        tracing::info!(id = %self.id, path = %path.display(), "temp audio regenerated");
        Ok(())
    }
}

impl Playback {
    /// Applies `transforms` in order as a single edit.
    fn apply_all(&self, label: &str, transforms: &[Transform]) -> Result<&Self> {
        let mut core = self.lock();
        core.ensure_initialized()?;
        let mut info = core.info.clone();
        for transform in transforms {
            validate_transform(transform, &info)?;
            info = transform.apply_to_info(&info);
        }

        core.replace_source(label, |core| {
            let mut source = core.source.duplicate()?;
            for transform in transforms {
                source = source.apply(transform)?;
            }
            Ok(source)
        })?;
        Ok(self)
    }

    /// Applies a named transform.
    ///
    /// # Errors
    ///
    /// Bad arguments are rejected before anything changes. Decoder failures
    /// leave the instance stopped with an empty cache.
    pub fn apply_transform(&self, transform: Transform) -> Result<&Self> {
        self.apply_all(transform.name(), std::slice::from_ref(&transform))
    }

    /// Replaces the clip with whatever `edit` builds from the current one.
    ///
    /// # Errors
    ///
    /// Returns `edit`'s error, or [`Error::InvalidSource`] if the new clip is
    /// unusable; the current clip is kept in both cases.
    pub fn apply_custom<F>(&self, edit: F) -> Result<&Self>
    where
        F: FnOnce(&dyn MediaSource) -> Result<Box<dyn MediaSource>>,
    {
        self.lock()
            .replace_source("custom", |core| edit(core.source.as_ref()))?;
        Ok(self)
    }

    /// Crops to `rect`, then resizes to the rectangle's size.
    ///
    /// # Errors
    ///
    /// See [`apply_transform`](Self::apply_transform).
    pub fn crop(&self, rect: Rect) -> Result<&Self> {
        self.apply_all(
            "crop",
            &[
                Transform::Crop(rect),
                Transform::Resize(ResizeSpec::Exact(rect.size())),
            ],
        )
    }

    /// Rotates counter-clockwise by `degrees`.
    ///
    /// # Errors
    ///
    /// See [`apply_transform`](Self::apply_transform).
    pub fn rotate(&self, degrees: f64) -> Result<&Self> {
        self.apply_transform(Transform::Rotate { degrees })
    }

    /// # Errors
    ///
    /// See [`apply_transform`](Self::apply_transform).
    pub fn resize(&self, spec: impl Into<ResizeSpec>) -> Result<&Self> {
        self.apply_transform(Transform::Resize(spec.into()))
    }

    /// # Errors
    ///
    /// See [`apply_transform`](Self::apply_transform).
    pub fn set_speed(&self, factor: f64) -> Result<&Self> {
        self.apply_transform(Transform::Speed(factor))
    }

    /// # Errors
    ///
    /// See [`apply_transform`](Self::apply_transform).
    pub fn set_fps(&self, fps: f64) -> Result<&Self> {
        self.apply_transform(Transform::Fps(fps))
    }

    /// # Errors
    ///
    /// See [`apply_transform`](Self::apply_transform).
    pub fn grayscale(&self) -> Result<&Self> {
        self.apply_transform(Transform::Grayscale)
    }

    /// # Errors
    ///
    /// See [`apply_transform`](Self::apply_transform).
    pub fn mirror(&self, axis: Axis) -> Result<&Self> {
        self.apply_transform(Transform::Mirror(axis))
    }

    /// # Errors
    ///
    /// See [`apply_transform`](Self::apply_transform).
    pub fn fade(&self, direction: FadeDirection, duration_secs: f64) -> Result<&Self> {
        self.apply_transform(Transform::Fade {
            direction,
            duration_secs,
        })
    }

    /// Keeps only `[start_secs, end_secs)` of the clip.
    ///
    /// # Errors
    ///
    /// See [`apply_transform`](Self::apply_transform).
    pub fn trim(&self, start_secs: f64, end_secs: f64) -> Result<&Self> {
        self.apply_transform(Transform::Trim {
            start_secs,
            end_secs,
        })
    }

    /// # Errors
    ///
    /// See [`apply_transform`](Self::apply_transform).
    pub fn invert_colors(&self) -> Result<&Self> {
        self.apply_transform(Transform::InvertColors)
    }

    /// Goes back to the clip as opened, with default size and alpha.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`, and audio errors from
    /// the regeneration.
    pub fn reset(&self) -> Result<&Self> {
        let mut core = self.lock();
        core.ensure_initialized()?;
        core.size = None;
        core.alpha = Alpha::OPAQUE;
        core.replace_source("reset", |core| Ok(core.original.duplicate()?))?;
        Ok(self)
    }

    /// Drops every cached frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`.
    pub fn clear_cache(&self) -> Result<&Self> {
        let mut core = self.lock();
        core.ensure_initialized()?;
        core.cache.clear();
        Ok(self)
    }
}
