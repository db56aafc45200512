// SPDX-License-Identifier: MPL-2.0
//! Named clip transforms.
//!
//! A [`Transform`] is a value describing an edit. Applying it to pixels is the
//! decoder's job; this module only knows how an edit changes clip metadata and
//! the clip timeline, which is enough for the playback engine and for decoders
//! that want a shared definition of the arithmetic.

use crate::domain::media::{MediaInfo, Rect, Size};

/// Mirror axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Flip left-to-right.
    X,
    /// Flip top-to-bottom.
    Y,
}

/// Fade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    In,
    Out,
}

/// Target of a resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeSpec {
    /// Multiply both dimensions by a factor.
    Scale(f64),
    /// Resize to an exact size.
    Exact(Size),
}

impl From<Size> for ResizeSpec {
    fn from(size: Size) -> Self {
        Self::Exact(size)
    }
}

impl From<f64> for ResizeSpec {
    fn from(scale: f64) -> Self {
        Self::Scale(scale)
    }
}

/// An edit applied to a clip, producing a new clip.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    Crop(Rect),
    /// Counter-clockwise rotation; the frame grows to hold the rotated image.
    Rotate {
        degrees: f64,
    },
    Resize(ResizeSpec),
    /// Playback speed factor; 2.0 halves the duration.
    Speed(f64),
    /// Replace the frame rate.
    Fps(f64),
    Grayscale,
    Mirror(Axis),
    Fade {
        direction: FadeDirection,
        duration_secs: f64,
    },
    /// Keep only `[start_secs, end_secs)` of the clip.
    Trim {
        start_secs: f64,
        end_secs: f64,
    },
    InvertColors,
}

impl Transform {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Crop(_) => "crop",
            Self::Rotate { .. } => "rotate",
            Self::Resize(_) => "resize",
            Self::Speed(_) => "speed",
            Self::Fps(_) => "fps",
            Self::Grayscale => "grayscale",
            Self::Mirror(_) => "mirror",
            Self::Fade { .. } => "fade",
            Self::Trim { .. } => "trim",
            Self::InvertColors => "invert_colors",
        }
    }

    /// Metadata of the clip produced by applying this transform to `info`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn apply_to_info(&self, info: &MediaInfo) -> MediaInfo {
        let mut next = info.clone();
        match *self {
            Self::Crop(rect) => {
                next.width = rect.width;
                next.height = rect.height;
            }
            Self::Rotate { degrees } => {
                let size = rotated_size(info.size(), degrees);
                next.width = size.width;
                next.height = size.height;
            }
            Self::Resize(spec) => {
                let size = resized_size(info.size(), spec);
                next.width = size.width;
                next.height = size.height;
            }
            Self::Speed(factor) => {
                next.duration_secs = info.duration_secs / factor;
            }
            Self::Fps(fps) => {
                next.fps = fps;
            }
            Self::Trim {
                start_secs,
                end_secs,
            } => {
                next.duration_secs = end_secs - start_secs;
                next.start_secs = 0.0;
            }
            Self::Grayscale | Self::Mirror(_) | Self::Fade { .. } | Self::InvertColors => {}
        }
        next
    }

    /// Maps a time on the transformed clip back to the input clip.
    #[must_use]
    pub fn source_time(&self, time_secs: f64) -> f64 {
        match *self {
            Self::Speed(factor) => time_secs * factor,
            Self::Trim { start_secs, .. } => time_secs + start_secs,
            _ => time_secs,
        }
    }
}

/// Output size of a resize, never smaller than 1x1.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn resized_size(size: Size, spec: ResizeSpec) -> Size {
    match spec {
        ResizeSpec::Exact(target) => target,
        ResizeSpec::Scale(factor) => Size::new(
            ((f64::from(size.width) * factor).round() as u32).max(1),
            ((f64::from(size.height) * factor).round() as u32).max(1),
        ),
    }
}

/// Bounding box of a frame rotated by `degrees`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rotated_size(size: Size, degrees: f64) -> Size {
    let radians = degrees.to_radians();
    let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
    let w = f64::from(size.width);
    let h = f64::from(size.height);
    Size::new(
        ((w * cos + h * sin).round() as u32).max(1),
        ((w * sin + h * cos).round() as u32).max(1),
    )
}
