// SPDX-License-Identifier: MPL-2.0
//! Core media types for the domain layer.
//!
//! These types represent pure data without any presentation dependencies.

use std::path::PathBuf;
use std::sync::Arc;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if either dimension is zero.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of bytes an RGBA buffer of this size occupies.
    #[must_use]
    pub fn rgba_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

/// A point on a target surface, in pixels. May be negative (partially off-screen).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle used for cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.size().is_empty()
    }
}

/// Raw image data without presentation dependencies.
///
/// This is the domain representation of a decoded frame: a dense RGBA
/// buffer. Cloning is cheap because the pixels are shared.
///
/// # Example
///
/// ```
/// use vidsync::domain::media::RawImage;
/// use std::sync::Arc;
///
/// let pixels = vec![255u8; 100 * 100 * 4]; // 100x100 RGBA
/// let image = RawImage::new(100, 100, Arc::new(pixels));
///
/// assert_eq!(image.width(), 100);
/// assert_eq!(image.height(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct RawImage {
    /// Image width in pixels.
    width: u32,
    /// Image height in pixels.
    height: u32,
    /// RGBA pixel data (4 bytes per pixel).
    rgba_bytes: Arc<Vec<u8>>,
}

impl RawImage {
    /// Creates a new `RawImage` from dimensions and RGBA pixel data.
    ///
    /// # Panics
    ///
    /// Panics if the pixel data length doesn't match `width * height * 4`.
    #[must_use]
    pub fn new(width: u32, height: u32, rgba_bytes: Arc<Vec<u8>>) -> Self {
        let expected_len = Size::new(width, height).rgba_len();
        assert_eq!(
            rgba_bytes.len(),
            expected_len,
            "RGBA data length mismatch: expected {expected_len}, got {}",
            rgba_bytes.len()
        );

        Self {
            width,
            height,
            rgba_bytes,
        }
    }

    /// Creates a new `RawImage` from dimensions and owned RGBA pixel data.
    ///
    /// # Panics
    ///
    /// Panics if the pixel data length doesn't match `width * height * 4`.
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, rgba_bytes: Vec<u8>) -> Self {
        Self::new(width, height, Arc::new(rgba_bytes))
    }

    /// Creates an image of the given size filled with a single RGBA color.
    #[must_use]
    pub fn filled(size: Size, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat(size.rgba_len() / 4);
        Self::from_rgba(size.width, size.height, pixels)
    }

    /// Opaque black image, substituted for frames that cannot be resolved.
    #[must_use]
    pub fn blank(size: Size) -> Self {
        Self::filled(size, [0, 0, 0, 255])
    }

    /// Returns the image width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Returns a reference to the RGBA pixel data.
    #[must_use]
    pub fn rgba_bytes(&self) -> &[u8] {
        &self.rgba_bytes
    }

    /// Returns the shared reference to the RGBA pixel data.
    #[must_use]
    pub fn rgba_bytes_arc(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.rgba_bytes)
    }

    /// Returns the RGBA value of one pixel, or `None` outside the image.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = &self.rgba_bytes[offset..offset + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Returns the total number of pixels.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Size of the pixel buffer in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.rgba_bytes.len()
    }
}

impl PartialEq for RawImage {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.rgba_bytes == other.rgba_bytes
    }
}

impl Eq for RawImage {}

/// Metadata of a decodable clip.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// File the clip was opened from, if any.
    pub filename: Option<PathBuf>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second.
    pub fps: f64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Start offset inside the underlying file, in seconds.
    pub start_secs: f64,
    /// Whether the clip has an audio track.
    pub has_audio: bool,
}

impl MediaInfo {
    #[must_use]
    pub fn new(width: u32, height: u32, fps: f64, duration_secs: f64, has_audio: bool) -> Self {
        Self {
            filename: None,
            width,
            height,
            fps,
            duration_secs,
            start_secs: 0.0,
            has_audio,
        }
    }

    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        self.duration_secs * 1000.0
    }

    #[must_use]
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }

    /// Returns the total number of frames, `floor(duration * fps)`.
    ///
    /// Returns 0 for negative or non-finite durations and frame rates.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn frame_count(&self) -> usize {
        let frames = self.duration_secs * self.fps;
        if frames.is_finite() && frames > 0.0 {
            frames.floor() as usize
        } else {
            0
        }
    }

    /// Time in seconds at which the given frame starts.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn frame_time(&self, index: usize) -> f64 {
        index as f64 * (1.0 / self.fps)
    }

    /// Returns a description of why this clip is unusable, if it is.
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Some(format!("frame rate must be positive, got {}", self.fps));
        }
        if !self.duration_secs.is_finite() || self.duration_secs < 0.0 {
            return Some(format!(
                "duration must be a non-negative number of seconds, got {}",
                self.duration_secs
            ));
        }
        if self.size().is_empty() {
            return Some(format!(
                "frame size must be non-zero, got {}x{}",
                self.width, self.height
            ));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_image_creation() {
        let pixels = vec![0u8; 10 * 10 * 4];
        let image = RawImage::from_rgba(10, 10, pixels);

        assert_eq!(image.width(), 10);
        assert_eq!(image.height(), 10);
        assert_eq!(image.pixel_count(), 100);
        assert_eq!(image.size_bytes(), 400);
    }

    #[test]
    #[should_panic(expected = "RGBA data length mismatch")]
    fn test_raw_image_invalid_size() {
        let pixels = vec![0u8; 100]; // Wrong size
        let _ = RawImage::from_rgba(10, 10, pixels);
    }

    #[test]
    fn test_blank_image_is_opaque_black() {
        let image = RawImage::blank(Size::new(3, 2));
        assert_eq!(image.size(), Size::new(3, 2));
        assert_eq!(image.pixel(2, 1), Some([0, 0, 0, 255]));
        assert_eq!(image.pixel(3, 0), None);
    }

    #[test]
    fn test_raw_image_equality() {
        let image1 = RawImage::filled(Size::new(4, 4), [1, 2, 3, 4]);
        let image2 = RawImage::filled(Size::new(4, 4), [1, 2, 3, 4]);
        let image3 = RawImage::filled(Size::new(4, 4), [9, 2, 3, 4]);

        assert_eq!(image1, image2);
        assert_ne!(image1, image3);
    }

    #[test]
    fn test_frame_count_floors() {
        let info = MediaInfo::new(640, 480, 30.0, 10.0, true);
        assert_eq!(info.frame_count(), 300);

        let info = MediaInfo::new(640, 480, 24.0, 10.51, false);
        assert_eq!(info.frame_count(), 252);
    }

    #[test]
    fn test_frame_count_rejects_garbage() {
        let info = MediaInfo::new(640, 480, f64::NAN, 10.0, true);
        assert_eq!(info.frame_count(), 0);
        let info = MediaInfo::new(640, 480, 30.0, -1.0, true);
        assert_eq!(info.frame_count(), 0);
    }

    #[test]
    fn test_validate() {
        assert!(MediaInfo::new(640, 480, 30.0, 10.0, true).validate().is_none());
        assert!(MediaInfo::new(640, 480, 0.0, 10.0, true).validate().is_some());
        assert!(MediaInfo::new(0, 480, 30.0, 10.0, true).validate().is_some());
        assert!(MediaInfo::new(640, 480, 30.0, f64::INFINITY, true)
            .validate()
            .is_some());
    }

    #[test]
    fn test_rect_size() {
        let rect = Rect::new(5, 5, 20, 10);
        assert_eq!(rect.size(), Size::new(20, 10));
        assert!(!rect.is_empty());
        assert!(Rect::new(0, 0, 0, 10).is_empty());
    }
}
