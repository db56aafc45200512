// SPDX-License-Identifier: MPL-2.0
//! Synthetic media decoder.
//!
//! Produces procedurally generated clips so the playback engine can run
//! without a demuxer. Every frame is a gradient whose blue channel encodes the
//! frame index (`index % 256`), which makes frame selection observable from
//! pixels alone. Transforms are applied to pixels with the `image` crate.
//!
//! "Audio extraction" writes a small text track that
//! [`SimulatedAudioChannel`](super::SimulatedAudioChannel) knows how to load.

use crate::application::port::{MediaDecoder, MediaSource, OpenOptions};
use crate::domain::error::VideoError;
use crate::domain::media::{MediaInfo, RawImage, Size};
use crate::domain::video::{Axis, FadeDirection, ResizeSpec, Transform};
use crate::infrastructure::image_presenter::from_rgba_image;
use image_rs::{imageops::FilterType, DynamicImage, Rgba, RgbaImage};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// First line of every synthetic audio track.
pub const AUDIO_TRACK_HEADER: &str = "vidsync-synthetic-audio";

/// Description of a generated clip.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticClip {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration_secs: f64,
    pub has_audio: bool,
    /// Frame indices (of the untransformed clip) whose decode fails.
    pub failing_frames: BTreeSet<usize>,
}

impl SyntheticClip {
    #[must_use]
    pub fn new(width: u32, height: u32, fps: f64, duration_secs: f64) -> Self {
        Self {
            width,
            height,
            fps,
            duration_secs,
            has_audio: true,
            failing_frames: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn without_audio(mut self) -> Self {
        self.has_audio = false;
        self
    }

    #[must_use]
    pub fn with_failing_frames(mut self, frames: impl IntoIterator<Item = usize>) -> Self {
        self.failing_frames.extend(frames);
        self
    }

    /// Opens the clip directly, bypassing a decoder.
    #[must_use]
    pub fn open(self) -> SyntheticSource {
        SyntheticSource::new(self, None, OpenOptions::default())
    }

    fn info(&self) -> MediaInfo {
        MediaInfo::new(
            self.width,
            self.height,
            self.fps,
            self.duration_secs,
            self.has_audio,
        )
    }
}

/// Decoder serving registered synthetic clips by path.
#[derive(Debug, Clone, Default)]
pub struct SyntheticDecoder {
    clips: HashMap<PathBuf, SyntheticClip>,
}

impl SyntheticDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `clip` available under `path`.
    #[must_use]
    pub fn with_clip(mut self, path: impl Into<PathBuf>, clip: SyntheticClip) -> Self {
        self.clips.insert(path.into(), clip);
        self
    }
}

impl MediaDecoder for SyntheticDecoder {
    fn open(&self, path: &Path, options: &OpenOptions) -> Result<Box<dyn MediaSource>, VideoError> {
        let clip = self
            .clips
            .get(path)
            .cloned()
            .ok_or_else(|| VideoError::IoError(format!("no such clip: {}", path.display())))?;
        if let Some(reason) = clip.info().validate() {
            return Err(VideoError::Other(reason));
        }
        Ok(Box::new(SyntheticSource::new(
            clip,
            Some(path.to_path_buf()),
            *options,
        )))
    }
}

/// A synthetic clip plus the transforms applied to it.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    clip: SyntheticClip,
    has_mask: bool,
    ops: Vec<Transform>,
    /// `stages[0]` is the raw clip, `stages[i + 1]` the clip after `ops[i]`.
    stages: Vec<MediaInfo>,
    closed: bool,
}

impl SyntheticSource {
    fn new(clip: SyntheticClip, filename: Option<PathBuf>, options: OpenOptions) -> Self {
        let mut base = clip.info();
        if let Some(name) = filename {
            base = base.with_filename(name);
        }
        let mut source = Self {
            clip,
            has_mask: options.has_mask,
            ops: Vec::new(),
            stages: vec![base],
            closed: false,
        };
        if let Some(size) = options.target_resolution {
            source.push(Transform::Resize(ResizeSpec::Exact(size)));
        }
        source
    }

    fn push(&mut self, transform: Transform) {
        let next = transform.apply_to_info(self.current());
        self.ops.push(transform);
        self.stages.push(next);
    }

    fn current(&self) -> &MediaInfo {
        // stages always holds the base clip
        &self.stages[self.stages.len() - 1]
    }

    /// Transforms applied so far, in order.
    #[must_use]
    pub fn transforms(&self) -> &[Transform] {
        &self.ops
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn base_frame(&self, index: usize) -> RgbaImage {
        let (w, h) = (self.clip.width, self.clip.height);
        let blue = (index % 256) as u8;
        let has_mask = self.has_mask;
        RgbaImage::from_fn(w, h, |x, y| {
            let r = (u64::from(x) * 255 / u64::from(w.max(1))) as u8;
            let g = (u64::from(y) * 255 / u64::from(h.max(1))) as u8;
            let a = if has_mask && x < w / 2 { 128 } else { 255 };
            Rgba([r, g, blue, a])
        })
    }
}

impl MediaSource for SyntheticSource {
    fn info(&self) -> MediaInfo {
        self.current().clone()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn frame_at(&mut self, time_secs: f64) -> Result<RawImage, VideoError> {
        if self.closed {
            return Err(VideoError::Closed);
        }
        let duration = self.current().duration_secs;
        if !time_secs.is_finite() || time_secs < 0.0 || time_secs > duration {
            return Err(VideoError::TimeOutOfRange {
                time_secs,
                duration_secs: duration,
            });
        }

        // Walk back through the edits to find the raw clip time, remembering
        // the local time at the output of every stage.
        let mut stage_times = vec![0.0; self.ops.len()];
        let mut time = time_secs;
        for (i, op) in self.ops.iter().enumerate().rev() {
            stage_times[i] = time;
            time = op.source_time(time);
        }

        let index = (time * self.clip.fps + 1e-9).floor().max(0.0) as usize;
        if self.clip.failing_frames.contains(&index) {
            return Err(VideoError::DecodingFailed(format!(
                "synthetic frame {index} is marked as failing"
            )));
        }

        let mut image = DynamicImage::ImageRgba8(self.base_frame(index));
        for (i, op) in self.ops.iter().enumerate() {
            image = apply_pixels(image, op, stage_times[i], &self.stages[i + 1]);
        }
        Ok(from_rgba_image(image.to_rgba8()))
    }

    fn apply(&self, transform: &Transform) -> Result<Box<dyn MediaSource>, VideoError> {
        if self.closed {
            return Err(VideoError::Closed);
        }
        if let Transform::Crop(rect) = transform {
            let info = self.current();
            if u64::from(rect.x) + u64::from(rect.width) > u64::from(info.width)
                || u64::from(rect.y) + u64::from(rect.height) > u64::from(info.height)
            {
                return Err(VideoError::TransformFailed(format!(
                    "crop {rect:?} exceeds {}x{} frame",
                    info.width, info.height
                )));
            }
        }
        let mut next = self.clone();
        next.push(transform.clone());
        Ok(Box::new(next))
    }

    fn extract_audio(&self, dest: &Path) -> Result<(), VideoError> {
        let info = self.current();
        if !info.has_audio {
            return Err(VideoError::NoAudioStream);
        }
        let names: Vec<&str> = self.ops.iter().map(Transform::name).collect();
        let mut track = String::new();
        let _ = writeln!(track, "{AUDIO_TRACK_HEADER}");
        let _ = writeln!(track, "duration_ms={}", info.duration_ms());
        let _ = writeln!(track, "transforms={}", names.join(","));
        fs::write(dest, track)?;
        Ok(())
    }

    fn duplicate(&self) -> Result<Box<dyn MediaSource>, VideoError> {
        if self.closed {
            return Err(VideoError::Closed);
        }
        Ok(Box::new(self.clone()))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Applies one edit to a decoded frame. `time_secs` and `info` describe the
/// stage the edit produces.
fn apply_pixels(image: DynamicImage, op: &Transform, time_secs: f64, info: &MediaInfo) -> DynamicImage {
    match *op {
        Transform::Crop(rect) => image.crop_imm(rect.x, rect.y, rect.width, rect.height),
        Transform::Rotate { degrees } => rotate(&image, degrees, info.size()),
        Transform::Resize(_) => {
            image.resize_exact(info.width.max(1), info.height.max(1), FilterType::Triangle)
        }
        Transform::Grayscale => DynamicImage::ImageRgba8(image.grayscale().to_rgba8()),
        Transform::Mirror(Axis::X) => image.fliph(),
        Transform::Mirror(Axis::Y) => image.flipv(),
        Transform::InvertColors => {
            let mut image = image;
            image.invert();
            image
        }
        Transform::Fade {
            direction,
            duration_secs,
        } => {
            let factor = fade_factor(direction, duration_secs, time_secs, info.duration_secs);
            scale_color(image, factor)
        }
        Transform::Speed(_) | Transform::Fps(_) | Transform::Trim { .. } => image,
    }
}

fn fade_factor(direction: FadeDirection, fade_secs: f64, time_secs: f64, clip_secs: f64) -> f64 {
    if fade_secs <= 0.0 {
        return 1.0;
    }
    let progress = match direction {
        FadeDirection::In => time_secs / fade_secs,
        FadeDirection::Out => (clip_secs - time_secs) / fade_secs,
    };
    progress.clamp(0.0, 1.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_color(image: DynamicImage, factor: f64) -> DynamicImage {
    if factor >= 1.0 {
        return image;
    }
    let mut buffer = image.to_rgba8();
    for px in buffer.pixels_mut() {
        for channel in &mut px.0[..3] {
            *channel = (f64::from(*channel) * factor).round() as u8;
        }
    }
    DynamicImage::ImageRgba8(buffer)
}

/// Counter-clockwise rotation into the bounding box `size`.
///
/// Right angles are exact; other angles use nearest-neighbour sampling and
/// leave uncovered corners transparent.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn rotate(image: &DynamicImage, degrees: f64, size: Size) -> DynamicImage {
    let normalized = degrees.rem_euclid(360.0);
    if normalized == 0.0 {
        return image.clone();
    }
    if normalized == 90.0 {
        return image.rotate270();
    }
    if normalized == 180.0 {
        return image.rotate180();
    }
    if normalized == 270.0 {
        return image.rotate90();
    }

    let src = image.to_rgba8();
    let (sw, sh) = (f64::from(src.width()), f64::from(src.height()));
    let (dw, dh) = (f64::from(size.width), f64::from(size.height));
    let (sin, cos) = normalized.to_radians().sin_cos();

    let out = RgbaImage::from_fn(size.width, size.height, |x, y| {
        // Inverse-map the destination pixel centre into the source.
        let dx = f64::from(x) + 0.5 - dw / 2.0;
        let dy = f64::from(y) + 0.5 - dh / 2.0;
        let sx = cos * dx - sin * dy + sw / 2.0;
        let sy = sin * dx + cos * dy + sh / 2.0;
        if sx < 0.0 || sy < 0.0 || sx >= sw || sy >= sh {
            return Rgba([0, 0, 0, 0]);
        }
        *src.get_pixel(sx as u32, sy as u32)
    });
    DynamicImage::ImageRgba8(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::media::Rect;
    use tempfile::tempdir;

    fn clip() -> SyntheticClip {
        SyntheticClip::new(64, 48, 30.0, 10.0)
    }

    fn blue_at(source: &mut SyntheticSource, time: f64) -> u8 {
        let frame = source.frame_at(time).expect("frame");
        frame.pixel(0, 0).expect("pixel")[2]
    }

    #[test]
    fn frames_encode_their_index() {
        let mut source = clip().open();
        assert_eq!(blue_at(&mut source, 0.0), 0);
        assert_eq!(blue_at(&mut source, 1.0), 30);
        assert_eq!(blue_at(&mut source, 5.0), 150);
    }

    #[test]
    fn time_outside_clip_is_rejected() {
        let mut source = clip().open();
        assert!(matches!(
            source.frame_at(10.5),
            Err(VideoError::TimeOutOfRange { .. })
        ));
        assert!(source.frame_at(-0.1).is_err());
    }

    #[test]
    fn failing_frames_fail_to_decode() {
        let mut source = clip().with_failing_frames([3]).open();
        assert!(source.frame_at(2.0 / 30.0).is_ok());
        assert!(matches!(
            source.frame_at(3.0 / 30.0),
            Err(VideoError::DecodingFailed(_))
        ));
    }

    #[test]
    fn speed_maps_time_back_to_source() {
        let source = clip().open();
        let mut fast = source.apply(&Transform::Speed(2.0)).expect("speed");
        assert!((fast.info().duration_secs - 5.0).abs() < 1e-9);
        let frame = fast.frame_at(1.0).expect("frame");
        assert_eq!(frame.pixel(0, 0).map(|px| px[2]), Some(60));
    }

    #[test]
    fn apply_leaves_original_untouched() {
        let source = clip().open();
        let cropped = source
            .apply(&Transform::Crop(Rect::new(0, 0, 16, 16)))
            .expect("crop");
        assert_eq!(cropped.info().size(), Size::new(16, 16));
        assert_eq!(source.info().size(), Size::new(64, 48));
        assert!(source.transforms().is_empty());
    }

    #[test]
    fn crop_outside_frame_fails() {
        let source = clip().open();
        let result = source.apply(&Transform::Crop(Rect::new(60, 0, 16, 16)));
        assert!(matches!(result, Err(VideoError::TransformFailed(_))));
    }

    #[test]
    fn pixel_size_follows_metadata_after_rotation() {
        let source = clip().open();
        for degrees in [90.0, 30.0, -45.0] {
            let mut rotated = source.apply(&Transform::Rotate { degrees }).expect("rotate");
            let info = rotated.info();
            let frame = rotated.frame_at(0.0).expect("frame");
            assert_eq!(frame.size(), info.size(), "rotation by {degrees}");
        }
    }

    #[test]
    fn invert_and_grayscale_change_pixels() {
        let source = clip().open();
        let mut inverted = source.apply(&Transform::InvertColors).expect("invert");
        let px = inverted.frame_at(0.0).expect("frame").pixel(0, 0);
        assert_eq!(px, Some([255, 255, 255, 255]));

        let mut gray = source.apply(&Transform::Grayscale).expect("gray");
        let px = gray.frame_at(1.0).expect("frame").pixel(63, 47).expect("pixel");
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }

    #[test]
    fn fade_in_starts_black() {
        let source = clip().open();
        let mut faded = source
            .apply(&Transform::Fade {
                direction: FadeDirection::In,
                duration_secs: 1.0,
            })
            .expect("fade");
        let first = faded.frame_at(0.0).expect("frame");
        assert_eq!(first.pixel(63, 47).map(|px| [px[0], px[1]]), Some([0, 0]));
        let later = faded.frame_at(2.0).expect("frame");
        assert_ne!(later.pixel(63, 47).map(|px| px[0]), Some(0));
    }

    #[test]
    fn extract_audio_writes_duration() {
        let dir = tempdir().expect("tempdir");
        let dest = dir.path().join("track.mp3");
        let source = clip().open();
        source.extract_audio(&dest).expect("extract");
        let content = fs::read_to_string(&dest).expect("read");
        assert!(content.starts_with(AUDIO_TRACK_HEADER));
        assert!(content.contains("duration_ms=10000"));
    }

    #[test]
    fn extract_audio_without_track_fails() {
        let dir = tempdir().expect("tempdir");
        let source = clip().without_audio().open();
        assert!(matches!(
            source.extract_audio(&dir.path().join("x.mp3")),
            Err(VideoError::NoAudioStream)
        ));
    }

    #[test]
    fn closed_source_refuses_frames() {
        let mut source = clip().open();
        source.close();
        assert!(matches!(source.frame_at(0.0), Err(VideoError::Closed)));
        assert!(source.duplicate().is_err());
    }

    #[test]
    fn decoder_opens_registered_clips_only() {
        let decoder = SyntheticDecoder::new().with_clip("demo.mp4", clip());
        let options = OpenOptions {
            has_mask: false,
            target_resolution: Some(Size::new(32, 24)),
        };
        let source = decoder.open(Path::new("demo.mp4"), &options).expect("open");
        assert_eq!(source.info().size(), Size::new(32, 24));
        assert_eq!(source.info().filename, Some(PathBuf::from("demo.mp4")));

        assert!(decoder
            .open(Path::new("missing.mp4"), &OpenOptions::default())
            .is_err());
    }
}
