// SPDX-License-Identifier: MPL-2.0
//! Playback instances and their state machine.
//!
//! A [`Playback`] wraps one clip. The shared audio channel of its
//! [`PlaybackSession`] is the master clock: once per host tick
//! [`Playback::advance_and_render`] reads the channel position, picks the
//! matching frame (cached or freshly decoded) and optionally blits it onto a
//! target surface.
//!
//! ```text
//! NotReady ──prepare──▶ Stopped ──play──▶ Playing ◀─pause/unpause─▶ Paused
//!    ▲                     ▲                 │                         │
//!    └──────release────────┴──────stop───────┴─────────────────────────┘
//! any ──quit──▶ Quit
//! ```
//!
//! The audio channel only ever plays one track; the session hands it to the
//! instance that prepared first and refuses the others until it is released.

use super::audio_clock::{frame_index_for, ClockReading};
use super::frame_cache::{CacheConfig, FrameCache};
use super::session::{PlaybackId, PlaybackSession};
use super::temp_audio::{TempAudioNaming, TempAudioTrack};
use crate::application::port::{AudioChannel, MediaDecoder, MediaSource, Presenter};
use crate::config::PlaybackConfig;
use crate::domain::error::AudioError;
use crate::domain::media::{MediaInfo, Point, RawImage, Size};
use crate::domain::video::{Alpha, Loops, PlaybackPosition, PlaybackState, Volume};
use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::ops::{Bound, RangeBounds};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Unit for [`Playback::file_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileSizeUnit {
    #[default]
    Bytes,
    Kilobytes,
    Megabytes,
    Gigabytes,
}

impl FileSizeUnit {
    fn divisor(self) -> f64 {
        match self {
            Self::Bytes => 1.0,
            Self::Kilobytes => 1024.0,
            Self::Megabytes => 1024.0 * 1024.0,
            Self::Gigabytes => 1024.0 * 1024.0 * 1024.0,
        }
    }
}

/// Right-hand side of [`Playback::compare_duration`].
#[derive(Clone, Copy)]
pub enum DurationOperand<'a> {
    /// A duration in milliseconds.
    Millis(f64),
    /// Any decodable clip.
    Source(&'a dyn MediaSource),
    /// Another playback instance (or the same one).
    Playback(&'a Playback),
}

impl From<f64> for DurationOperand<'_> {
    fn from(millis: f64) -> Self {
        Self::Millis(millis)
    }
}

impl<'a> From<&'a Playback> for DurationOperand<'a> {
    fn from(playback: &'a Playback) -> Self {
        Self::Playback(playback)
    }
}

/// State shared between a [`Playback`] handle and its session.
pub(crate) struct PlaybackCore {
    pub(super) id: PlaybackId,
    pub(super) session: PlaybackSession,
    pub(super) config: PlaybackConfig,
    presenter: Arc<dyn Presenter>,
    pub(super) source: Box<dyn MediaSource>,
    pub(super) original: Box<dyn MediaSource>,
    pub(super) info: MediaInfo,
    pub(super) cache: FrameCache,
    pub(super) temp_audio: TempAudioTrack,
    quit: bool,
    pub(super) ready: bool,
    playing: bool,
    paused: bool,
    loops: Loops,
    loops_completed: u32,
    frame_index: usize,
    audio_offset_ms: f64,
    /// Volume to restore on unmute; `Some` while muted.
    saved_volume: Option<f32>,
    pub(super) alpha: Alpha,
    pub(super) size: Option<Size>,
}

impl PlaybackCore {
    pub(super) fn ensure_initialized(&self) -> Result<()> {
        if self.quit {
            Err(Error::NotInitialized)
        } else {
            Ok(())
        }
    }

    pub(super) fn ensure_ready(&self) -> Result<()> {
        self.ensure_initialized()?;
        if self.ready {
            Ok(())
        } else {
            Err(Error::NotReady)
        }
    }

    fn channel<R>(&self, f: impl FnOnce(&mut dyn AudioChannel) -> R) -> R {
        self.session.with_channel(f)
    }

    pub(super) fn assign_temp_audio_name(&mut self) {
        if self.temp_audio.path().is_none() {
            let path = self
                .session
                .reserve_temp_audio(self.id, self.temp_audio.naming());
            self.temp_audio.assign(path);
        }
    }

    /// Reserves a track name if needed and writes the track if it is missing.
    pub(super) fn ensure_temp_audio(&mut self) -> Result<PathBuf> {
        self.assign_temp_audio_name();
        if !self.temp_audio.is_present() {
            let path = self.temp_audio.extract(self.source.as_ref())?;
            tracing::info!(id = %self.id, path = %path.display(), "temp audio extracted");
        }
        self.temp_audio
            .path()
            .map(Path::to_path_buf)
            .ok_or(Error::NotReady)
    }

    pub(super) fn prepare(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        if self.ready {
            return Ok(());
        }
        self.session.check_available(self.id)?;
        if !self.info.has_audio {
            return Err(Error::NoAudio);
        }

        let track = self.ensure_temp_audio()?;
        self.session.acquire(self.id)?;
        if let Err(err) = self.channel(|channel| channel.load(&track)) {
            self.session.release_token(self.id);
            return Err(err.into());
        }

        self.ready = true;
        self.loops_completed = 0;
        self.session.set_ready(self.id, true);
        tracing::info!(id = %self.id, track = %track.display(), "playback prepared");
        Ok(())
    }

    pub(super) fn release(&mut self) {
        if !self.ready {
            return;
        }
        self.halt();
        self.ready = false;
        self.channel(|channel| channel.unload());
        self.session.release_token(self.id);
        self.session.set_ready(self.id, false);
        tracing::info!(id = %self.id, "playback released");
    }

    /// Resets the playing state and stops the channel. No-op unless playing.
    pub(super) fn halt(&mut self) {
        if !self.playing {
            return;
        }
        self.playing = false;
        self.paused = false;
        self.frame_index = 0;
        self.audio_offset_ms = 0.0;
        self.channel(|channel| channel.stop());
    }

    /// Playing from the caller's point of view: paused counts as playing,
    /// otherwise the channel must still be busy.
    pub(super) fn is_playing(&self) -> bool {
        if self.paused {
            return self.playing;
        }
        if !self.ready {
            return false;
        }
        self.playing && self.channel(|channel| channel.is_busy())
    }

    fn check_position(&self, secs: f64) -> Result<f64> {
        let value_ms = secs * 1000.0;
        let duration_ms = self.info.duration_ms();
        if value_ms.is_finite() && (0.0..=duration_ms).contains(&value_ms) {
            Ok(value_ms)
        } else {
            Err(Error::OutOfRange {
                value_ms,
                duration_ms,
            })
        }
    }

    pub(super) fn play(&mut self, loops: i32, start_secs: f64) -> Result<()> {
        self.ensure_ready()?;
        let loops =
            Loops::new(loops).ok_or_else(|| Error::invalid("loops", "an integer >= -1", loops))?;
        let offset_ms = self.check_position(start_secs)?;
        if self.is_playing() {
            return Ok(());
        }

        self.channel(|channel| channel.play(start_secs))?;
        self.playing = true;
        self.loops = loops;
        self.frame_index = 0;
        self.audio_offset_ms = offset_ms;
        tracing::debug!(id = %self.id, loops = loops.value(), start_secs, "playback started");
        Ok(())
    }

    pub(super) fn stop(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.halt();
        Ok(())
    }

    pub(super) fn pause(&mut self) -> Result<()> {
        self.ensure_ready()?;
        if !self.playing || self.paused {
            return Ok(());
        }
        self.paused = true;
        self.channel(|channel| channel.pause());
        Ok(())
    }

    pub(super) fn unpause(&mut self) -> Result<()> {
        self.ensure_ready()?;
        if !self.paused {
            return Ok(());
        }
        self.paused = false;
        self.channel(|channel| channel.unpause());
        Ok(())
    }

    pub(super) fn set_position(&mut self, secs: f64) -> Result<()> {
        self.ensure_ready()?;
        let value_ms = self.check_position(secs)?;
        let paused = self.paused;
        self.channel(|channel| -> std::result::Result<(), AudioError> {
            channel.pause();
            channel.play(secs)?;
            if paused {
                channel.pause();
            }
            Ok(())
        })?;
        if !self.playing {
            // Seeking from Stopped starts a single playthrough
            self.loops = Loops::ONCE;
            self.frame_index = 0;
            self.playing = true;
        }
        self.audio_offset_ms = value_ms;
        Ok(())
    }

    fn current_position_ms(&self) -> f64 {
        match self.position() {
            Ok(PlaybackPosition::At(ms)) => ms,
            _ => 0.0,
        }
    }

    pub(super) fn forward(&mut self, distance_secs: f64) -> Result<()> {
        self.ensure_ready()?;
        check_distance(distance_secs)?;
        let target_ms = (self.current_position_ms() + distance_secs * 1000.0)
            .min(self.info.duration_ms());
        self.set_position(target_ms / 1000.0)
    }

    pub(super) fn rewind(&mut self, distance_secs: f64) -> Result<()> {
        self.ensure_ready()?;
        check_distance(distance_secs)?;
        let target_ms = (self.current_position_ms() - distance_secs * 1000.0).max(0.0);
        self.set_position(target_ms / 1000.0)
    }

    pub(super) fn position(&self) -> Result<PlaybackPosition> {
        self.ensure_initialized()?;
        if !self.ready {
            return Ok(PlaybackPosition::NotReady);
        }
        if !self.playing {
            return Ok(PlaybackPosition::NotPlaying);
        }
        let duration_ms = self.info.duration_ms();
        if self.is_playing() {
            let reading = self.channel(|channel| ClockReading::read(channel));
            let ms = match reading {
                ClockReading::Elapsed(elapsed) => self.audio_offset_ms + elapsed,
                ClockReading::Finished => duration_ms,
            };
            Ok(PlaybackPosition::At(ms))
        } else {
            Ok(PlaybackPosition::At(duration_ms))
        }
    }

    pub(super) fn advance_and_render(
        &mut self,
        target: Option<&mut RawImage>,
        at: Point,
    ) -> Result<RawImage> {
        self.ensure_initialized()?;
        if !self.playing {
            return Err(Error::NotPlaying);
        }

        let reading = self.channel(|channel| ClockReading::read(channel));
        let total = self.info.frame_count();
        self.frame_index = frame_index_for(reading, self.audio_offset_ms, self.info.fps, total);

        let mut finished = false;
        if !self.is_playing() {
            if self.loops.is_exhausted() {
                finished = true;
            } else {
                let remaining = self.loops.next();
                self.audio_offset_ms = 0.0;
                self.loops_completed += 1;
                self.stop()?;
                self.play(remaining.value(), 0.0)?;
                tracing::debug!(
                    id = %self.id,
                    loops_completed = self.loops_completed,
                    remaining = remaining.value(),
                    "loop restarted"
                );
            }
        }

        let image = match self.resolve_frame(self.frame_index) {
            Some(frame) => self.scaled(frame),
            None => RawImage::blank(self.size.unwrap_or_else(|| self.info.size())),
        };
        let image = self.presenter.set_alpha(&image, self.alpha);
        if let Some(target) = target {
            self.presenter.blit(target, &image, at);
        }

        if finished {
            self.halt();
            tracing::info!(id = %self.id, loops_completed = self.loops_completed, "playback finished");
        }
        Ok(image)
    }

    /// Cached or freshly decoded frame; `None` past the end or on failure.
    fn resolve_frame(&mut self, index: usize) -> Option<RawImage> {
        if index >= self.info.frame_count() {
            return None;
        }
        if let Some(frame) = self.cache.get(index) {
            return Some(frame);
        }
        match self.source.frame_at(self.info.frame_time(index)) {
            Ok(frame) => {
                self.cache.put(index, frame.clone());
                Some(frame)
            }
            Err(err) => {
                tracing::debug!(id = %self.id, index, error = %err, "frame unavailable, drawing blank");
                None
            }
        }
    }

    fn scaled(&self, frame: RawImage) -> RawImage {
        match self.size {
            Some(size) => self.presenter.scale(&frame, size),
            None => frame,
        }
    }

    pub(super) fn frame_at(&mut self, time_secs: f64, original: bool) -> Result<RawImage> {
        self.ensure_initialized()?;
        let frame = self.source.frame_at(time_secs)?;
        if original {
            return Ok(frame);
        }
        Ok(self.presenter.set_alpha(&self.scaled(frame), self.alpha))
    }

    pub(super) fn frame(&mut self, index: i64) -> Result<RawImage> {
        self.ensure_initialized()?;
        let total = self.info.frame_count();
        let resolved = if index < 0 {
            i64::try_from(total).unwrap_or(i64::MAX) + index
        } else {
            index
        };
        let Some(resolved) = usize::try_from(resolved).ok().filter(|&i| i < total) else {
            return Err(Error::IndexOutOfRange { index, len: total });
        };
        self.frame_at(self.info.frame_time(resolved), false)
    }

    pub(super) fn volume(&self) -> Result<f32> {
        self.ensure_ready()?;
        Ok(self.channel(|channel| channel.volume()))
    }

    pub(super) fn set_volume(&mut self, volume: f32, force: bool) -> Result<()> {
        self.ensure_ready()?;
        if volume.is_nan() {
            return Err(Error::invalid("volume", "a number in 0.0..=1.0", volume));
        }
        if self.saved_volume.is_none() || force {
            let volume = Volume::new(volume).value();
            self.channel(|channel| channel.set_volume(volume));
        }
        Ok(())
    }

    pub(super) fn add_volume(&mut self, add: f32, max: f32) -> Result<()> {
        check_volume_step("add", add)?;
        let volume = (self.volume()? + add).min(max);
        self.set_volume(volume, false)
    }

    pub(super) fn sub_volume(&mut self, sub: f32, min: f32) -> Result<()> {
        check_volume_step("sub", sub)?;
        let volume = (self.volume()? - sub).max(min);
        self.set_volume(volume, false)
    }

    pub(super) fn mute(&mut self) -> Result<()> {
        if self.saved_volume.is_some() {
            return Ok(());
        }
        let volume = self.volume()?;
        self.set_volume(0.0, true)?;
        self.saved_volume = Some(volume);
        Ok(())
    }

    pub(super) fn unmute(&mut self) -> Result<()> {
        let Some(volume) = self.saved_volume else {
            return Ok(());
        };
        self.set_volume(volume, true)?;
        self.saved_volume = None;
        Ok(())
    }

    pub(super) fn state(&self) -> PlaybackState {
        if self.quit {
            PlaybackState::Quit
        } else if !self.ready {
            PlaybackState::NotReady
        } else if self.paused {
            PlaybackState::Paused
        } else if self.playing {
            PlaybackState::Playing
        } else {
            PlaybackState::Stopped
        }
    }

    /// Releases everything the instance holds. Idempotent.
    pub(crate) fn quit(&mut self) -> Result<()> {
        if self.quit {
            return Ok(());
        }
        self.cache.clear();
        self.source.close();
        self.original.close();
        self.release();
        let removed = self.temp_audio.remove();
        self.session.set_temp_audio(self.id, None);

        self.quit = true;
        self.playing = false;
        self.paused = false;
        self.ready = false;
        tracing::info!(id = %self.id, "playback quit");
        removed
    }
}

impl Drop for PlaybackCore {
    fn drop(&mut self) {
        if let Err(err) = self.quit() {
            tracing::warn!(id = %self.id, error = %err, "error while dropping playback");
        }
        self.session.forget(self.id);
    }
}

fn check_distance(distance_secs: f64) -> Result<()> {
    if distance_secs.is_finite() && distance_secs >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(
            "distance",
            "a non-negative number of seconds",
            distance_secs,
        ))
    }
}

fn check_volume_step(name: &'static str, step: f32) -> Result<()> {
    if step.is_finite() && step >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(name, "a non-negative number", step))
    }
}

/// A playable clip bound to a [`PlaybackSession`].
///
/// Dropping the handle quits the instance and unregisters it.
pub struct Playback {
    pub(super) core: Arc<Mutex<PlaybackCore>>,
}

impl Playback {
    /// Opens `path` with `decoder` and wraps the clip.
    ///
    /// # Errors
    ///
    /// Returns the decoder's error, or any error of [`Playback::from_source`].
    pub fn open(
        session: &PlaybackSession,
        decoder: &dyn MediaDecoder,
        path: impl AsRef<Path>,
        config: PlaybackConfig,
    ) -> Result<Self> {
        let source = decoder.open(path.as_ref(), &config.open_options())?;
        Self::from_source(session, source, config)
    }

    /// Wraps an already opened clip and registers it with `session`.
    ///
    /// With `load_audio_in_prepare` off the audio track is extracted here
    /// instead of in [`prepare`](Self::prepare).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSource`] for unusable clips, and extraction
    /// errors when the track is written eagerly.
    pub fn from_source(
        session: &PlaybackSession,
        source: Box<dyn MediaSource>,
        config: PlaybackConfig,
    ) -> Result<Self> {
        let info = source.info();
        if let Some(reason) = info.validate() {
            return Err(Error::InvalidSource(reason));
        }
        let original = source.duplicate()?;
        let presenter = session.presenter();
        let cache = FrameCache::new(CacheConfig::from(&config));
        let temp_audio = TempAudioTrack::new(TempAudioNaming::from_config(&config));

        let core = Arc::new_cyclic(|handle| {
            let id = session.register(handle.clone());
            Mutex::new(PlaybackCore {
                id,
                session: session.clone(),
                config,
                presenter,
                source,
                original,
                info,
                cache,
                temp_audio,
                quit: false,
                ready: false,
                playing: false,
                paused: false,
                loops: Loops::ONCE,
                loops_completed: 0,
                frame_index: 0,
                audio_offset_ms: 0.0,
                saved_volume: None,
                alpha: Alpha::OPAQUE,
                size: None,
            })
        });
        let playback = Self { core };

        {
            let mut core = playback.lock();
            let path = core
                .session
                .reserve_temp_audio(core.id, core.temp_audio.naming());
            core.temp_audio.assign(path);
            if !core.config.load_audio_in_prepare {
                core.ensure_temp_audio()?;
            }
            tracing::info!(
                id = %core.id,
                filename = ?core.info.filename,
                fps = core.info.fps,
                duration_secs = core.info.duration_secs,
                "playback created"
            );
        }
        Ok(playback)
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, PlaybackCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn id(&self) -> PlaybackId {
        self.lock().id
    }

    /// Loads the audio track into the session channel.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::ChannelBusy`] while another instance holds the
    /// channel and with [`Error::NoAudio`] for silent clips.
    pub fn prepare(&self) -> Result<&Self> {
        self.lock().prepare()?;
        Ok(self)
    }

    /// Unloads the channel and gives it back to the session. No-op unless
    /// prepared.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`.
    pub fn release(&self) -> Result<&Self> {
        let mut core = self.lock();
        core.ensure_initialized()?;
        core.release();
        Ok(self)
    }

    /// Starts playback at `start_secs`, repeating `loops` more times
    /// (`-1` forever).
    ///
    /// # Errors
    ///
    /// Requires a prepared instance; `loops` below -1 and start times outside
    /// the clip are rejected.
    pub fn play(&self, loops: i32, start_secs: f64) -> Result<&Self> {
        self.lock().play(loops, start_secs)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotReady`] before `prepare`.
    pub fn stop(&self) -> Result<&Self> {
        self.lock().stop()?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotReady`] before `prepare`.
    pub fn pause(&self) -> Result<&Self> {
        self.lock().pause()?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotReady`] before `prepare`.
    pub fn unpause(&self) -> Result<&Self> {
        self.lock().unpause()?;
        Ok(self)
    }

    /// Seeks to `secs`, keeping the paused state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] outside `[0, duration]`, leaving the
    /// instance untouched.
    pub fn set_position(&self, secs: f64) -> Result<&Self> {
        self.lock().set_position(secs)?;
        Ok(self)
    }

    /// Seeks to `ratio` (0.0 to 1.0) of the clip.
    ///
    /// # Errors
    ///
    /// Rejects ratios outside `0.0..=1.0`.
    pub fn jump(&self, ratio: f64) -> Result<&Self> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(Error::invalid("ratio", "a number in 0.0..=1.0", ratio));
        }
        let mut core = self.lock();
        let secs = core.info.duration_secs * ratio;
        core.set_position(secs)?;
        Ok(self)
    }

    /// Seeks forward by `distance_secs`, stopping at the end of the clip.
    ///
    /// # Errors
    ///
    /// Rejects negative distances.
    pub fn forward(&self, distance_secs: f64) -> Result<&Self> {
        self.lock().forward(distance_secs)?;
        Ok(self)
    }

    /// Seeks back by `distance_secs`, stopping at the start of the clip.
    ///
    /// # Errors
    ///
    /// Rejects negative distances.
    pub fn rewind(&self, distance_secs: f64) -> Result<&Self> {
        self.lock().rewind(distance_secs)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`.
    pub fn position(&self) -> Result<PlaybackPosition> {
        self.lock().position()
    }

    /// Resolves the frame for the current audio position.
    ///
    /// The frame is scaled to the display size, given the display alpha and,
    /// if `target` is set, drawn onto it at `at`. Undecodable frames come out
    /// black. When the last loop has run out the frame past the end (black)
    /// is returned and the instance stops.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotPlaying`] unless playing or paused.
    pub fn advance_and_render(&self, target: Option<&mut RawImage>, at: Point) -> Result<RawImage> {
        self.lock().advance_and_render(target, at)
    }

    /// Releases the channel, the clips and the temp audio track.
    ///
    /// # Errors
    ///
    /// Returns I/O errors from deleting the track; the instance is quit
    /// regardless.
    pub fn quit(&self) -> Result<()> {
        self.lock().quit()
    }

    #[must_use]
    pub fn is_quit(&self) -> bool {
        self.lock().quit
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.lock().ready
    }

    /// True while playing or paused, as long as the channel has not run out.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.lock().is_playing()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.lock().state()
    }

    // Volume

    /// # Errors
    ///
    /// Requires a prepared instance.
    pub fn volume(&self) -> Result<f32> {
        self.lock().volume()
    }

    /// Sets the channel volume, clamped to `0.0..=1.0`. Ignored while muted
    /// unless `force` is set.
    ///
    /// # Errors
    ///
    /// Requires a prepared instance.
    pub fn set_volume(&self, volume: f32, force: bool) -> Result<&Self> {
        self.lock().set_volume(volume, force)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Requires a prepared instance and a non-negative `add`.
    pub fn add_volume(&self, add: f32, max: f32) -> Result<&Self> {
        self.lock().add_volume(add, max)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Requires a prepared instance and a non-negative `sub`.
    pub fn sub_volume(&self, sub: f32, min: f32) -> Result<&Self> {
        self.lock().sub_volume(sub, min)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Requires a prepared instance.
    pub fn mute(&self) -> Result<&Self> {
        self.lock().mute()?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Requires a prepared instance.
    pub fn unmute(&self) -> Result<&Self> {
        self.lock().unmute()?;
        Ok(self)
    }

    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.lock().saved_volume.is_some()
    }

    // Display

    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`.
    pub fn set_alpha(&self, alpha: Alpha) -> Result<&Self> {
        let mut core = self.lock();
        core.ensure_initialized()?;
        core.alpha = alpha;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`.
    pub fn alpha(&self) -> Result<Alpha> {
        let core = self.lock();
        core.ensure_initialized()?;
        Ok(core.alpha)
    }

    /// Display size of rendered frames; `None` keeps the clip size.
    ///
    /// # Errors
    ///
    /// Rejects zero-area sizes.
    pub fn set_size(&self, size: Option<Size>) -> Result<&Self> {
        if let Some(size) = size.filter(|size| size.is_empty()) {
            return Err(Error::invalid(
                "size",
                "a non-zero width and height",
                format!("{}x{}", size.width, size.height),
            ));
        }
        let mut core = self.lock();
        core.ensure_initialized()?;
        core.size = size;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`.
    pub fn size(&self) -> Result<Option<Size>> {
        let core = self.lock();
        core.ensure_initialized()?;
        Ok(core.size)
    }

    /// Size of the current (transformed) clip.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`.
    pub fn clip_size(&self) -> Result<Size> {
        let core = self.lock();
        core.ensure_initialized()?;
        Ok(core.info.size())
    }

    /// Size of the clip as opened.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`.
    pub fn original_size(&self) -> Result<Size> {
        let core = self.lock();
        core.ensure_initialized()?;
        Ok(core.original.info().size())
    }

    // Frames

    /// Frame at `time_secs`, display-adjusted unless `original` is set.
    ///
    /// # Errors
    ///
    /// Returns decoder errors as-is.
    pub fn frame_at(&self, time_secs: f64, original: bool) -> Result<RawImage> {
        self.lock().frame_at(time_secs, original)
    }

    /// Frame by index; negative indices count from the end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] outside the clip.
    pub fn frame(&self, index: i64) -> Result<RawImage> {
        self.lock().frame(index)
    }

    /// Frames in `range` (negative bounds count from the end), every `step`.
    ///
    /// Collection stops at the first index past the clip; other failures
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Rejects a zero `step`.
    pub fn frames(&self, range: impl RangeBounds<i64>, step: usize) -> Result<Vec<RawImage>> {
        if step == 0 {
            return Err(Error::invalid("step", "a positive integer", step));
        }
        let step = i64::try_from(step).unwrap_or(i64::MAX);
        let mut core = self.lock();
        core.ensure_initialized()?;

        let total = i64::try_from(core.info.frame_count()).unwrap_or(i64::MAX);
        let resolve = |value: i64| if value < 0 { (total + value).max(0) } else { value };
        let start = match range.start_bound() {
            Bound::Included(&value) => resolve(value),
            Bound::Excluded(&value) => resolve(value).saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&value) => resolve(value).saturating_add(1),
            Bound::Excluded(&value) => resolve(value),
            Bound::Unbounded => total,
        };

        let mut frames = Vec::new();
        let mut index = start;
        while index < end {
            match core.frame(index) {
                Ok(frame) => frames.push(frame),
                Err(Error::IndexOutOfRange { .. }) => break,
                Err(err) => tracing::debug!(index, error = %err, "skipping frame"),
            }
            index = index.saturating_add(step);
        }
        Ok(frames)
    }

    /// Iterates over every frame of the clip in order.
    #[must_use]
    pub fn iter_frames(&self) -> FrameIter<'_> {
        let total = self.lock().info.frame_count();
        FrameIter {
            playback: self,
            next: 0,
            total,
        }
    }

    // Metadata

    fn with_info<T>(&self, f: impl FnOnce(&MediaInfo) -> T) -> Result<T> {
        let core = self.lock();
        core.ensure_initialized()?;
        Ok(f(&core.info))
    }

    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`.
    pub fn fps(&self) -> Result<f64> {
        self.with_info(|info| info.fps)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`.
    pub fn duration_ms(&self) -> Result<f64> {
        self.with_info(MediaInfo::duration_ms)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`.
    pub fn start_ms(&self) -> Result<f64> {
        self.with_info(|info| info.start_secs * 1000.0)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`.
    pub fn end_ms(&self) -> Result<f64> {
        self.with_info(|info| info.end_secs() * 1000.0)
    }

    /// `floor(duration * fps)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`.
    pub fn total_frames(&self) -> Result<usize> {
        self.with_info(MediaInfo::frame_count)
    }

    #[must_use]
    pub fn filename(&self) -> Option<PathBuf> {
        self.lock().info.filename.clone()
    }

    /// Size of the underlying file; `None` if there is none or it can't be
    /// read.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn file_size(&self, unit: FileSizeUnit) -> Option<f64> {
        let filename = self.filename()?;
        match fs::metadata(&filename) {
            Ok(metadata) => Some(metadata.len() as f64 / unit.divisor()),
            Err(err) => {
                tracing::debug!(path = %filename.display(), error = %err, "file size unavailable");
                None
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`.
    pub fn loops_completed(&self) -> Result<u32> {
        let core = self.lock();
        core.ensure_initialized()?;
        Ok(core.loops_completed)
    }

    /// Index of the frame drawn by the last tick.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`.
    pub fn frame_index(&self) -> Result<usize> {
        let core = self.lock();
        core.ensure_initialized()?;
        Ok(core.frame_index)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`.
    pub fn cached_frame_count(&self) -> Result<usize> {
        let core = self.lock();
        core.ensure_initialized()?;
        Ok(core.cache.len())
    }

    #[must_use]
    pub fn is_cache_full(&self) -> bool {
        self.lock().cache.is_full()
    }

    #[must_use]
    pub fn temp_audio_path(&self) -> Option<PathBuf> {
        self.lock().temp_audio.path().map(Path::to_path_buf)
    }

    #[must_use]
    pub fn config(&self) -> PlaybackConfig {
        self.lock().config.clone()
    }

    /// Independent instance of the current clip in the same session.
    ///
    /// Display size and alpha are not carried over.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] after `quit`, or the errors of
    /// [`Playback::from_source`].
    pub fn duplicate(&self) -> Result<Self> {
        let (session, source, config) = {
            let core = self.lock();
            core.ensure_initialized()?;
            (
                core.session.clone(),
                core.source.duplicate()?,
                core.config.clone(),
            )
        };
        Self::from_source(&session, source, config)
    }

    /// Compares the clip duration with `other`.
    ///
    /// `None` when either side is NaN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if either instance has quit.
    pub fn compare_duration<'a>(
        &self,
        other: impl Into<DurationOperand<'a>>,
    ) -> Result<Option<Ordering>> {
        let own = self.duration_ms()?;
        let other = match other.into() {
            DurationOperand::Millis(ms) => ms,
            DurationOperand::Source(source) => source.info().duration_ms(),
            DurationOperand::Playback(playback) if Arc::ptr_eq(&playback.core, &self.core) => own,
            DurationOperand::Playback(playback) => playback.duration_ms()?,
        };
        Ok(own.partial_cmp(&other))
    }
}

impl fmt::Display for Playback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.lock();
        match &core.info.filename {
            Some(filename) => write!(f, "<Playback {} \"{}\">", core.id, filename.display()),
            None => write!(f, "<Playback {}>", core.id),
        }
    }
}

impl fmt::Debug for Playback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.lock();
        f.debug_struct("Playback")
            .field("id", &core.id)
            .field("filename", &core.info.filename)
            .field("target_resolution", &core.config.target_resolution)
            .field("has_mask", &core.config.has_mask)
            .field("load_audio_in_prepare", &core.config.load_audio_in_prepare)
            .field("cache", &core.cache)
            .field("state", &core.state())
            .field("loops_completed", &core.loops_completed)
            .finish()
    }
}

/// Iterator over the frames of a [`Playback`], from [`Playback::iter_frames`].
pub struct FrameIter<'a> {
    playback: &'a Playback,
    next: usize,
    total: usize,
}

impl Iterator for FrameIter<'_> {
    type Item = Result<RawImage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let index = i64::try_from(self.next).ok()?;
        self.next += 1;
        Some(self.playback.frame(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<'a> IntoIterator for &'a Playback {
    type Item = Result<RawImage>;
    type IntoIter = FrameIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_frames()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{ImagePresenter, SimulatedAudioChannel, SyntheticClip};
    use crate::test_utils::{assert_abs_diff_eq, MS_EPSILON};
    use tempfile::TempDir;

    struct Fixture {
        session: PlaybackSession,
        channel: SimulatedAudioChannel,
        config: PlaybackConfig,
        _dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().expect("tempdir");
            let channel = SimulatedAudioChannel::manual();
            let session = PlaybackSession::new(channel.clone(), ImagePresenter::new());
            let config = PlaybackConfig {
                temp_dir: Some(dir.path().to_path_buf()),
                ..PlaybackConfig::default()
            };
            Self {
                session,
                channel,
                config,
                _dir: dir,
            }
        }

        fn playback(&self, clip: &SyntheticClip) -> Playback {
            Playback::from_source(&self.session, Box::new(clip.clone().open()), self.config.clone())
                .expect("playback")
        }
    }

    fn ten_second_clip() -> SyntheticClip {
        SyntheticClip::new(16, 9, 30.0, 10.0)
    }

    #[test]
    fn new_instance_is_not_ready() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        assert_eq!(playback.state(), PlaybackState::NotReady);
        assert!(matches!(playback.play(0, 0.0), Err(Error::NotReady)));
        assert_eq!(playback.position().expect("position"), PlaybackPosition::NotReady);
        assert_eq!(playback.total_frames().expect("frames"), 300);
    }

    #[test]
    fn prepare_extracts_and_loads_track() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        assert!(playback
            .temp_audio_path()
            .is_some_and(|path| !path.exists()));

        playback.prepare().expect("prepare");
        let track = playback.temp_audio_path().expect("track");
        assert!(track.exists());
        assert_eq!(fx.channel.loaded_track(), Some(track));
        assert_eq!(playback.state(), PlaybackState::Stopped);
        assert_eq!(fx.session.active(), Some(playback.id()));

        // Idempotent
        playback.prepare().expect("prepare again");
    }

    #[test]
    fn eager_extraction_writes_track_at_construction() {
        let fx = Fixture::new();
        let config = PlaybackConfig {
            load_audio_in_prepare: false,
            ..fx.config.clone()
        };
        let playback =
            Playback::from_source(&fx.session, Box::new(ten_second_clip().open()), config)
                .expect("playback");
        assert!(playback.temp_audio_path().is_some_and(|path| path.exists()));
    }

    #[test]
    fn silent_clip_cannot_prepare() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip().without_audio());
        assert!(matches!(playback.prepare(), Err(Error::NoAudio)));
        assert_eq!(fx.session.active(), None);
    }

    #[test]
    fn play_validates_arguments() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        playback.prepare().expect("prepare");
        assert!(matches!(
            playback.play(-2, 0.0),
            Err(Error::InvalidArgument { name: "loops", .. })
        ));
        assert!(matches!(playback.play(0, 11.0), Err(Error::OutOfRange { .. })));
        assert_eq!(playback.state(), PlaybackState::Stopped);
    }

    #[test]
    fn pause_and_unpause_toggle_state() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        playback.prepare().expect("prepare");

        // Not playing: pause is a no-op
        playback.pause().expect("pause");
        assert!(!playback.is_paused());

        playback.play(0, 0.0).expect("play");
        fx.channel.advance(1000.0);
        playback.pause().expect("pause");
        assert_eq!(playback.state(), PlaybackState::Paused);
        assert!(playback.is_playing());

        fx.channel.advance(3000.0);
        let position = playback.position().expect("position").millis().expect("ms");
        assert_abs_diff_eq!(position, 1000.0, epsilon = MS_EPSILON);

        playback.unpause().expect("unpause");
        assert_eq!(playback.state(), PlaybackState::Playing);
    }

    #[test]
    fn stop_resets_position() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        playback.prepare().expect("prepare").play(0, 2.0).expect("play");
        playback.stop().expect("stop");
        assert_eq!(playback.state(), PlaybackState::Stopped);
        assert_eq!(playback.position().expect("position"), PlaybackPosition::NotPlaying);
        assert!(matches!(
            playback.advance_and_render(None, Point::default()),
            Err(Error::NotPlaying)
        ));
    }

    #[test]
    fn set_position_keeps_pause() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        playback.prepare().expect("prepare").play(0, 0.0).expect("play");
        playback.pause().expect("pause");
        playback.set_position(4.0).expect("seek");

        assert!(fx.channel.is_paused());
        assert!(playback.is_paused());
        let position = playback.position().expect("position").millis().expect("ms");
        assert_abs_diff_eq!(position, 4000.0, epsilon = MS_EPSILON);
    }

    #[test]
    fn seek_from_stopped_plays_once() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        playback.prepare().expect("prepare").play(-1, 0.0).expect("play");
        fx.channel.advance(2000.0);
        playback
            .advance_and_render(None, Point::default())
            .expect("render");
        playback.stop().expect("stop");

        playback.set_position(0.5).expect("seek");
        assert_eq!(playback.state(), PlaybackState::Playing);
        assert_eq!(playback.frame_index().expect("index"), 0);

        fx.channel.finish();
        playback
            .advance_and_render(None, Point::default())
            .expect("render");
        assert_eq!(playback.state(), PlaybackState::Stopped);
        assert_eq!(playback.loops_completed().expect("loops"), 0);
        assert!(matches!(
            playback.advance_and_render(None, Point::default()),
            Err(Error::NotPlaying)
        ));
    }

    #[test]
    fn forward_and_rewind_clamp() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        playback.prepare().expect("prepare").play(0, 8.0).expect("play");

        playback.forward(5.0).expect("forward");
        let at = playback.position().expect("position").millis().expect("ms");
        assert_abs_diff_eq!(at, 10_000.0, epsilon = MS_EPSILON);

        playback.rewind(20.0).expect("rewind");
        let at = playback.position().expect("position").millis().expect("ms");
        assert_abs_diff_eq!(at, 0.0, epsilon = MS_EPSILON);

        assert!(matches!(
            playback.forward(-1.0),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn mute_remembers_volume() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        playback.prepare().expect("prepare");
        playback.set_volume(0.6, false).expect("volume");

        playback.mute().expect("mute");
        assert!(playback.is_muted());
        assert_abs_diff_eq!(playback.volume().expect("volume"), 0.0);

        // Ignored while muted unless forced
        playback.set_volume(0.9, false).expect("volume");
        assert_abs_diff_eq!(playback.volume().expect("volume"), 0.0);

        playback.unmute().expect("unmute");
        assert!(!playback.is_muted());
        assert_abs_diff_eq!(playback.volume().expect("volume"), 0.6, epsilon = 1e-6);
    }

    #[test]
    fn add_and_sub_volume_respect_bounds() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        playback.prepare().expect("prepare");
        playback.set_volume(0.5, false).expect("volume");

        playback.add_volume(0.4, 0.7).expect("add");
        assert_abs_diff_eq!(playback.volume().expect("volume"), 0.7, epsilon = 1e-6);
        playback.sub_volume(0.6, 0.2).expect("sub");
        assert_abs_diff_eq!(playback.volume().expect("volume"), 0.2, epsilon = 1e-6);
        assert!(playback.add_volume(-0.1, 1.0).is_err());
    }

    #[test]
    fn frame_indexing_supports_negative_indices() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        let last = playback.frame(-1).expect("last");
        assert_eq!(last, playback.frame(299).expect("299"));
        assert!(matches!(
            playback.frame(300),
            Err(Error::IndexOutOfRange { index: 300, len: 300 })
        ));
        assert!(matches!(playback.frame(-301), Err(Error::IndexOutOfRange { .. })));
    }

    #[test]
    fn frames_stop_at_end_and_skip_failures() {
        let fx = Fixture::new();
        let clip = SyntheticClip::new(8, 8, 10.0, 1.0).with_failing_frames([3]);
        let playback = fx.playback(&clip);

        let frames = playback.frames(0..20, 1).expect("frames");
        assert_eq!(frames.len(), 9);
        let every_other = playback.frames(.., 2).expect("frames");
        assert_eq!(every_other.len(), 5);
        let tail = playback.frames(-2.., 1).expect("frames");
        assert_eq!(tail.len(), 2);
        assert!(playback.frames(.., 0).is_err());
    }

    #[test]
    fn display_settings_apply_to_frames() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        playback
            .set_size(Some(Size::new(4, 4)))
            .expect("size")
            .set_alpha(Alpha::new(0))
            .expect("alpha");

        let frame = playback.frame_at(0.0, false).expect("frame");
        assert_eq!(frame.size(), Size::new(4, 4));
        assert_eq!(frame.pixel(0, 0).map(|p| p[3]), Some(0));

        let original = playback.frame_at(0.0, true).expect("frame");
        assert_eq!(original.size(), Size::new(16, 9));
        assert!(playback.set_size(Some(Size::new(0, 3))).is_err());
    }

    #[test]
    fn quit_is_terminal_and_idempotent() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        playback.prepare().expect("prepare").play(0, 0.0).expect("play");
        let track = playback.temp_audio_path().expect("track");

        playback.quit().expect("quit");
        playback.quit().expect("quit again");
        assert!(playback.is_quit());
        assert_eq!(playback.state(), PlaybackState::Quit);
        assert!(!track.exists());
        assert_eq!(fx.session.active(), None);
        assert!(!fx.session.is_temp_audio_name_in_use(&track));
        assert!(matches!(playback.prepare(), Err(Error::NotInitialized)));
        assert!(matches!(playback.release(), Err(Error::NotInitialized)));
        assert!(matches!(playback.fps(), Err(Error::NotInitialized)));
        assert!(matches!(playback.frame(0), Err(Error::NotInitialized)));
    }

    #[test]
    fn drop_unregisters_instance() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        playback.prepare().expect("prepare");
        assert_eq!(fx.session.len(), 1);
        drop(playback);
        assert!(fx.session.is_empty());
        assert_eq!(fx.session.active(), None);
    }

    #[test]
    fn duplicate_gets_own_track_name() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        let copy = playback.duplicate().expect("duplicate");
        assert_ne!(playback.id(), copy.id());
        assert_ne!(playback.temp_audio_path(), copy.temp_audio_path());
        assert_eq!(fx.session.len(), 2);
    }

    #[test]
    fn compare_duration_accepts_all_operands() {
        let fx = Fixture::new();
        let long = fx.playback(&ten_second_clip());
        let short = fx.playback(&SyntheticClip::new(8, 8, 10.0, 2.0));
        let source = SyntheticClip::new(8, 8, 10.0, 10.0).open();

        assert_eq!(long.compare_duration(&short).expect("cmp"), Some(Ordering::Greater));
        assert_eq!(long.compare_duration(&long).expect("cmp"), Some(Ordering::Equal));
        assert_eq!(long.compare_duration(20_000.0).expect("cmp"), Some(Ordering::Less));
        assert_eq!(
            long.compare_duration(DurationOperand::Source(&source)).expect("cmp"),
            Some(Ordering::Equal)
        );
        assert_eq!(long.compare_duration(f64::NAN).expect("cmp"), None);
    }

    #[test]
    fn file_size_reports_missing_file_as_none() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        assert_eq!(playback.file_size(FileSizeUnit::Kilobytes), None);
    }

    #[test]
    fn display_is_short_and_debug_is_full() {
        let fx = Fixture::new();
        let playback = fx.playback(&ten_second_clip());
        let short = playback.to_string();
        assert!(short.starts_with("<Playback playback #"));
        let full = format!("{playback:?}");
        assert!(full.contains("load_audio_in_prepare"));
        assert!(full.contains("NotReady"));
    }
}
