// SPDX-License-Identifier: MPL-2.0
//! Simulated audio output channel.
//!
//! Loads the text tracks written by the synthetic decoder and reports a
//! playback position driven either by a manual clock (tests advance it
//! explicitly) or by the wall clock (the demo binary).
//!
//! The channel is a cheap `Clone` handle: keep one clone to drive and inspect
//! the channel while the session owns another.

use crate::application::port::AudioChannel;
use crate::domain::error::AudioError;
use crate::domain::video::Volume;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

#[derive(Debug)]
enum Clock {
    Manual { now_ms: f64 },
    Wall { origin: Instant },
}

impl Clock {
    fn now_ms(&self) -> f64 {
        match self {
            Self::Manual { now_ms } => *now_ms,
            Self::Wall { origin } => origin.elapsed().as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Status {
    Idle,
    Playing { since_ms: f64, start_ms: f64 },
    Paused { elapsed_ms: f64, start_ms: f64 },
    /// Ran to the end, or was forced there with [`SimulatedAudioChannel::finish`].
    Finished,
}

#[derive(Debug)]
struct ChannelState {
    clock: Clock,
    track: Option<PathBuf>,
    track_ms: f64,
    status: Status,
    volume: Volume,
    play_calls: usize,
}

impl ChannelState {
    /// Resolves a playing track that reached its end.
    fn settle(&mut self) {
        if let Status::Playing { since_ms, start_ms } = self.status {
            if start_ms + (self.clock.now_ms() - since_ms) >= self.track_ms {
                self.status = Status::Finished;
            }
        }
    }
}

/// In-memory [`AudioChannel`] for tests and headless runs.
#[derive(Debug, Clone)]
pub struct SimulatedAudioChannel {
    inner: Arc<Mutex<ChannelState>>,
}

impl SimulatedAudioChannel {
    /// Channel whose time only moves through [`advance`](Self::advance).
    #[must_use]
    pub fn manual() -> Self {
        Self::with_clock(Clock::Manual { now_ms: 0.0 })
    }

    /// Channel following real time.
    #[must_use]
    pub fn wall_clock() -> Self {
        Self::with_clock(Clock::Wall {
            origin: Instant::now(),
        })
    }

    fn with_clock(clock: Clock) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChannelState {
                clock,
                track: None,
                track_ms: 0.0,
                status: Status::Idle,
                volume: Volume::default(),
                play_calls: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, ChannelState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves the manual clock forward. No effect on a wall clock.
    pub fn advance(&self, ms: f64) {
        let mut state = self.state();
        if let Clock::Manual { now_ms } = &mut state.clock {
            *now_ms += ms.max(0.0);
        }
    }

    /// Ends the current track as if it had played to completion.
    pub fn finish(&self) {
        let mut state = self.state();
        if matches!(state.status, Status::Playing { .. } | Status::Paused { .. }) {
            state.status = Status::Finished;
        }
    }

    /// Path of the loaded track.
    #[must_use]
    pub fn loaded_track(&self) -> Option<PathBuf> {
        self.state().track.clone()
    }

    /// Duration of the loaded track in milliseconds.
    #[must_use]
    pub fn track_duration_ms(&self) -> f64 {
        self.state().track_ms
    }

    /// Number of `play` calls since creation.
    #[must_use]
    pub fn play_count(&self) -> usize {
        self.state().play_calls
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        matches!(self.state().status, Status::Paused { .. })
    }

    /// Start offset of the last `play` call, in milliseconds.
    #[must_use]
    pub fn start_ms(&self) -> Option<f64> {
        match self.state().status {
            Status::Playing { start_ms, .. } | Status::Paused { start_ms, .. } => Some(start_ms),
            Status::Idle | Status::Finished => None,
        }
    }
}

/// Parses the `duration_ms=` line of a synthetic track.
fn parse_track_duration(content: &str) -> Option<f64> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("duration_ms="))
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|ms| ms.is_finite() && *ms >= 0.0)
}

impl AudioChannel for SimulatedAudioChannel {
    fn load(&mut self, path: &Path) -> Result<(), AudioError> {
        let content = fs::read_to_string(path)?;
        let track_ms = parse_track_duration(&content).ok_or_else(|| {
            AudioError::InvalidTrack(format!("{} has no duration", path.display()))
        })?;
        let mut state = self.state();
        state.track = Some(path.to_path_buf());
        state.track_ms = track_ms;
        state.status = Status::Idle;
        Ok(())
    }

    fn play(&mut self, start_secs: f64) -> Result<(), AudioError> {
        let mut state = self.state();
        if state.track.is_none() {
            return Err(AudioError::NoTrackLoaded);
        }
        let since_ms = state.clock.now_ms();
        state.status = Status::Playing {
            since_ms,
            start_ms: start_secs.max(0.0) * 1000.0,
        };
        state.play_calls += 1;
        state.settle();
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = self.state();
        state.settle();
        if let Status::Playing { since_ms, start_ms } = state.status {
            let elapsed_ms = state.clock.now_ms() - since_ms;
            state.status = Status::Paused {
                elapsed_ms,
                start_ms,
            };
        }
    }

    fn unpause(&mut self) {
        let mut state = self.state();
        if let Status::Paused {
            elapsed_ms,
            start_ms,
        } = state.status
        {
            let since_ms = state.clock.now_ms() - elapsed_ms;
            state.status = Status::Playing { since_ms, start_ms };
        }
    }

    fn stop(&mut self) {
        self.state().status = Status::Idle;
    }

    fn unload(&mut self) {
        let mut state = self.state();
        state.status = Status::Idle;
        state.track = None;
        state.track_ms = 0.0;
    }

    fn position_ms(&self) -> Option<f64> {
        let mut state = self.state();
        state.settle();
        match state.status {
            Status::Playing { since_ms, .. } => Some(state.clock.now_ms() - since_ms),
            Status::Paused { elapsed_ms, .. } => Some(elapsed_ms),
            Status::Idle | Status::Finished => None,
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.state().volume = Volume::new(volume);
    }

    fn volume(&self) -> f32 {
        self.state().volume.value()
    }

    fn is_busy(&self) -> bool {
        let mut state = self.state();
        state.settle();
        matches!(state.status, Status::Playing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_relative_eq;
    use tempfile::tempdir;

    fn track(dir: &Path, ms: f64) -> PathBuf {
        let path = dir.join("track.mp3");
        fs::write(&path, format!("vidsync-synthetic-audio\nduration_ms={ms}\n")).expect("write");
        path
    }

    #[test]
    fn play_without_track_fails() {
        let mut channel = SimulatedAudioChannel::manual();
        assert!(matches!(channel.play(0.0), Err(AudioError::NoTrackLoaded)));
    }

    #[test]
    fn position_follows_manual_clock() {
        let dir = tempdir().expect("tempdir");
        let mut channel = SimulatedAudioChannel::manual();
        channel.load(&track(dir.path(), 10_000.0)).expect("load");
        assert_eq!(channel.position_ms(), None);

        channel.play(0.0).expect("play");
        channel.advance(250.0);
        assert_relative_eq!(channel.position_ms().unwrap_or_default(), 250.0);
        assert!(channel.is_busy());
    }

    #[test]
    fn position_is_relative_to_play_start() {
        let dir = tempdir().expect("tempdir");
        let mut channel = SimulatedAudioChannel::manual();
        channel.load(&track(dir.path(), 10_000.0)).expect("load");
        channel.play(4.0).expect("play");
        channel.advance(1000.0);
        assert_relative_eq!(channel.position_ms().unwrap_or_default(), 1000.0);
        assert_eq!(channel.start_ms(), Some(4000.0));

        channel.advance(5000.0);
        assert_eq!(channel.position_ms(), None);
        assert!(!channel.is_busy());
    }

    #[test]
    fn pause_freezes_position() {
        let dir = tempdir().expect("tempdir");
        let mut channel = SimulatedAudioChannel::manual();
        channel.load(&track(dir.path(), 10_000.0)).expect("load");
        channel.play(0.0).expect("play");
        channel.advance(300.0);
        channel.pause();
        channel.advance(1000.0);
        assert_relative_eq!(channel.position_ms().unwrap_or_default(), 300.0);
        assert!(!channel.is_busy());

        channel.unpause();
        channel.advance(100.0);
        assert_relative_eq!(channel.position_ms().unwrap_or_default(), 400.0);
    }

    #[test]
    fn finish_and_stop_report_sentinel() {
        let dir = tempdir().expect("tempdir");
        let mut channel = SimulatedAudioChannel::manual();
        channel.load(&track(dir.path(), 10_000.0)).expect("load");
        channel.play(0.0).expect("play");
        channel.finish();
        assert_eq!(channel.position_ms(), None);

        channel.play(0.0).expect("play");
        channel.stop();
        assert_eq!(channel.position_ms(), None);
        assert_eq!(channel.play_count(), 2);
    }

    #[test]
    fn load_rejects_tracks_without_duration() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("bad.mp3");
        fs::write(&path, "garbage").expect("write");
        let mut channel = SimulatedAudioChannel::manual();
        assert!(matches!(channel.load(&path), Err(AudioError::InvalidTrack(_))));
        assert!(matches!(
            channel.load(&dir.path().join("missing.mp3")),
            Err(AudioError::Io(_))
        ));
    }

    #[test]
    fn volume_is_clamped_and_shared_between_clones() {
        let mut channel = SimulatedAudioChannel::manual();
        let observer = channel.clone();
        channel.set_volume(3.0);
        assert_relative_eq!(observer.volume(), 1.0);
        channel.set_volume(0.25);
        assert_relative_eq!(observer.volume(), 0.25);
    }

    #[test]
    fn unload_forgets_track() {
        let dir = tempdir().expect("tempdir");
        let mut channel = SimulatedAudioChannel::manual();
        channel.load(&track(dir.path(), 1000.0)).expect("load");
        assert!(channel.loaded_track().is_some());
        channel.unload();
        assert!(channel.loaded_track().is_none());
        assert!(channel.play(0.0).is_err());
    }
}
