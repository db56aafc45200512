// SPDX-License-Identifier: MPL-2.0
//! Audio output channel port.
//!
//! There is a single output channel per [`PlaybackSession`](crate::video_player::PlaybackSession);
//! it plays one track file at a time and reports how far playback has
//! progressed since the last `play` call.

use crate::domain::error::AudioError;
use std::path::Path;

/// Port for the shared audio output channel.
pub trait AudioChannel: Send {
    /// Loads a track file, replacing the current one.
    ///
    /// # Errors
    ///
    /// Returns an [`AudioError`] if the file cannot be read or decoded.
    fn load(&mut self, path: &Path) -> Result<(), AudioError>;

    /// Starts the loaded track at `start_secs`, restarting if already playing.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::NoTrackLoaded`] if nothing is loaded.
    fn play(&mut self, start_secs: f64) -> Result<(), AudioError>;

    fn pause(&mut self);

    fn unpause(&mut self);

    fn stop(&mut self);

    /// Stops and forgets the loaded track, releasing the file.
    fn unload(&mut self);

    /// Milliseconds played since the last `play` call.
    ///
    /// `None` is the "not playing" sentinel: nothing started, stopped, or the
    /// track ran to its end. While paused the frozen position is returned.
    fn position_ms(&self) -> Option<f64>;

    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;

    /// True while the track is audibly playing (not paused, not finished).
    fn is_busy(&self) -> bool;
}
