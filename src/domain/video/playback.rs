// SPDX-License-Identifier: MPL-2.0
//! Video playback state machine.
//!
//! This module defines the externally observable lifecycle states of a
//! playback instance.

/// Represents the current lifecycle state of a playback instance.
///
/// ```text
/// NotReady ──prepare──▶ Stopped ──play──▶ Playing ◀─unpause/pause─▶ Paused
///    ▲                     ▲                 │                        │
///    └──────release────────┴──────stop───────┴────────────────────────┘
/// any ──quit──▶ Quit (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Constructed but the audio track is not loaded into the channel.
    #[default]
    NotReady,
    /// Ready, not playing.
    Stopped,
    /// Actively playing.
    Playing,
    /// Playing but paused at the current position.
    Paused,
    /// Resources released; terminal.
    Quit,
}

impl PlaybackState {
    /// Returns true if the video is currently playing.
    #[must_use]
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Returns true if the video is paused.
    #[must_use]
    pub fn is_paused(self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Returns true if the video is stopped.
    #[must_use]
    pub fn is_stopped(self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns true for every state where the audio track is loaded.
    #[must_use]
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Stopped | Self::Playing | Self::Paused)
    }

    /// Returns true if frames can be rendered (playing or paused).
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

/// Result of a playback position query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackPosition {
    /// The instance has not been prepared.
    NotReady,
    /// Prepared but not playing.
    NotPlaying,
    /// Current position in milliseconds.
    At(f64),
}

impl PlaybackPosition {
    /// Returns the position in milliseconds, if playing.
    #[must_use]
    pub fn millis(self) -> Option<f64> {
        match self {
            Self::At(ms) => Some(ms),
            _ => None,
        }
    }
}
