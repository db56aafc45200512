// SPDX-License-Identifier: MPL-2.0
//! Errors reported by the audio output channel.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// `play` was called before any track was loaded.
    NoTrackLoaded,

    /// The track file exists but could not be understood.
    InvalidTrack(String),

    /// The output device rejected the request.
    Device(String),

    /// Reading the track failed.
    Io(String),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::NoTrackLoaded => write!(f, "No audio track loaded"),
            AudioError::InvalidTrack(msg) => write!(f, "Invalid audio track: {}", msg),
            AudioError::Device(msg) => write!(f, "Audio device error: {}", msg),
            AudioError::Io(msg) => write!(f, "Audio I/O error: {}", msg),
        }
    }
}

impl std::error::Error for AudioError {}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::Io(err.to_string())
    }
}
