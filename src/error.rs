// SPDX-License-Identifier: MPL-2.0
//! Crate-wide error type.
//!
//! Precondition violations (wrong lifecycle state, bad arguments, a second
//! instance grabbing the audio channel) are reported through [`Error`] and
//! leave the instance untouched. Per-frame decode failures never reach this
//! type: rendering substitutes a blank frame instead.

use crate::domain::error::{AudioError, VideoError};
use crate::video_player::PlaybackId;

#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    /// The instance was quit; only `is_quit` and display still work.
    #[error("video not initialized")]
    NotInitialized,

    #[error("video not ready yet; call prepare() first")]
    NotReady,

    #[error("the video is not playing yet; call play() before rendering")]
    NotPlaying,

    /// Another instance holds the shared audio channel.
    #[error("cannot use 2 videos at the same time: audio channel is held by {holder}")]
    ChannelBusy { holder: PlaybackId },

    #[error("{name} must be {expected}, not {actual}")]
    InvalidArgument {
        name: &'static str,
        expected: &'static str,
        actual: String,
    },

    #[error("position {value_ms}ms is out of range [0, {duration_ms}]ms")]
    OutOfRange { value_ms: f64, duration_ms: f64 },

    #[error("frame index {index} out of range for {len} frames")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("frame cache is disabled for this video")]
    CacheDisabled,

    #[error("video has no audio track; only clips with audio can be played")]
    NoAudio,

    /// A transform produced something that is not a playable clip.
    #[error("transform returned an invalid clip: {0}")]
    InvalidSource(String),

    #[error("video error: {0}")]
    Video(#[from] VideoError),

    #[error("audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, expected: &'static str, actual: impl ToString) -> Self {
        Error::InvalidArgument {
            name,
            expected,
            actual: actual.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<pico_args::Error> for Error {
    fn from(err: pico_args::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_io_error() {
        let err = Error::Io("disk failure".to_string());
        assert_eq!(format!("{}", err), "I/O error: disk failure");
    }

    #[test]
    fn from_io_error_produces_io_variant() {
        let io_error = std::io::Error::other("boom");
        let err: Error = io_error.into();
        match err {
            Error::Io(message) => assert!(message.contains("boom")),
            _ => panic!("expected Io variant"),
        }
    }

    #[test]
    fn invalid_argument_describes_expected_and_actual() {
        let err = Error::invalid("loops", "an integer >= -1", -5);
        assert_eq!(err.to_string(), "loops must be an integer >= -1, not -5");
    }

    #[test]
    fn video_error_wraps_with_from() {
        let err: Error = VideoError::NoAudioStream.into();
        assert!(matches!(err, Error::Video(VideoError::NoAudioStream)));
    }

    #[test]
    fn config_error_formats_properly() {
        let err = Error::Config("bad field".into());
        assert_eq!(format!("{}", err), "config error: bad field");
    }
}
