// SPDX-License-Identifier: MPL-2.0
//! Errors reported by media decoders.

use std::fmt;

/// Error categories a [`MediaDecoder`](crate::application::port::MediaDecoder)
/// or [`MediaSource`](crate::application::port::MediaSource) can report.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoError {
    /// File format is not supported (e.g., unknown extension)
    UnsupportedFormat,

    /// Video codec is not supported by the decoder
    UnsupportedCodec(String),

    /// File appears corrupted or has invalid data
    CorruptedFile,

    /// File exists but contains no video stream
    NoVideoStream,

    /// Clip has no audio track to extract
    NoAudioStream,

    /// Decoding a frame failed
    DecodingFailed(String),

    /// Requested time lies outside the clip
    TimeOutOfRange { time_secs: f64, duration_secs: f64 },

    /// The transform could not be applied to the clip
    TransformFailed(String),

    /// The source was closed and can no longer be read
    Closed,

    /// I/O error (file not found, permission denied, etc.)
    IoError(String),

    /// Generic error with raw message
    Other(String),
}

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoError::UnsupportedFormat => write!(f, "Unsupported video format"),
            VideoError::UnsupportedCodec(codec) => {
                write!(f, "Unsupported video codec: {}", codec)
            }
            VideoError::CorruptedFile => write!(f, "Video file is corrupted"),
            VideoError::NoVideoStream => write!(f, "No video stream found"),
            VideoError::NoAudioStream => {
                write!(f, "Video has no audio; only clips with audio can be played")
            }
            VideoError::DecodingFailed(msg) => write!(f, "Decoding failed: {}", msg),
            VideoError::TimeOutOfRange {
                time_secs,
                duration_secs,
            } => write!(
                f,
                "Time {time_secs:.3}s is outside the clip (duration {duration_secs:.3}s)"
            ),
            VideoError::TransformFailed(msg) => write!(f, "Transform failed: {}", msg),
            VideoError::Closed => write!(f, "Source is closed"),
            VideoError::IoError(msg) => write!(f, "I/O error: {}", msg),
            VideoError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for VideoError {}

impl From<std::io::Error> for VideoError {
    fn from(err: std::io::Error) -> Self {
        VideoError::IoError(err.to_string())
    }
}
