// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! This module defines abstract interfaces that infrastructure adapters implement.
//! These traits use only domain types, ensuring the playback engine remains
//! independent of concrete decoders and devices.
//!
//! # Available Ports
//!
//! - [`decoder`]: Clip opening, frame decoding, transforms, audio extraction
//! - [`audio`]: The single shared audio output channel
//! - [`presentation`]: Scaling, opacity and blitting primitives
//!
//! # Design Notes
//!
//! - All traits use domain types only
//! - Methods return `Result` with domain error types
//! - Nothing is `async`: the engine runs on the host's render thread
//!
//! # Example
//!
//! ```ignore
//! use vidsync::application::port::{MediaDecoder, OpenOptions};
//! use vidsync::domain::media::RawImage;
//! use std::path::Path;
//!
//! fn first_frame(decoder: &impl MediaDecoder, path: &Path) -> Option<RawImage> {
//!     let mut source = decoder.open(path, &OpenOptions::default()).ok()?;
//!     source.frame_at(0.0).ok()
//! }
//! ```

pub mod audio;
pub mod decoder;
pub mod presentation;

// Re-export main types for convenience
pub use audio::AudioChannel;
pub use decoder::{MediaDecoder, MediaSource, OpenOptions};
pub use presentation::Presenter;
