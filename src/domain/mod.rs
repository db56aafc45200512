// SPDX-License-Identifier: MPL-2.0
//! Domain layer - Core types with ZERO external dependencies.
//!
//! This module contains pure domain types, value objects, and business rules.
//! It has no dependencies on external crates (except `std`) to ensure
//! testability and architectural purity.
//!
//! # Modules
//!
//! - [`error`]: Domain error types ([`VideoError`](error::VideoError),
//!   [`AudioError`](error::AudioError))
//! - [`media`]: Media types ([`RawImage`](media::RawImage),
//!   [`MediaInfo`](media::MediaInfo), [`Size`](media::Size), [`Rect`](media::Rect))
//! - [`video`]: Playback types ([`PlaybackState`](video::PlaybackState),
//!   [`Loops`](video::Loops), [`Alpha`](video::Alpha), [`Transform`](video::Transform))

pub mod error;
pub mod media;
pub mod video;
