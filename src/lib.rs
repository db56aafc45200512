// SPDX-License-Identifier: MPL-2.0
//! `vidsync` keeps decoded video frames in step with an audio track.
//!
//! The audio channel is the master clock. A host render loop calls
//! [`Playback::advance_and_render`] once per tick and gets the frame that
//! matches what is being heard, scaled and blended for display. Around that
//! core the crate provides a per-instance frame cache, a transform pipeline
//! that keeps the extracted audio track in sync with clip edits, and a
//! [`PlaybackSession`] that guards the shared audio channel.
//!
//! Decoding, audio output and drawing sit behind the traits in
//! [`application::port`]; [`infrastructure`] has in-memory implementations.

#![doc(html_root_url = "https://docs.rs/vidsync/0.1.0")]

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod video_player;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{Error, Result};
pub use video_player::{Playback, PlaybackSession};
