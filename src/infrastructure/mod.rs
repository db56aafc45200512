// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! This module contains concrete implementations of the port traits defined in
//! `application::port`. They run entirely in memory and on plain files, so
//! the playback engine can be driven end to end in tests and in the demo
//! binary.
//!
//! # Available Adapters
//!
//! - [`image_presenter`]: RGBA scaling and blitting via the `image` crate (implements [`Presenter`])
//! - [`synthetic`]: Procedural clips with pixel transforms (implements [`MediaDecoder`])
//! - [`simulated_audio`]: Clock-driven audio channel (implements [`AudioChannel`])
//!
//! [`Presenter`]: crate::application::port::Presenter
//! [`MediaDecoder`]: crate::application::port::MediaDecoder
//! [`AudioChannel`]: crate::application::port::AudioChannel

pub mod image_presenter;
pub mod simulated_audio;
pub mod synthetic;

// Re-export main types for convenience
pub use image_presenter::ImagePresenter;
pub use simulated_audio::SimulatedAudioChannel;
pub use synthetic::{SyntheticClip, SyntheticDecoder, SyntheticSource};
