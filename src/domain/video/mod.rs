// SPDX-License-Identifier: MPL-2.0
//! Video playback domain types.
//!
//! This module contains video-related value objects and enums that are
//! independent of any presentation or infrastructure concerns.

pub mod newtypes;
pub mod playback;
pub mod transform;

// Re-export commonly used types
pub use newtypes::{Alpha, Loops, Volume};
pub use playback::{PlaybackPosition, PlaybackState};
pub use transform::{Axis, FadeDirection, ResizeSpec, Transform};
