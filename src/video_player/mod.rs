// SPDX-License-Identifier: MPL-2.0
//! Audio-clocked playback engine.
//!
//! A [`PlaybackSession`] owns the single audio channel and knows every live
//! [`Playback`]. Each playback wraps one clip and, once per host tick, turns
//! the channel position into a frame through [`Playback::advance_and_render`].
//!
//! ```ignore
//! let session = PlaybackSession::headless();
//! let playback = Playback::open(&session, &decoder, "clip.mp4", PlaybackConfig::default())?;
//! playback.prepare()?.play(0, 0.0)?;
//! loop {
//!     let frame = playback.advance_and_render(Some(&mut screen), Point::new(0, 0))?;
//!     if !playback.is_playing() { break; }
//! }
//! session.quit_all();
//! ```

pub mod audio_clock;
pub mod cache_fill;
pub mod frame_cache;
pub mod session;
mod state;
pub mod temp_audio;
pub mod transform;

pub use audio_clock::{elapsed_ms, frame_index_for, ClockReading};
pub use cache_fill::{CacheFill, FillOutcome, FillStep};
pub use frame_cache::{CacheConfig, CacheStats, FrameCache};
pub use session::{PlaybackId, PlaybackSession, QuitReport};
pub use state::{DurationOperand, FileSizeUnit, FrameIter, Playback};
pub use temp_audio::{TempAudioNaming, TempAudioTrack};
pub use transform::validate_transform;
