// SPDX-License-Identifier: MPL-2.0
//! Audio-driven playback clock.
//!
//! Audio is the master clock: the frame shown on a tick is whatever frame the
//! audio channel has reached. The channel reports milliseconds played since
//! the last `play` call, or a "not playing" sentinel once it has run out,
//! which maps to the end of the clip.

use crate::application::port::AudioChannel;

/// One reading of the audio clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockReading {
    /// Milliseconds played since the last `play` call.
    Elapsed(f64),
    /// The channel is not playing (finished or stopped).
    Finished,
}

impl ClockReading {
    /// Reads the channel position. Negative device readings clamp to 0.
    #[must_use]
    pub fn read(channel: &dyn AudioChannel) -> Self {
        match channel.position_ms() {
            Some(ms) if ms.is_finite() => Self::Elapsed(ms.max(0.0)),
            Some(_) => Self::Elapsed(0.0),
            None => Self::Finished,
        }
    }

    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Elapsed milliseconds, with the sentinel mapped to `duration_ms`.
    #[must_use]
    pub fn elapsed_ms(self, duration_ms: f64) -> f64 {
        match self {
            Self::Elapsed(ms) => ms,
            Self::Finished => duration_ms,
        }
    }
}

/// Elapsed playback milliseconds; end of media once the channel has stopped.
#[must_use]
pub fn elapsed_ms(channel: &dyn AudioChannel, duration_ms: f64) -> f64 {
    ClockReading::read(channel).elapsed_ms(duration_ms)
}

/// Frame shown at `offset_ms + elapsed_ms` into the clip.
///
/// A finished reading yields `total_frames` (one past the last frame).
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn frame_index_for(reading: ClockReading, offset_ms: f64, fps: f64, total_frames: usize) -> usize {
    match reading {
        ClockReading::Finished => total_frames,
        ClockReading::Elapsed(elapsed) => {
            let index = ((offset_ms + elapsed) / 1000.0 * fps).floor();
            if index.is_finite() && index > 0.0 {
                index as usize
            } else {
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AudioError;
    use crate::test_utils::assert_abs_diff_eq;
    use std::path::Path;

    struct FixedChannel(Option<f64>);

    impl AudioChannel for FixedChannel {
        fn load(&mut self, _: &Path) -> Result<(), AudioError> {
            Ok(())
        }
        fn play(&mut self, _: f64) -> Result<(), AudioError> {
            Ok(())
        }
        fn pause(&mut self) {}
        fn unpause(&mut self) {}
        fn stop(&mut self) {}
        fn unload(&mut self) {}
        fn position_ms(&self) -> Option<f64> {
            self.0
        }
        fn set_volume(&mut self, _: f32) {}
        fn volume(&self) -> f32 {
            1.0
        }
        fn is_busy(&self) -> bool {
            self.0.is_some()
        }
    }

    #[test]
    fn sentinel_maps_to_duration() {
        assert_abs_diff_eq!(elapsed_ms(&FixedChannel(None), 10_000.0), 10_000.0);
        assert_abs_diff_eq!(elapsed_ms(&FixedChannel(Some(1234.0)), 10_000.0), 1234.0);
    }

    #[test]
    fn negative_readings_clamp_to_zero() {
        assert_eq!(ClockReading::read(&FixedChannel(Some(-20.0))), ClockReading::Elapsed(0.0));
    }

    #[test]
    fn index_is_floor_of_elapsed_times_fps() {
        for elapsed in [0.0, 33.0, 34.0, 999.0, 5000.0, 9999.0] {
            let index = frame_index_for(ClockReading::Elapsed(elapsed), 0.0, 30.0, 300);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let expected = (elapsed * 30.0 / 1000.0).floor() as usize;
            assert_eq!(index, expected, "elapsed {elapsed}");
        }
    }

    #[test]
    fn offset_shifts_index() {
        let index = frame_index_for(ClockReading::Elapsed(1000.0), 4000.0, 30.0, 300);
        assert_eq!(index, 150);
    }

    #[test]
    fn finished_reading_is_past_the_end() {
        assert_eq!(frame_index_for(ClockReading::Finished, 0.0, 30.0, 300), 300);
    }
}
