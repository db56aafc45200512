// SPDX-License-Identifier: MPL-2.0
//! Bulk frame caching.
//!
//! [`CacheFill`] decodes the clip front to back one frame per step, so a
//! host can interleave the work with its own loop, show progress, or stop
//! early with [`CacheFill::request_stop`]. The last step is always
//! [`FillStep::Finished`] with the reason the fill ended.

use super::state::{Playback, PlaybackCore};
use crate::domain::media::RawImage;
use crate::error::{Error, Result};

/// Why a fill ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    /// Every frame was visited.
    Completed,
    /// The cache ran out of room.
    Full,
    /// [`CacheFill::request_stop`] was called with this reason.
    Cancelled(String),
}

/// One step of a [`CacheFill`].
#[derive(Debug, Clone, PartialEq)]
pub enum FillStep {
    /// Frame decoded and cached.
    Frame { index: usize, image: RawImage },
    /// Frame could not be decoded; a black frame stands in for it.
    Blank { index: usize, image: RawImage },
    /// Final step.
    Finished { outcome: FillOutcome, image: RawImage },
}

impl FillStep {
    /// Frame index, except for the final step.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Frame { index, .. } | Self::Blank { index, .. } => Some(*index),
            Self::Finished { .. } => None,
        }
    }

    #[must_use]
    pub fn image(&self) -> &RawImage {
        match self {
            Self::Frame { image, .. } | Self::Blank { image, .. } | Self::Finished { image, .. } => {
                image
            }
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }
}

/// Frame-by-frame cache fill of a [`Playback`], from [`Playback::cache_fill`].
#[derive(Debug)]
pub struct CacheFill<'a> {
    playback: &'a Playback,
    next: usize,
    total: usize,
    blank: RawImage,
    stop: Option<String>,
    done: bool,
    log_progress: bool,
}

impl CacheFill<'_> {
    /// Ends the fill; the next step is `Finished` with
    /// [`FillOutcome::Cancelled`].
    pub fn request_stop(&mut self, reason: impl Into<String>) {
        if !self.done {
            self.stop = Some(reason.into());
        }
    }

    /// Frames visited so far and the clip's frame count.
    #[must_use]
    pub fn progress(&self) -> (usize, usize) {
        (self.next, self.total)
    }

    fn finish(&mut self, outcome: FillOutcome) -> Option<FillStep> {
        self.done = true;
        tracing::info!(
            id = %self.playback.id(),
            visited = self.next,
            total = self.total,
            outcome = ?outcome,
            "cache fill finished"
        );
        Some(FillStep::Finished {
            outcome,
            image: self.blank.clone(),
        })
    }
}

impl Iterator for CacheFill<'_> {
    type Item = FillStep;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(reason) = self.stop.take() {
            return self.finish(FillOutcome::Cancelled(reason));
        }
        if self.next >= self.total {
            return self.finish(FillOutcome::Completed);
        }

        let index = self.next;
        self.next += 1;
        let cached = self.playback.lock().cache_frame(index);
        match cached {
            Ok(Some(image)) => {
                if self.log_progress {
                    tracing::debug!(index, total = self.total, "frame cached");
                }
                Some(FillStep::Frame { index, image })
            }
            Ok(None) => self.finish(FillOutcome::Full),
            Err(err) => {
                tracing::debug!(index, error = %err, "frame not cached, yielding blank");
                Some(FillStep::Blank {
                    index,
                    image: self.blank.clone(),
                })
            }
        }
    }
}

impl PlaybackCore {
    /// Decodes frame `index` into the cache. `Ok(None)` once the cache is full.
    fn cache_frame(&mut self, index: usize) -> Result<Option<RawImage>> {
        self.ensure_initialized()?;
        if self.cache.is_full() {
            return Ok(None);
        }
        if let Some(frame) = self.cache.get(index) {
            return Ok(Some(frame));
        }
        let frame = self.source.frame_at(self.info.frame_time(index))?;
        Ok(self.cache.put(index, frame.clone()).then_some(frame))
    }
}

impl Playback {
    /// Starts a step-by-step fill of the frame cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CacheDisabled`] when caching is off.
    pub fn cache_fill(&self) -> Result<CacheFill<'_>> {
        let core = self.lock();
        core.ensure_initialized()?;
        if !core.cache.is_enabled() {
            return Err(Error::CacheDisabled);
        }
        Ok(CacheFill {
            playback: self,
            next: 0,
            total: core.info.frame_count(),
            blank: RawImage::blank(core.size.unwrap_or_else(|| core.info.size())),
            stop: None,
            done: false,
            log_progress: core.config.log_progress,
        })
    }

    /// Fills the cache from the first frame, visiting at most `max_frames`
    /// frames (all of them for `None`). Returns the number of cached frames.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CacheDisabled`] when caching is off.
    pub fn create_cache(&self, max_frames: Option<usize>) -> Result<usize> {
        if max_frames != Some(0) {
            let mut fill = self.cache_fill()?;
            while let Some(step) = fill.next() {
                if let (Some(max), Some(index)) = (max_frames, step.index()) {
                    if index + 1 >= max {
                        fill.request_stop("frame budget reached");
                    }
                }
            }
        }
        self.cached_frame_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlaybackConfig;
    use crate::domain::media::Size;
    use crate::infrastructure::{ImagePresenter, SimulatedAudioChannel, SyntheticClip};
    use crate::video_player::PlaybackSession;
    use tempfile::TempDir;

    fn fixture(clip: &SyntheticClip, config: PlaybackConfig) -> (TempDir, Playback) {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = PlaybackSession::new(SimulatedAudioChannel::manual(), ImagePresenter::new());
        let config = PlaybackConfig {
            temp_dir: Some(dir.path().to_path_buf()),
            ..config
        };
        let playback =
            Playback::from_source(&session, Box::new(clip.clone().open()), config).expect("playback");
        (dir, playback)
    }

    fn one_second() -> SyntheticClip {
        SyntheticClip::new(8, 8, 10.0, 1.0)
    }

    #[test]
    fn fill_visits_every_frame_then_finishes() {
        let (_dir, playback) = fixture(&one_second(), PlaybackConfig::default());
        let steps: Vec<FillStep> = playback.cache_fill().expect("fill").collect();

        assert_eq!(steps.len(), 11);
        assert!(steps[..10]
            .iter()
            .enumerate()
            .all(|(i, step)| matches!(step, FillStep::Frame { index, .. } if *index == i)));
        assert!(matches!(
            steps.last(),
            Some(FillStep::Finished { outcome: FillOutcome::Completed, .. })
        ));
        assert_eq!(playback.cached_frame_count().expect("count"), 10);
    }

    #[test]
    fn failing_frames_yield_blanks() {
        let clip = one_second().with_failing_frames([2, 5]);
        let (_dir, playback) = fixture(&clip, PlaybackConfig::default());
        let blanks: Vec<usize> = playback
            .cache_fill()
            .expect("fill")
            .filter(|step| matches!(step, FillStep::Blank { .. }))
            .filter_map(|step| step.index())
            .collect();

        assert_eq!(blanks, vec![2, 5]);
        assert_eq!(playback.cached_frame_count().expect("count"), 8);
    }

    #[test]
    fn blank_uses_display_size() {
        let clip = one_second().with_failing_frames([0]);
        let (_dir, playback) = fixture(&clip, PlaybackConfig::default());
        playback.set_size(Some(Size::new(3, 2))).expect("size");
        let mut fill = playback.cache_fill().expect("fill");
        let first = fill.next().expect("step");
        assert!(matches!(first, FillStep::Blank { index: 0, .. }));
        assert_eq!(first.image().size(), Size::new(3, 2));
    }

    #[test]
    fn stop_request_ends_with_reason() {
        let (_dir, playback) = fixture(&one_second(), PlaybackConfig::default());
        let mut fill = playback.cache_fill().expect("fill");
        assert!(fill.next().is_some_and(|step| step.index() == Some(0)));
        fill.request_stop("user abort");

        let last = fill.next().expect("final step");
        assert_eq!(
            last,
            FillStep::Finished {
                outcome: FillOutcome::Cancelled("user abort".into()),
                image: RawImage::blank(Size::new(8, 8)),
            }
        );
        assert!(fill.next().is_none());
        assert_eq!(fill.progress(), (1, 10));
    }

    #[test]
    fn budget_in_config_reports_full() {
        let config = PlaybackConfig {
            max_cached_frames: Some(4),
            ..PlaybackConfig::default()
        };
        let (_dir, playback) = fixture(&one_second(), config);
        let last = playback.cache_fill().expect("fill").last().expect("steps");

        assert!(matches!(
            last,
            FillStep::Finished { outcome: FillOutcome::Full, .. }
        ));
        assert_eq!(playback.cached_frame_count().expect("count"), 4);
        assert!(playback.is_cache_full());
    }

    #[test]
    fn disabled_cache_refuses_fill() {
        let config = PlaybackConfig {
            cache: false,
            ..PlaybackConfig::default()
        };
        let (_dir, playback) = fixture(&one_second(), config);
        assert!(matches!(playback.cache_fill(), Err(Error::CacheDisabled)));
        assert!(matches!(playback.create_cache(None), Err(Error::CacheDisabled)));
    }

    #[test]
    fn create_cache_honours_frame_budget() {
        for (budget, expected) in [(Some(9), 9), (Some(10), 10), (Some(11), 10), (None, 10), (Some(0), 0)] {
            let (_dir, playback) = fixture(&one_second(), PlaybackConfig::default());
            let cached = playback.create_cache(budget).expect("create cache");
            assert_eq!(cached, expected, "budget {budget:?}");
        }
    }
}
