// SPDX-License-Identifier: MPL-2.0
//! Playback session: the shared audio channel and the set of live instances.
//!
//! Only one instance may hold the audio channel at a time. An instance takes
//! the channel in `prepare()` and gives it back in `release()`; a second
//! instance preparing meanwhile gets [`Error::ChannelBusy`].
//!
//! # Locking
//!
//! Instances lock themselves first and the session second. The session never
//! locks an instance while holding its own lock; [`PlaybackSession::quit_all`]
//! snapshots the instance handles and drops the session lock before touching
//! them.

use super::state::PlaybackCore;
use super::temp_audio::TempAudioNaming;
use crate::application::port::{AudioChannel, Presenter};
use crate::error::{Error, Result};
use crate::infrastructure::{ImagePresenter, SimulatedAudioChannel};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Identifier of a playback instance within its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaybackId(u64);

impl PlaybackId {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlaybackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "playback #{}", self.0)
    }
}

/// Outcome of [`PlaybackSession::quit_all`].
#[derive(Debug, Default)]
pub struct QuitReport {
    /// Instances that shut down cleanly.
    pub quit: Vec<PlaybackId>,
    /// Instances whose shutdown reported an error.
    pub failed: Vec<(PlaybackId, Error)>,
}

impl QuitReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

struct Record {
    id: PlaybackId,
    temp_audio: Option<PathBuf>,
    ready: bool,
    handle: Weak<Mutex<PlaybackCore>>,
}

struct SessionState {
    channel: Box<dyn AudioChannel>,
    presenter: Arc<dyn Presenter>,
    token: Option<PlaybackId>,
    next_id: u64,
    records: Vec<Record>,
}

impl SessionState {
    fn record_mut(&mut self, id: PlaybackId) -> Option<&mut Record> {
        self.records.iter_mut().find(|record| record.id == id)
    }
}

/// Shared context of every playback instance created from it.
///
/// Cloning is cheap and yields a handle to the same session.
#[derive(Clone)]
pub struct PlaybackSession {
    inner: Arc<Mutex<SessionState>>,
}

impl PlaybackSession {
    pub fn new(channel: impl AudioChannel + 'static, presenter: impl Presenter + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                channel: Box::new(channel),
                presenter: Arc::new(presenter),
                token: None,
                next_id: 1,
                records: Vec::new(),
            })),
        }
    }

    /// Session with a wall-clock simulated channel and the CPU presenter.
    #[must_use]
    pub fn headless() -> Self {
        Self::new(SimulatedAudioChannel::wall_clock(), ImagePresenter::new())
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of registered instances, live or not yet collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state().records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state().records.is_empty()
    }

    /// Registered instance ids in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<PlaybackId> {
        self.state().records.iter().map(|record| record.id).collect()
    }

    /// Instance currently holding the audio channel.
    #[must_use]
    pub fn active(&self) -> Option<PlaybackId> {
        self.state().token
    }

    /// True if any registered instance is prepared.
    #[must_use]
    pub fn is_any_ready(&self) -> bool {
        self.state().records.iter().any(|record| record.ready)
    }

    /// True if a registered instance uses `path` as its temp audio track.
    #[must_use]
    pub fn is_temp_audio_name_in_use(&self, path: &Path) -> bool {
        self.state()
            .records
            .iter()
            .any(|record| record.temp_audio.as_deref() == Some(path))
    }

    /// Stops the channel, quits every instance and clears the registry.
    ///
    /// Failures are logged and collected; they never stop the loop.
    pub fn quit_all(&self) -> QuitReport {
        let handles: Vec<(PlaybackId, Weak<Mutex<PlaybackCore>>)> = {
            let mut state = self.state();
            state.channel.stop();
            state
                .records
                .iter()
                .map(|record| (record.id, record.handle.clone()))
                .collect()
        };

        let mut report = QuitReport::default();
        for (id, handle) in handles {
            let Some(core) = handle.upgrade() else {
                continue;
            };
            let result = core.lock().unwrap_or_else(PoisonError::into_inner).quit();
            match result {
                Ok(()) => report.quit.push(id),
                Err(err) => {
                    tracing::warn!(%id, error = %err, "error during quit");
                    report.failed.push((id, err));
                }
            }
        }

        let mut state = self.state();
        state.records.clear();
        state.token = None;
        tracing::info!(
            quit = report.quit.len(),
            failed = report.failed.len(),
            "all playback instances quit"
        );
        report
    }

    pub(crate) fn presenter(&self) -> Arc<dyn Presenter> {
        Arc::clone(&self.state().presenter)
    }

    pub(crate) fn register(&self, handle: Weak<Mutex<PlaybackCore>>) -> PlaybackId {
        let mut state = self.state();
        let id = PlaybackId(state.next_id);
        state.next_id += 1;
        state.records.push(Record {
            id,
            temp_audio: None,
            ready: false,
            handle,
        });
        id
    }

    pub(crate) fn forget(&self, id: PlaybackId) {
        let mut state = self.state();
        state.records.retain(|record| record.id != id);
        if state.token == Some(id) {
            state.token = None;
        }
    }

    pub(crate) fn with_channel<R>(&self, f: impl FnOnce(&mut dyn AudioChannel) -> R) -> R {
        let mut state = self.state();
        f(state.channel.as_mut())
    }

    /// Takes the channel for `id`. Holding it already is fine.
    pub(crate) fn acquire(&self, id: PlaybackId) -> Result<()> {
        let mut state = self.state();
        match state.token {
            Some(holder) if holder != id => Err(Error::ChannelBusy { holder }),
            _ => {
                state.token = Some(id);
                Ok(())
            }
        }
    }

    /// Checks that nobody but `id` holds the channel, without taking it.
    pub(crate) fn check_available(&self, id: PlaybackId) -> Result<()> {
        match self.state().token {
            Some(holder) if holder != id => Err(Error::ChannelBusy { holder }),
            _ => Ok(()),
        }
    }

    pub(crate) fn release_token(&self, id: PlaybackId) {
        let mut state = self.state();
        if state.token == Some(id) {
            state.token = None;
        }
    }

    pub(crate) fn set_ready(&self, id: PlaybackId, ready: bool) {
        if let Some(record) = self.state().record_mut(id) {
            record.ready = ready;
        }
    }

    pub(crate) fn set_temp_audio(&self, id: PlaybackId, path: Option<PathBuf>) {
        if let Some(record) = self.state().record_mut(id) {
            record.temp_audio = path;
        }
    }

    /// Picks a free temp audio name for `id` and records it in one step.
    pub(crate) fn reserve_temp_audio(&self, id: PlaybackId, naming: &TempAudioNaming) -> PathBuf {
        let mut state = self.state();
        let path = naming.pick(|candidate| {
            state
                .records
                .iter()
                .any(|record| record.id != id && record.temp_audio.as_deref() == Some(candidate))
        });
        if let Some(record) = state.record_mut(id) {
            record.temp_audio = Some(path.clone());
        }
        path
    }
}

impl fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("PlaybackSession")
            .field("instances", &state.records.len())
            .field("active", &state.token)
            .finish_non_exhaustive()
    }
}
