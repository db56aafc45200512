// SPDX-License-Identifier: MPL-2.0
//! On-disk audio track extracted from the current clip.
//!
//! Every live playback instance owns at most one track file. Names follow
//! `<stem>.<ext>`, `<stem>_2.<ext>`, `<stem>_3.<ext>`, ... and skip any name
//! that exists on disk or belongs to another live instance.

use crate::application::port::MediaSource;
use crate::config::PlaybackConfig;
use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where and how track files are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempAudioNaming {
    pub dir: PathBuf,
    pub stem: String,
    pub extension: String,
}

impl TempAudioNaming {
    #[must_use]
    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self {
            dir: config.resolved_temp_dir(),
            stem: config.temp_audio_stem.clone(),
            extension: config.temp_audio_extension.clone(),
        }
    }

    /// The `n`-th candidate name (1-based; 1 has no suffix).
    #[must_use]
    pub fn candidate(&self, n: usize) -> PathBuf {
        let name = if n <= 1 {
            format!("{}.{}", self.stem, self.extension)
        } else {
            format!("{}_{n}.{}", self.stem, self.extension)
        };
        self.dir.join(name)
    }

    /// First candidate that is neither on disk nor rejected by `in_use`.
    pub fn pick(&self, in_use: impl Fn(&Path) -> bool) -> PathBuf {
        (1..)
            .map(|n| self.candidate(n))
            .find(|path| !path.exists() && !in_use(path))
            .unwrap_or_else(|| self.candidate(1))
    }
}

/// The track file of one playback instance.
#[derive(Debug)]
pub struct TempAudioTrack {
    naming: TempAudioNaming,
    path: Option<PathBuf>,
}

impl TempAudioTrack {
    #[must_use]
    pub fn new(naming: TempAudioNaming) -> Self {
        Self { naming, path: None }
    }

    #[must_use]
    pub fn naming(&self) -> &TempAudioNaming {
        &self.naming
    }

    /// Path assigned to this track, whether or not the file exists yet.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn assign(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    /// True when a path is assigned and the file is on disk.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.path.as_deref().is_some_and(Path::exists)
    }

    /// Writes the audio of `source` to the assigned path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoAudio`] for silent clips and [`Error::NotReady`] if
    /// no path has been assigned.
    pub fn extract(&self, source: &dyn MediaSource) -> Result<&Path> {
        let path = self.path.as_deref().ok_or(Error::NotReady)?;
        if !source.info().has_audio {
            return Err(Error::NoAudio);
        }
        source.extract_audio(path)?;
        tracing::debug!(path = %path.display(), "temp audio written");
        Ok(path)
    }

    /// Deletes the track file but keeps the assigned name.
    ///
    /// A missing file is fine. Permission errors (the file is still held by
    /// the audio device) are logged and swallowed.
    ///
    /// # Errors
    ///
    /// Returns any other I/O error.
    pub fn delete(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        match fs::remove_file(path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "temp audio removed");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                tracing::warn!(path = %path.display(), error = %err, "temp audio in use, left on disk");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes the track file and forgets the path.
    ///
    /// # Errors
    ///
    /// Same as [`delete`](Self::delete); the path is forgotten regardless.
    pub fn remove(&mut self) -> Result<()> {
        let result = self.delete();
        self.path = None;
        result
    }
}
