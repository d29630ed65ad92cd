//! Backup-protected replace-by-rename for small documents.
//!
//! A write moves through three stages: the new bytes are staged in
//! `<path>.tmp`, the current file is copied to `<path>.bak`, and the staged
//! file is renamed over the real path. The backup is discarded only after the
//! rename lands. A failure maps the stage it reached to a [`Recovery`].

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::SessionStoreError;
use crate::fs_io::{ensure_dir, read_text};
use crate::paths::sibling_with_suffix;

/// Last stage a write completed before it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Started,
    Staged,
    BackedUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    DiscardTemp,
    RestoreBackup,
}

impl WriteStage {
    #[must_use]
    pub fn recovery(self) -> Recovery {
        match self {
            Self::Started | Self::Staged => Recovery::DiscardTemp,
            Self::BackedUp => Recovery::RestoreBackup,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AtomicFile {
    path: PathBuf,
    tmp_path: PathBuf,
    backup_path: PathBuf,
}

impl AtomicFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            tmp_path: sibling_with_suffix(&path, ".tmp"),
            backup_path: sibling_with_suffix(&path, ".bak"),
            path,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    #[must_use]
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Reads the document, first restoring the backup if a previous write
    /// stopped between removing the old file and renaming the new one.
    #[must_use]
    pub fn read(&self) -> Option<String> {
        if !self.path.exists() && self.backup_path.is_file() {
            match fs::copy(&self.backup_path, &self.path) {
                Ok(_) => {
                    tracing::info!(path = %self.path.display(), "restored document from backup");
                    remove_quietly(&self.backup_path);
                }
                Err(error) => {
                    tracing::warn!(path = %self.path.display(), %error, "backup restore failed");
                    return read_text(&self.backup_path);
                }
            }
        }

        read_text(&self.path)
    }

    pub fn write(&self, bytes: &[u8]) -> Result<(), SessionStoreError> {
        self.write_with(bytes, |from, to| fs::rename(from, to))
    }

    /// Runs the protocol with `commit` as the final rename step.
    pub(crate) fn write_with<F>(&self, bytes: &[u8], commit: F) -> Result<(), SessionStoreError>
    where
        F: FnOnce(&Path, &Path) -> io::Result<()>,
    {
        let mut stage = WriteStage::Started;
        match self.run(bytes, commit, &mut stage) {
            Ok(()) => {
                if stage == WriteStage::BackedUp {
                    remove_quietly(&self.backup_path);
                }
                Ok(())
            }
            Err(error) => {
                tracing::warn!(path = %self.path.display(), ?stage, %error, "atomic write failed");
                self.recover(stage.recovery());
                Err(error)
            }
        }
    }

    fn run<F>(&self, bytes: &[u8], commit: F, stage: &mut WriteStage) -> Result<(), SessionStoreError>
    where
        F: FnOnce(&Path, &Path) -> io::Result<()>,
    {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent)?;
            }
        }

        let mut tmp_file = File::create(&self.tmp_path)
            .map_err(|source| SessionStoreError::io("creating temp file", &self.tmp_path, source))?;
        tmp_file
            .write_all(bytes)
            .and_then(|()| tmp_file.sync_all())
            .map_err(|source| SessionStoreError::io("writing temp file", &self.tmp_path, source))?;
        drop(tmp_file);
        *stage = WriteStage::Staged;

        if self.path.exists() {
            fs::copy(&self.path, &self.backup_path).map_err(|source| {
                SessionStoreError::io("copying backup", &self.backup_path, source)
            })?;
            *stage = WriteStage::BackedUp;

            // Rename cannot replace an existing file on every platform.
            fs::remove_file(&self.path)
                .map_err(|source| SessionStoreError::io("removing old document", &self.path, source))?;
        }

        commit(&self.tmp_path, &self.path)
            .map_err(|source| SessionStoreError::io("renaming temp file", &self.path, source))
    }

    pub(crate) fn recover(&self, recovery: Recovery) {
        if recovery == Recovery::RestoreBackup {
            match fs::copy(&self.backup_path, &self.path) {
                Ok(_) => {
                    tracing::info!(path = %self.path.display(), "restored document from backup");
                    remove_quietly(&self.backup_path);
                }
                Err(error) => {
                    tracing::warn!(path = %self.path.display(), %error, "backup restore failed");
                }
            }
        }

        if self.tmp_path.is_file() {
            remove_quietly(&self.tmp_path);
        }
    }
}

fn remove_quietly(path: &Path) {
    if let Err(error) = fs::remove_file(path) {
        tracing::debug!(path = %path.display(), %error, "could not remove file");
    }
}
