//! Backup root of one target: snapshot directories plus a staging area.
//!
//! The volume is stateless in memory: every operation re-derives the
//! snapshot set from a fresh directory listing, so the filesystem remains
//! the single source of truth across crashes and concurrent invocations.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use snapback_snapshot::{SnapshotName, SnapshotSet};

use crate::btrfs::Btrfs;

/// Name of the writable staging directory inside a backup root.
pub const STAGING_DIR: &str = ".staging";

/// Errors from backup-root handling.
#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("backup dir not found: {0}")]
    NotFound(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("not a btrfs filesystem: {0}")]
    NotBtrfs(PathBuf),

    #[error("cannot list `{path}`: {source}")]
    Listing { path: PathBuf, source: io::Error },
}

/// One target's backup root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    path: PathBuf,
}

impl Volume {
    /// Open a backup root: the path must exist and be a directory.
    pub fn open(path: &Path) -> Result<Self, VolumeError> {
        if !path.exists() {
            return Err(VolumeError::NotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(VolumeError::NotADirectory(path.to_path_buf()));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Open a backup root that must additionally live on btrfs.
    pub fn open_btrfs<B: Btrfs>(path: &Path, btrfs: &B) -> Result<Self, VolumeError> {
        let volume = Self::open(path)?;
        if !btrfs.is_btrfs(&volume.path) {
            return Err(VolumeError::NotBtrfs(volume.path));
        }
        Ok(volume)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the writable staging directory.
    pub fn staging_path(&self) -> PathBuf {
        self.path.join(STAGING_DIR)
    }

    /// Whether a staging directory currently exists.
    pub fn has_staging(&self) -> bool {
        self.staging_path().is_dir()
    }

    /// Path of the snapshot directory for `name`.
    pub fn snapshot_path(&self, name: &SnapshotName) -> PathBuf {
        self.path.join(name.to_string())
    }

    /// Enumerate the committed snapshots in this backup root.
    ///
    /// Rebuilt from a fresh listing on every call. Entries that are not
    /// directories or do not parse as snapshot names (the staging dir, the
    /// lockfile, foreign files) are skipped.
    pub fn snapshots(&self) -> Result<SnapshotSet, VolumeError> {
        let listing = |source| VolumeError::Listing {
            path: self.path.clone(),
            source,
        };
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.path).map_err(listing)? {
            let entry = entry.map_err(listing)?;
            let is_dir = entry.file_type().map_err(listing)?.is_dir();
            if !is_dir {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                entries.push(name.to_string());
            }
        }
        Ok(SnapshotSet::from_entries(entries))
    }
}
