//! # File Utilities
//!
//! This module provides the filesystem seam used by the placement core and the
//! helpers that persist uploaded bytes. The [`Filesystem`] trait is what the
//! lifecycle hooks call for directory creation, existence checks and removal;
//! [`FileManager`] holds the write-side helpers used when an upload is saved.

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, error, trace};

/// Filesystem operations the placement core depends on.
///
/// Implementations must treat removal of an absent path as success, so that
/// deleting attachments stays idempotent.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Creates `path` (and its parents when `recursive` is set).
    ///
    /// Succeeds when the directory already exists.
    async fn create_directory(&self, path: &Path, recursive: bool) -> Result<(), std::io::Error>;

    /// Returns whether `path` exists as a regular file.
    async fn exists(&self, path: &Path) -> bool;

    /// Returns whether `path` exists as a directory.
    async fn is_directory(&self, path: &Path) -> bool;

    /// Removes the file at `path`.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The file existed and was removed
    /// * `Ok(false)` - There was nothing to remove
    /// * `Err(std::io::Error)` - The file exists but couldn't be removed
    async fn remove(&self, path: &Path) -> Result<bool, std::io::Error>;

    /// Removes the directory at `path` if it is empty.
    ///
    /// Returns `Ok(false)` when the directory is missing or still has entries.
    async fn remove_dir_if_empty(&self, path: &Path) -> Result<bool, std::io::Error>;
}

/// [`Filesystem`] backed by the local disk through `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFilesystem;

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn create_directory(&self, path: &Path, recursive: bool) -> Result<(), std::io::Error> {
        trace!(path = %path.display(), recursive, "Ensuring directory exists");
        let result = if recursive {
            fs::create_dir_all(path).await
        } else {
            fs::create_dir(path).await
        };

        match result {
            Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
            other => other,
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    async fn is_directory(&self, path: &Path) -> bool {
        fs::metadata(path)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    async fn remove(&self, path: &Path) -> Result<bool, std::io::Error> {
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "File removed");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(path = %path.display(), "File already absent");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn remove_dir_if_empty(&self, path: &Path) -> Result<bool, std::io::Error> {
        let mut entries = match fs::read_dir(path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        if entries.next_entry().await?.is_some() {
            return Ok(false);
        }

        fs::remove_dir(path).await?;
        debug!(path = %path.display(), "Empty directory removed");
        Ok(true)
    }
}

/// Provides write-side file utilities for saving uploads.
pub struct FileManager;

impl FileManager {
    /// Saves file data to the specified path.
    ///
    /// # Arguments
    ///
    /// * `file_path` - The complete path where the file should be saved
    /// * `data` - The file data to save
    ///
    /// # Returns
    ///
    /// * `Ok(())` - File saved successfully
    /// * `Err(std::io::Error)` - Failed to save file
    pub async fn save_file(file_path: &Path, data: &[u8]) -> Result<(), std::io::Error> {
        debug!(file_path = %file_path.display(), size = data.len(), "Saving file");

        let mut file = fs::File::create(file_path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        debug!(file_path = %file_path.display(), "File saved successfully");
        Ok(())
    }

    /// Moves or copies a temporary upload to its final location.
    ///
    /// When `delete_source` is set the file is renamed, falling back to
    /// copy-then-remove when the rename crosses filesystems. Otherwise the
    /// temporary file is left untouched.
    pub async fn place_file(
        source: &Path,
        destination: &Path,
        delete_source: bool,
    ) -> Result<(), std::io::Error> {
        debug!(
            source = %source.display(),
            destination = %destination.display(),
            delete_source,
            "Placing temporary file"
        );

        if delete_source {
            if fs::rename(source, destination).await.is_ok() {
                return Ok(());
            }
            fs::copy(source, destination).await?;
            Self::cleanup_file(source).await;
        } else {
            fs::copy(source, destination).await?;
        }

        Ok(())
    }

    /// Attempts to clean up a file (used for error recovery).
    ///
    /// This function logs errors but doesn't return them, as it's used for cleanup
    /// in error scenarios where the original error should be preserved.
    pub async fn cleanup_file(file_path: &Path) {
        if let Err(e) = fs::remove_file(file_path).await {
            error!(
                file_path = %file_path.display(),
                error = %e,
                "Failed to clean up file"
            );
        } else {
            debug!(file_path = %file_path.display(), "File cleaned up successfully");
        }
    }
}
