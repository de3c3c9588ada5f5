//! # Uploaded Files
//!
//! [`StoredFile`] is an upload as handed over by the host: the client's
//! original name, its extension and the content, either already in memory or
//! parked in a temporary file. Saving consumes the value, so a staged upload
//! can only ever be written once.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::utils::file::FileManager;

#[derive(Debug)]
enum FileContent {
    Bytes(Vec<u8>),
    TempFile(PathBuf),
}

/// An uploaded file waiting to be placed.
#[derive(Debug)]
pub struct StoredFile {
    original_name: String,
    extension: String,
    size_bytes: u64,
    content: FileContent,
}

impl StoredFile {
    /// Wraps an upload whose bytes are already in memory.
    pub fn from_bytes(original_name: impl Into<String>, data: Vec<u8>) -> Self {
        let original_name = original_name.into();
        Self {
            extension: extension_of(&original_name),
            size_bytes: data.len() as u64,
            content: FileContent::Bytes(data),
            original_name,
        }
    }

    /// Wraps an upload that the host spooled to a temporary file.
    pub async fn from_temp_file(
        original_name: impl Into<String>,
        temp_path: impl Into<PathBuf>,
    ) -> Result<Self, std::io::Error> {
        let original_name = original_name.into();
        let temp_path = temp_path.into();
        let size_bytes = fs::metadata(&temp_path).await?.len();

        Ok(Self {
            extension: extension_of(&original_name),
            size_bytes,
            content: FileContent::TempFile(temp_path),
            original_name,
        })
    }

    /// The name the client sent. Never used as a stored name directly.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Lower-cased extension of the original name, without the dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Writes the upload to `path`.
    ///
    /// For temporary-file uploads, `delete_temp` decides whether the temporary
    /// file is moved (and so removed) or copied.
    pub async fn save_to(self, path: &Path, delete_temp: bool) -> Result<(), std::io::Error> {
        debug!(
            original_name = %self.original_name,
            size = self.size_bytes,
            path = %path.display(),
            "Saving uploaded file"
        );

        match self.content {
            FileContent::Bytes(data) => FileManager::save_file(path, &data).await,
            FileContent::TempFile(temp) => FileManager::place_file(&temp, path, delete_temp).await,
        }
    }
}

fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .unwrap_or_default()
}
