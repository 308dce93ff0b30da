//! Durable home of the serialized task collection.
//!
//! The store only needs two things from a medium: read the whole blob back, and
//! replace it wholesale. [`FileTaskStorage`] keeps the blob in a single JSON file
//! and replaces it through a sibling temporary file, so a reader sees either the
//! previous contents or the new ones.
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by a storage medium.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the underlying file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The collection could not be encoded as JSON.
    #[error("Failed to encode tasks: {0}")]
    Encode(#[from] serde_json::Error),
    /// The stored blob is not a task collection.
    #[error("Failed to decode stored tasks: {0}")]
    Decode(#[source] serde_json::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStorage {
    /// Reads the stored blob, or `None` if nothing has been stored yet.
    async fn read(&self) -> Result<Option<String>, StorageError>;

    /// Replaces the stored blob.
    async fn write(&self, contents: &str) -> Result<(), StorageError>;
}

/// Keeps the task collection in one JSON file.
#[derive(Debug, Clone)]
pub struct FileTaskStorage {
    path: PathBuf,
}

impl FileTaskStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temporary_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_error(path: &Path, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl TaskStorage for FileTaskStorage {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn read(&self) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Self::io_error(&self.path, err)),
        }
    }

    #[tracing::instrument(skip(self, contents), fields(path = %self.path.display(), bytes = contents.len()))]
    async fn write(&self, contents: &str) -> Result<(), StorageError> {
        let temporary = self.temporary_path();
        let replaced = match tokio::fs::write(&temporary, contents).await {
            Ok(()) => tokio::fs::rename(&temporary, &self.path)
                .await
                .map_err(|err| Self::io_error(&self.path, err)),
            Err(err) => Err(Self::io_error(&temporary, err)),
        };
        if replaced.is_err() {
            // A partial temporary file must not outlive the failed write.
            let _ = tokio::fs::remove_file(&temporary).await;
        } else {
            tracing::debug!("Tasks written");
        }
        replaced
    }
}
