//! Storage abstraction trait
//!
//! This module defines the FileStorage trait the upload pipeline and the
//! retrieval service work against. Files are addressed by their randomized
//! stored name; see [`crate::keys`].

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::path::PathBuf;
use std::pin::Pin;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid stored name: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A stream of file bytes produced by [`FileStorage::read_stream`].
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Physical file storage for uploaded content.
///
/// The stored name is the only addressing handle. Implementations must reject
/// names that could escape their root (path traversal).
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Write a file durably and return its filesystem path.
    async fn write(&self, stored_name: &str, data: &[u8]) -> StorageResult<PathBuf>;

    /// Read the whole file into memory. Prefer [`Self::read_stream`] for serving.
    async fn read(&self, stored_name: &str) -> StorageResult<Vec<u8>>;

    /// Read the first `n` bytes of the file (for content-type sniffing).
    async fn read_prefix(&self, stored_name: &str, n: usize) -> StorageResult<Vec<u8>>;

    /// Open the file as a chunked byte stream.
    async fn read_stream(&self, stored_name: &str) -> StorageResult<ByteStream>;

    /// Delete a file; deleting a missing file is not an error.
    async fn delete(&self, stored_name: &str) -> StorageResult<()>;

    /// Check if a file exists.
    async fn exists(&self, stored_name: &str) -> StorageResult<bool>;

    /// Size in bytes of the stored file.
    async fn content_length(&self, stored_name: &str) -> StorageResult<u64>;
}
