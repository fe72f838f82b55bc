use crate::traits::{ByteStream, FileStorage, StorageError, StorageResult};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Local filesystem storage implementation
///
/// The durability baseline for every upload: files land here first, CDN
/// offload is additive. Stored names are flat (no subdirectories), so the
/// traversal check only has to reject separators and dot-dot segments.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at `base_path`, creating it if needed.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a stored name to a filesystem path, rejecting traversal.
    fn name_to_path(&self, stored_name: &str) -> StorageResult<PathBuf> {
        if stored_name.is_empty()
            || stored_name.contains("..")
            || stored_name.contains('/')
            || stored_name.contains('\\')
        {
            return Err(StorageError::InvalidKey(
                "Stored name contains invalid characters".to_string(),
            ));
        }
        Ok(self.base_path.join(stored_name))
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn write(&self, stored_name: &str, data: &[u8]) -> StorageResult<PathBuf> {
        let path = self.name_to_path(stored_name)?;
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(path)
    }

    async fn read(&self, stored_name: &str) -> StorageResult<Vec<u8>> {
        let path = self.name_to_path(stored_name)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(stored_name.to_string()));
        }

        fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })
    }

    async fn read_prefix(&self, stored_name: &str, n: usize) -> StorageResult<Vec<u8>> {
        let path = self.name_to_path(stored_name)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(stored_name.to_string()));
        }

        let mut file = fs::File::open(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let mut buf = vec![0u8; n];
        let mut read = 0;
        while read < n {
            let r = file.read(&mut buf[read..]).await.map_err(|e| {
                StorageError::DownloadFailed(format!(
                    "Failed to read file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            if r == 0 {
                break;
            }
            read += r;
        }
        buf.truncate(read);
        Ok(buf)
    }

    async fn read_stream(&self, stored_name: &str) -> StorageResult<ByteStream> {
        let path = self.name_to_path(stored_name)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(stored_name.to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let reader = tokio_util::io::ReaderStream::new(file);
        let stream = reader.map(|result| {
            result.map_err(|e| StorageError::DownloadFailed(format!("Failed to read chunk: {}", e)))
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, stored_name: &str) -> StorageResult<()> {
        let path = self.name_to_path(stored_name)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), "Local storage delete successful");

        Ok(())
    }

    async fn exists(&self, stored_name: &str) -> StorageResult<bool> {
        let path = self.name_to_path(stored_name)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn content_length(&self, stored_name: &str) -> StorageResult<u64> {
        let path = self.name_to_path(stored_name)?;
        let meta = fs::metadata(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(stored_name.to_string()),
            _ => StorageError::DownloadFailed(e.to_string()),
        })?;
        Ok(meta.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_read_round_trip() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let data = b"test data".to_vec();
        let path = storage.write("abc123.txt", &data).await.unwrap();
        assert!(path.ends_with("abc123.txt"));

        let read = storage.read("abc123.txt").await.unwrap();
        assert_eq!(data, read);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.read("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.write("a/b.txt", b"x").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.read("nonexistent.bin").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_ok() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        assert!(storage.delete("nonexistent.bin").await.is_ok());
    }

    #[tokio::test]
    async fn test_read_prefix() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        storage.write("sig.bin", b"\x89PNG\r\n\x1a\nrest").await.unwrap();
        let prefix = storage.read_prefix("sig.bin", 4).await.unwrap();
        assert_eq!(prefix, b"\x89PNG");

        // Shorter file than requested prefix
        storage.write("tiny.bin", b"ab").await.unwrap();
        let prefix = storage.read_prefix("tiny.bin", 8).await.unwrap();
        assert_eq!(prefix, b"ab");
    }

    #[tokio::test]
    async fn test_read_stream() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let data = b"stream download test".to_vec();
        storage.write("stream.bin", &data).await.unwrap();

        let mut stream = storage.read_stream("stream.bin").await.unwrap();
        let mut downloaded = Vec::new();
        while let Some(chunk) = stream.next().await {
            downloaded.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(data, downloaded);
    }

    #[tokio::test]
    async fn test_content_length() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        storage.write("len.bin", &[0u8; 1234]).await.unwrap();
        assert_eq!(storage.content_length("len.bin").await.unwrap(), 1234);
        assert!(storage.exists("len.bin").await.unwrap());
        assert!(!storage.exists("other.bin").await.unwrap());
    }
}
