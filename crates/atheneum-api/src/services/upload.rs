//! Upload pipeline.
//!
//! Owns the mapping from logical file identity to physical location. Every
//! accepted upload follows the same order: size ceiling, MIME allow-list,
//! randomized stored name, durable local write, optional CDN offload, then
//! the metadata record. The CDN leg is strictly additive: a remote failure or
//! timeout degrades the upload to local-only instead of failing the request.
//! If the metadata write itself fails after the physical write, the physical
//! copies are deleted again (compensating cleanup) so no orphan survives.

use crate::constants::{CDN_FOLDER_PREFIX, CDN_UPLOAD_TAG, UPLOAD_FILE_FIELD};
use async_trait::async_trait;
use atheneum_core::models::{
    AlgorithmContent, NewAlgorithmContent, NewStoredFile, StorageLocation, StoredFile,
};
use atheneum_core::AppError;
use atheneum_db::ContentStore;
use atheneum_storage::{
    generate_stored_name, CdnError, CdnUploadOptions, CdnUploadResult, FileStorage,
    ImageKitClient,
};
use axum::extract::Multipart;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Seam over the remote CDN so the pipeline's degradation path is testable.
#[async_trait]
pub trait RemoteCdn: Send + Sync {
    async fn upload(
        &self,
        file_name: &str,
        data: Vec<u8>,
        options: CdnUploadOptions,
    ) -> Result<CdnUploadResult, CdnError>;

    async fn delete_file(&self, file_id: &str) -> Result<(), CdnError>;
}

#[async_trait]
impl RemoteCdn for ImageKitClient {
    async fn upload(
        &self,
        file_name: &str,
        data: Vec<u8>,
        options: CdnUploadOptions,
    ) -> Result<CdnUploadResult, CdnError> {
        ImageKitClient::upload(self, file_name, data, options).await
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), CdnError> {
        ImageKitClient::delete_file(self, file_id).await
    }
}

/// One file pulled out of a multipart request.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub original_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Parsed multipart upload: the file plus any text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<FilePart>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn require_file(self) -> Result<(FilePart, HashMap<String, String>), AppError> {
        match self.file {
            Some(file) => Ok((file, self.fields)),
            None => Err(AppError::BadRequest("No file uploaded".to_string())),
        }
    }
}

/// Drain a multipart body into an [`UploadForm`].
pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == UPLOAD_FILE_FIELD {
            let original_name = field
                .file_name()
                .unwrap_or("upload")
                .to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read file field: {}", e)))?
                .to_vec();
            form.file = Some(FilePart {
                original_name,
                content_type,
                data,
            });
        } else if !name.is_empty() {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read field: {}", e)))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// The upload pipeline service.
#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn ContentStore>,
    storage: Arc<dyn FileStorage>,
    cdn: Option<Arc<dyn RemoteCdn>>,
    max_file_size: usize,
    allowed_content_types: Vec<String>,
}

impl UploadService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        storage: Arc<dyn FileStorage>,
        cdn: Option<Arc<dyn RemoteCdn>>,
        max_file_size: usize,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            store,
            storage,
            cdn,
            max_file_size,
            allowed_content_types,
        }
    }

    /// Validate an incoming file: size ceiling first, then the MIME
    /// allow-list. Runs before anything touches disk.
    pub fn validate(&self, part: &FilePart) -> Result<(), AppError> {
        if part.data.is_empty() {
            return Err(AppError::InvalidInput("File is empty".to_string()));
        }
        if part.data.len() > self.max_file_size {
            return Err(AppError::PayloadTooLarge(format!(
                "{} bytes exceeds max {} bytes",
                part.data.len(),
                self.max_file_size
            )));
        }

        let normalized = part.content_type.to_lowercase();
        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(AppError::InvalidInput(format!(
                "File type '{}' is not supported",
                part.content_type
            )));
        }

        Ok(())
    }

    /// Accept a generic file upload.
    ///
    /// Local disk is written first; when the CDN is configured AND the request
    /// asked for it, the bytes are additionally offloaded. The metadata record
    /// is created only after the physical write(s) succeeded.
    pub async fn store_file(
        &self,
        part: FilePart,
        category: String,
        related_id: Option<Uuid>,
        use_cdn: bool,
    ) -> Result<StoredFile, AppError> {
        self.validate(&part)?;

        let stored_name = generate_stored_name(&part.original_name);
        let path = self
            .storage
            .write(&stored_name, &part.data)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let mut new = NewStoredFile {
            file_name: stored_name.clone(),
            original_name: part.original_name.clone(),
            file_type: part.content_type.clone(),
            file_size: part.data.len() as i64,
            file_path: path.to_string_lossy().into_owned(),
            category: category.clone(),
            related_id,
            storage_location: StorageLocation::Local,
            imagekit_file_id: None,
            imagekit_url: None,
            imagekit_thumbnail_url: None,
        };

        if use_cdn {
            if let Some(ref cdn) = self.cdn {
                let options = CdnUploadOptions {
                    folder: Some(format!("{}/{}", CDN_FOLDER_PREFIX, category)),
                    tags: vec![category.clone(), CDN_UPLOAD_TAG.to_string()],
                };
                match cdn.upload(&part.original_name, part.data.clone(), options).await {
                    Ok(result) => {
                        tracing::info!(
                            file_id = %result.file_id,
                            url = %result.url,
                            "File offloaded to CDN"
                        );
                        new.storage_location = StorageLocation::Remote;
                        new.imagekit_thumbnail_url =
                            result.thumbnail_url.or_else(|| Some(result.url.clone()));
                        new.imagekit_url = Some(result.url);
                        new.imagekit_file_id = Some(result.file_id);
                    }
                    Err(e) => {
                        // Graceful degradation: the local copy is already durable.
                        tracing::warn!(
                            error = %e,
                            timeout = e.is_timeout(),
                            "CDN upload failed, continuing with local-only storage"
                        );
                    }
                }
            }
        }

        let remote_file_id = new.imagekit_file_id.clone();
        match self.store.create_file(new).await {
            Ok(file) => Ok(file),
            Err(e) => {
                self.compensate_failed_metadata(&stored_name, remote_file_id.as_deref())
                    .await;
                Err(e)
            }
        }
    }

    /// Accept an algorithm-content upload (always local storage).
    pub async fn store_content(
        &self,
        algorithm_id: Uuid,
        part: FilePart,
        title: Option<String>,
        description: Option<String>,
        category: Option<String>,
    ) -> Result<AlgorithmContent, AppError> {
        self.validate(&part)?;

        let stored_name = generate_stored_name(&part.original_name);
        let path = self
            .storage
            .write(&stored_name, &part.data)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let new = NewAlgorithmContent {
            algorithm_id,
            title: title.unwrap_or_else(|| part.original_name.clone()),
            description,
            file_name: stored_name.clone(),
            file_type: part.content_type.clone(),
            file_size: part.data.len() as i64,
            file_path: path.to_string_lossy().into_owned(),
            category: category
                .unwrap_or_else(|| NewAlgorithmContent::DEFAULT_CATEGORY.to_string()),
        };

        match self.store.create_content(new).await {
            Ok(content) => Ok(content),
            Err(e) => {
                self.compensate_failed_metadata(&stored_name, None).await;
                Err(e)
            }
        }
    }

    /// Delete a file record and cascade to its physical/remote copies.
    pub async fn remove_file(&self, id: Uuid) -> Result<Option<StoredFile>, AppError> {
        let removed = self.store.delete_file(id).await?;
        if let Some(ref file) = removed {
            self.cleanup_physical(file).await;
        }
        Ok(removed)
    }

    /// Delete all files in a category (optionally scoped to a related entity),
    /// cascading to their physical/remote copies.
    pub async fn remove_files_by_category(
        &self,
        category: &str,
        related_id: Option<Uuid>,
    ) -> Result<usize, AppError> {
        let removed = self
            .store
            .delete_files_by_category(category, related_id)
            .await?;
        for file in &removed {
            self.cleanup_physical(file).await;
        }
        Ok(removed.len())
    }

    /// Delete a content record and its local bytes.
    pub async fn remove_content(&self, id: Uuid) -> Result<Option<AlgorithmContent>, AppError> {
        let removed = self.store.delete_content(id).await?;
        if let Some(ref content) = removed {
            self.delete_local(&content.file_name).await;
        }
        Ok(removed)
    }

    /// Delete an algorithm and the local bytes of its cascaded content.
    pub async fn remove_algorithm(&self, id: Uuid) -> Result<(), AppError> {
        let removed_content = self.store.delete_algorithm(id).await?;
        for content in &removed_content {
            self.delete_local(&content.file_name).await;
        }
        Ok(())
    }

    async fn cleanup_physical(&self, file: &StoredFile) {
        self.delete_local(&file.file_name).await;

        if file.storage_location == StorageLocation::Remote {
            if let (Some(cdn), Some(remote_id)) = (&self.cdn, &file.imagekit_file_id) {
                if let Err(e) = cdn.delete_file(remote_id).await {
                    tracing::warn!(
                        error = %e,
                        file_id = %remote_id,
                        "Failed to delete remote copy; it may need manual cleanup"
                    );
                }
            }
        }
    }

    async fn delete_local(&self, stored_name: &str) {
        if let Err(e) = self.storage.delete(stored_name).await {
            tracing::warn!(error = %e, stored_name = %stored_name, "Failed to delete local file");
        }
    }

    /// Undo physical writes after a failed metadata insert.
    async fn compensate_failed_metadata(&self, stored_name: &str, remote_id: Option<&str>) {
        tracing::error!(
            stored_name = %stored_name,
            "Metadata write failed after physical write; removing orphaned copies"
        );
        self.delete_local(stored_name).await;
        if let (Some(cdn), Some(remote_id)) = (&self.cdn, remote_id) {
            if let Err(e) = cdn.delete_file(remote_id).await {
                tracing::warn!(error = %e, file_id = %remote_id, "Failed to remove orphaned remote copy");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atheneum_core::models::NewAlgorithm;
    use atheneum_db::MemoryStore;
    use atheneum_storage::LocalStorage;
    use tempfile::TempDir;

    struct FailingCdn;

    #[async_trait]
    impl RemoteCdn for FailingCdn {
        async fn upload(
            &self,
            _file_name: &str,
            _data: Vec<u8>,
            _options: CdnUploadOptions,
        ) -> Result<CdnUploadResult, CdnError> {
            Err(CdnError::Api {
                status: 500,
                message: "remote unavailable".to_string(),
            })
        }

        async fn delete_file(&self, _file_id: &str) -> Result<(), CdnError> {
            Ok(())
        }
    }

    struct FakeCdn;

    #[async_trait]
    impl RemoteCdn for FakeCdn {
        async fn upload(
            &self,
            file_name: &str,
            _data: Vec<u8>,
            _options: CdnUploadOptions,
        ) -> Result<CdnUploadResult, CdnError> {
            Ok(CdnUploadResult {
                file_id: "remote-123".to_string(),
                name: file_name.to_string(),
                url: format!("https://cdn.example/{}", file_name),
                thumbnail_url: None,
                height: None,
                width: None,
                size: None,
                file_path: None,
            })
        }

        async fn delete_file(&self, _file_id: &str) -> Result<(), CdnError> {
            Ok(())
        }
    }

    async fn service_with_cdn(
        cdn: Option<Arc<dyn RemoteCdn>>,
    ) -> (UploadService, Arc<MemoryStore>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let service = UploadService::new(
            store.clone(),
            storage,
            cdn,
            1024,
            vec!["image/png".to_string(), "application/pdf".to_string()],
        );
        (service, store, dir)
    }

    fn png_part(size: usize) -> FilePart {
        let mut data = vec![0x89, 0x50, 0x4E, 0x47];
        data.resize(size, 0);
        FilePart {
            original_name: "photo.png".to_string(),
            content_type: "image/png".to_string(),
            data,
        }
    }

    fn files_on_disk(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[tokio::test]
    async fn test_disallowed_mime_rejected_before_disk_write() {
        let (service, _store, dir) = service_with_cdn(None).await;
        let part = FilePart {
            original_name: "tool.exe".to_string(),
            content_type: "application/x-msdownload".to_string(),
            data: vec![1, 2, 3],
        };

        let result = service
            .store_file(part, "general".to_string(), None, false)
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(files_on_disk(&dir), 0);
    }

    #[tokio::test]
    async fn test_oversize_rejected_with_no_partial_file() {
        let (service, _store, dir) = service_with_cdn(None).await;

        let result = service
            .store_file(png_part(2048), "general".to_string(), None, false)
            .await;
        assert!(matches!(result, Err(AppError::PayloadTooLarge(_))));
        assert_eq!(files_on_disk(&dir), 0);
    }

    #[tokio::test]
    async fn test_size_checked_before_mime() {
        let (service, _store, _dir) = service_with_cdn(None).await;
        let part = FilePart {
            original_name: "big.exe".to_string(),
            content_type: "application/x-msdownload".to_string(),
            data: vec![0; 2048],
        };
        // Both checks would fail; the size ceiling fires first.
        assert!(matches!(
            service.validate(&part),
            Err(AppError::PayloadTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_successful_upload_writes_disk_and_metadata() {
        let (service, store, dir) = service_with_cdn(None).await;

        let file = service
            .store_file(png_part(100), "general".to_string(), None, false)
            .await
            .unwrap();

        assert_eq!(file.storage_location, StorageLocation::Local);
        assert_ne!(file.file_name, "photo.png");
        assert_eq!(file.original_name, "photo.png");
        assert_eq!(files_on_disk(&dir), 1);
        assert!(store.get_file(file.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cdn_failure_degrades_to_local_only() {
        let (service, store, dir) = service_with_cdn(Some(Arc::new(FailingCdn))).await;

        let file = service
            .store_file(png_part(100), "general".to_string(), None, true)
            .await
            .unwrap();

        assert_eq!(file.storage_location, StorageLocation::Local);
        assert!(file.imagekit_file_id.is_none());
        assert_eq!(files_on_disk(&dir), 1);
        assert!(store.get_file(file.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cdn_success_records_remote_fields() {
        let (service, _store, _dir) = service_with_cdn(Some(Arc::new(FakeCdn))).await;

        let file = service
            .store_file(png_part(100), "general".to_string(), None, true)
            .await
            .unwrap();

        assert_eq!(file.storage_location, StorageLocation::Remote);
        assert_eq!(file.imagekit_file_id.as_deref(), Some("remote-123"));
        assert!(file.imagekit_url.is_some());
        assert!(file.imagekit_thumbnail_url.is_some());
    }

    #[tokio::test]
    async fn test_cdn_not_requested_stays_local() {
        let (service, _store, _dir) = service_with_cdn(Some(Arc::new(FakeCdn))).await;

        let file = service
            .store_file(png_part(100), "general".to_string(), None, false)
            .await
            .unwrap();
        assert_eq!(file.storage_location, StorageLocation::Local);
        assert!(file.imagekit_file_id.is_none());
    }

    #[tokio::test]
    async fn test_remove_file_deletes_bytes() {
        let (service, _store, dir) = service_with_cdn(None).await;

        let file = service
            .store_file(png_part(100), "general".to_string(), None, false)
            .await
            .unwrap();
        assert_eq!(files_on_disk(&dir), 1);

        let removed = service.remove_file(file.id).await.unwrap();
        assert_eq!(removed.map(|f| f.id), Some(file.id));
        assert_eq!(files_on_disk(&dir), 0);
    }

    #[tokio::test]
    async fn test_store_content_updates_resource_count() {
        let (service, store, _dir) = service_with_cdn(None).await;
        let algorithm = store
            .create_algorithm(NewAlgorithm {
                title: "Transformers".to_string(),
                description: "attention".to_string(),
                icon: None,
            })
            .await
            .unwrap();

        let content = service
            .store_content(algorithm.id, png_part(100), None, None, None)
            .await
            .unwrap();
        assert_eq!(content.title, "photo.png");
        assert_eq!(content.category, "tutorial");

        let reloaded = store.get_algorithm(algorithm.id).await.unwrap().unwrap();
        assert_eq!(reloaded.resource_count, 1);
    }

    #[tokio::test]
    async fn test_content_for_missing_algorithm_compensates_disk_write() {
        let (service, _store, dir) = service_with_cdn(None).await;

        let result = service
            .store_content(Uuid::new_v4(), png_part(100), None, None, None)
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        // The local write is rolled back, no orphan remains
        assert_eq!(files_on_disk(&dir), 0);
    }
}
