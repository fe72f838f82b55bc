//! In-memory content store.
//!
//! Map-backed implementation for single-process deployments and tests. All
//! maps live behind one `RwLock` so cross-entity updates (content create +
//! resource_count recalculation) stay atomic with respect to readers.

use crate::store::ContentStore;
use async_trait::async_trait;
use atheneum_core::models::{
    Algorithm, AlgorithmContent, NewAlgorithm, NewAlgorithmContent, NewNote, NewProject,
    NewStoredFile, Note, NoteUpdate, Project, StoredFile,
};
use atheneum_core::AppError;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    algorithms: HashMap<Uuid, Algorithm>,
    content: HashMap<Uuid, AlgorithmContent>,
    projects: HashMap<Uuid, Project>,
    files: HashMap<Uuid, StoredFile>,
    notes: HashMap<Uuid, Note>,
}

impl Inner {
    /// Recalculate the denormalized counter from the actual content rows.
    fn recalculate_resource_count(&mut self, algorithm_id: Uuid) {
        let count = self
            .content
            .values()
            .filter(|c| c.algorithm_id == algorithm_id)
            .count() as i32;
        if let Some(algorithm) = self.algorithms.get_mut(&algorithm_id) {
            algorithm.resource_count = count;
        }
    }
}

/// Map-backed [`ContentStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_created<T, F>(mut items: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<Utc>,
{
    items.sort_by_key(|item| created_at(item));
    items
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list_algorithms(&self) -> Result<Vec<Algorithm>, AppError> {
        let inner = self.inner.read().await;
        Ok(sorted_by_created(
            inner.algorithms.values().cloned().collect(),
            |a| a.created_at,
        ))
    }

    async fn get_algorithm(&self, id: Uuid) -> Result<Option<Algorithm>, AppError> {
        Ok(self.inner.read().await.algorithms.get(&id).cloned())
    }

    async fn create_algorithm(&self, new: NewAlgorithm) -> Result<Algorithm, AppError> {
        let algorithm = Algorithm {
            id: Uuid::new_v4(),
            icon: new.icon_or_default(),
            title: new.title,
            description: new.description,
            resource_count: 0,
            created_at: Utc::now(),
        };
        self.inner
            .write()
            .await
            .algorithms
            .insert(algorithm.id, algorithm.clone());
        Ok(algorithm)
    }

    async fn delete_algorithm(&self, id: Uuid) -> Result<Vec<AlgorithmContent>, AppError> {
        let mut inner = self.inner.write().await;
        inner.algorithms.remove(&id);

        let removed: Vec<AlgorithmContent> = inner
            .content
            .values()
            .filter(|c| c.algorithm_id == id)
            .cloned()
            .collect();
        for content in &removed {
            inner.content.remove(&content.id);
        }
        inner.notes.retain(|_, note| note.algorithm_id != id);
        Ok(removed)
    }

    async fn list_all_content(&self) -> Result<Vec<AlgorithmContent>, AppError> {
        let inner = self.inner.read().await;
        Ok(sorted_by_created(
            inner.content.values().cloned().collect(),
            |c| c.created_at,
        ))
    }

    async fn list_content_for(
        &self,
        algorithm_id: Uuid,
    ) -> Result<Vec<AlgorithmContent>, AppError> {
        let inner = self.inner.read().await;
        Ok(sorted_by_created(
            inner
                .content
                .values()
                .filter(|c| c.algorithm_id == algorithm_id)
                .cloned()
                .collect(),
            |c| c.created_at,
        ))
    }

    async fn get_content(&self, id: Uuid) -> Result<Option<AlgorithmContent>, AppError> {
        Ok(self.inner.read().await.content.get(&id).cloned())
    }

    async fn create_content(
        &self,
        new: NewAlgorithmContent,
    ) -> Result<AlgorithmContent, AppError> {
        let mut inner = self.inner.write().await;
        if !inner.algorithms.contains_key(&new.algorithm_id) {
            return Err(AppError::NotFound("Algorithm not found".to_string()));
        }

        let content = AlgorithmContent {
            id: Uuid::new_v4(),
            algorithm_id: new.algorithm_id,
            title: new.title,
            description: new.description,
            file_name: new.file_name,
            file_type: new.file_type,
            file_size: new.file_size,
            file_path: new.file_path,
            category: new.category,
            created_at: Utc::now(),
        };
        inner.content.insert(content.id, content.clone());
        inner.recalculate_resource_count(content.algorithm_id);
        Ok(content)
    }

    async fn delete_content(&self, id: Uuid) -> Result<Option<AlgorithmContent>, AppError> {
        let mut inner = self.inner.write().await;
        let removed = inner.content.remove(&id);
        if let Some(ref content) = removed {
            inner.recalculate_resource_count(content.algorithm_id);
        }
        Ok(removed)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        let inner = self.inner.read().await;
        Ok(sorted_by_created(
            inner.projects.values().cloned().collect(),
            |p| p.created_at,
        ))
    }

    async fn create_project(&self, new: NewProject) -> Result<Project, AppError> {
        let project = Project {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            category: new.category,
            year: new.year,
            tags: new.tags,
            image_url: new.image_url,
            project_url: new.project_url,
            created_at: Utc::now(),
        };
        self.inner
            .write()
            .await
            .projects
            .insert(project.id, project.clone());
        Ok(project)
    }

    async fn delete_project(&self, id: Uuid) -> Result<(), AppError> {
        self.inner.write().await.projects.remove(&id);
        Ok(())
    }

    async fn list_files(
        &self,
        category: Option<&str>,
        related_id: Option<Uuid>,
    ) -> Result<Vec<StoredFile>, AppError> {
        let inner = self.inner.read().await;
        Ok(sorted_by_created(
            inner
                .files
                .values()
                .filter(|f| category.is_none_or(|c| f.category == c))
                .filter(|f| related_id.is_none_or(|r| f.related_id == Some(r)))
                .cloned()
                .collect(),
            |f| f.created_at,
        ))
    }

    async fn get_file(&self, id: Uuid) -> Result<Option<StoredFile>, AppError> {
        Ok(self.inner.read().await.files.get(&id).cloned())
    }

    async fn get_file_by_stored_name(
        &self,
        stored_name: &str,
    ) -> Result<Option<StoredFile>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .files
            .values()
            .find(|f| f.file_name == stored_name)
            .cloned())
    }

    async fn create_file(&self, new: NewStoredFile) -> Result<StoredFile, AppError> {
        let file = StoredFile {
            id: Uuid::new_v4(),
            file_name: new.file_name,
            original_name: new.original_name,
            file_type: new.file_type,
            file_size: new.file_size,
            file_path: new.file_path,
            category: new.category,
            related_id: new.related_id,
            uploaded_by: NewStoredFile::DEFAULT_UPLOADER.to_string(),
            storage_location: new.storage_location,
            imagekit_file_id: new.imagekit_file_id,
            imagekit_url: new.imagekit_url,
            imagekit_thumbnail_url: new.imagekit_thumbnail_url,
            created_at: Utc::now(),
        };
        self.inner.write().await.files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn delete_file(&self, id: Uuid) -> Result<Option<StoredFile>, AppError> {
        Ok(self.inner.write().await.files.remove(&id))
    }

    async fn delete_files_by_category(
        &self,
        category: &str,
        related_id: Option<Uuid>,
    ) -> Result<Vec<StoredFile>, AppError> {
        let mut inner = self.inner.write().await;
        let removed: Vec<StoredFile> = inner
            .files
            .values()
            .filter(|f| f.category == category)
            .filter(|f| related_id.is_none_or(|r| f.related_id == Some(r)))
            .cloned()
            .collect();
        for file in &removed {
            inner.files.remove(&file.id);
        }
        Ok(removed)
    }

    async fn list_notes(&self, algorithm_id: Uuid) -> Result<Vec<Note>, AppError> {
        let inner = self.inner.read().await;
        Ok(sorted_by_created(
            inner
                .notes
                .values()
                .filter(|n| n.algorithm_id == algorithm_id)
                .cloned()
                .collect(),
            |n| n.created_at,
        ))
    }

    async fn create_note(&self, algorithm_id: Uuid, new: NewNote) -> Result<Note, AppError> {
        let mut inner = self.inner.write().await;
        if !inner.algorithms.contains_key(&algorithm_id) {
            return Err(AppError::NotFound("Algorithm not found".to_string()));
        }

        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            title: new.title,
            content: new.content,
            algorithm_id,
            created_at: now,
            updated_at: now,
        };
        inner.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn update_note(&self, id: Uuid, update: NoteUpdate) -> Result<Option<Note>, AppError> {
        let mut inner = self.inner.write().await;
        let Some(note) = inner.notes.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = update.title {
            note.title = title;
        }
        if let Some(content) = update.content {
            note.content = content;
        }
        note.updated_at = Utc::now();
        Ok(Some(note.clone()))
    }

    async fn delete_note(&self, id: Uuid) -> Result<(), AppError> {
        self.inner.write().await.notes.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atheneum_core::models::StorageLocation;

    fn new_algorithm(title: &str) -> NewAlgorithm {
        NewAlgorithm {
            title: title.to_string(),
            description: "desc".to_string(),
            icon: None,
        }
    }

    fn new_content(algorithm_id: Uuid, title: &str) -> NewAlgorithmContent {
        NewAlgorithmContent {
            algorithm_id,
            title: title.to_string(),
            description: None,
            file_name: format!("{}.pdf", Uuid::new_v4().simple()),
            file_type: "application/pdf".to_string(),
            file_size: 42,
            file_path: "uploads".to_string(),
            category: NewAlgorithmContent::DEFAULT_CATEGORY.to_string(),
        }
    }

    fn new_file(category: &str, related_id: Option<Uuid>) -> NewStoredFile {
        NewStoredFile {
            file_name: format!("{}.png", Uuid::new_v4().simple()),
            original_name: "photo.png".to_string(),
            file_type: "image/png".to_string(),
            file_size: 10,
            file_path: "uploads".to_string(),
            category: category.to_string(),
            related_id,
            storage_location: StorageLocation::Local,
            imagekit_file_id: None,
            imagekit_url: None,
            imagekit_thumbnail_url: None,
        }
    }

    #[tokio::test]
    async fn test_resource_count_tracks_content() {
        let store = MemoryStore::new();
        let algorithm = store
            .create_algorithm(new_algorithm("Backprop"))
            .await
            .unwrap();
        assert_eq!(algorithm.resource_count, 0);

        let c1 = store
            .create_content(new_content(algorithm.id, "slides"))
            .await
            .unwrap();
        let _c2 = store
            .create_content(new_content(algorithm.id, "notes"))
            .await
            .unwrap();

        let reloaded = store.get_algorithm(algorithm.id).await.unwrap().unwrap();
        assert_eq!(reloaded.resource_count, 2);

        store.delete_content(c1.id).await.unwrap();
        let reloaded = store.get_algorithm(algorithm.id).await.unwrap().unwrap();
        assert_eq!(reloaded.resource_count, 1);

        // Deleting a missing content row never drives the counter negative
        store.delete_content(Uuid::new_v4()).await.unwrap();
        let reloaded = store.get_algorithm(algorithm.id).await.unwrap().unwrap();
        assert_eq!(reloaded.resource_count, 1);
    }

    #[tokio::test]
    async fn test_delete_algorithm_cascades() {
        let store = MemoryStore::new();
        let algorithm = store.create_algorithm(new_algorithm("CNNs")).await.unwrap();
        store
            .create_content(new_content(algorithm.id, "lecture"))
            .await
            .unwrap();
        store
            .create_note(
                algorithm.id,
                NewNote {
                    title: "todo".to_string(),
                    content: "revisit pooling".to_string(),
                },
            )
            .await
            .unwrap();

        let removed = store.delete_algorithm(algorithm.id).await.unwrap();
        assert_eq!(removed.len(), 1);
        assert!(store.get_algorithm(algorithm.id).await.unwrap().is_none());
        assert!(store.list_all_content().await.unwrap().is_empty());
        assert!(store.list_notes(algorithm.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_content_for_missing_algorithm_rejected() {
        let store = MemoryStore::new();
        let result = store.create_content(new_content(Uuid::new_v4(), "x")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_file_filters() {
        let store = MemoryStore::new();
        let related = Uuid::new_v4();
        store.create_file(new_file("algorithm", Some(related))).await.unwrap();
        store.create_file(new_file("algorithm", None)).await.unwrap();
        store.create_file(new_file("project", None)).await.unwrap();

        assert_eq!(store.list_files(None, None).await.unwrap().len(), 3);
        assert_eq!(
            store.list_files(Some("algorithm"), None).await.unwrap().len(),
            2
        );
        assert_eq!(
            store
                .list_files(Some("algorithm"), Some(related))
                .await
                .unwrap()
                .len(),
            1
        );

        let removed = store
            .delete_files_by_category("algorithm", None)
            .await
            .unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(store.list_files(None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_file_by_stored_name() {
        let store = MemoryStore::new();
        let file = store.create_file(new_file("general", None)).await.unwrap();

        let found = store
            .get_file_by_stored_name(&file.file_name)
            .await
            .unwrap();
        assert_eq!(found.map(|f| f.id), Some(file.id));
        assert!(store
            .get_file_by_stored_name("missing.bin")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_note_update_bumps_timestamp() {
        let store = MemoryStore::new();
        let algorithm = store.create_algorithm(new_algorithm("RNNs")).await.unwrap();
        let note = store
            .create_note(
                algorithm.id,
                NewNote {
                    title: "draft".to_string(),
                    content: "first".to_string(),
                },
            )
            .await
            .unwrap();

        let updated = store
            .update_note(
                note.id,
                NoteUpdate {
                    title: None,
                    content: Some("second".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "draft");
        assert_eq!(updated.content, "second");
        assert!(updated.updated_at >= note.updated_at);

        assert!(store
            .update_note(Uuid::new_v4(), NoteUpdate { title: None, content: None })
            .await
            .unwrap()
            .is_none());
    }
}
