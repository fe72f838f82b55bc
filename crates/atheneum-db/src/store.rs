//! Content store abstraction.
//!
//! One trait, two implementations: [`crate::MemoryStore`] for single-process
//! development/tests and [`crate::PgStore`] for relational deployments. The
//! backend is chosen once at startup (presence of `DATABASE_URL`); handlers
//! only ever see `Arc<dyn ContentStore>`.

use async_trait::async_trait;
use atheneum_core::models::{
    Algorithm, AlgorithmContent, NewAlgorithm, NewAlgorithmContent, NewNote, NewProject,
    NewStoredFile, Note, NoteUpdate, Project, StoredFile,
};
use atheneum_core::AppError;
use uuid::Uuid;

/// CRUD surface over the catalog entities.
///
/// Delete operations return the removed record(s) where the caller must
/// cascade physical/remote cleanup; the store itself never touches file
/// storage. `resource_count` on algorithms is recalculated from an actual
/// count inside every content create/delete, never incremented blindly.
#[async_trait]
pub trait ContentStore: Send + Sync {
    // Algorithms
    async fn list_algorithms(&self) -> Result<Vec<Algorithm>, AppError>;
    async fn get_algorithm(&self, id: Uuid) -> Result<Option<Algorithm>, AppError>;
    async fn create_algorithm(&self, new: NewAlgorithm) -> Result<Algorithm, AppError>;
    /// Deletes the algorithm and (via cascade) its content and notes; returns
    /// the content rows that went away so files can be cleaned up.
    async fn delete_algorithm(&self, id: Uuid) -> Result<Vec<AlgorithmContent>, AppError>;

    // Algorithm content
    async fn list_all_content(&self) -> Result<Vec<AlgorithmContent>, AppError>;
    async fn list_content_for(
        &self,
        algorithm_id: Uuid,
    ) -> Result<Vec<AlgorithmContent>, AppError>;
    async fn get_content(&self, id: Uuid) -> Result<Option<AlgorithmContent>, AppError>;
    async fn create_content(
        &self,
        new: NewAlgorithmContent,
    ) -> Result<AlgorithmContent, AppError>;
    async fn delete_content(&self, id: Uuid) -> Result<Option<AlgorithmContent>, AppError>;

    // Projects
    async fn list_projects(&self) -> Result<Vec<Project>, AppError>;
    async fn create_project(&self, new: NewProject) -> Result<Project, AppError>;
    async fn delete_project(&self, id: Uuid) -> Result<(), AppError>;

    // Files
    async fn list_files(
        &self,
        category: Option<&str>,
        related_id: Option<Uuid>,
    ) -> Result<Vec<StoredFile>, AppError>;
    async fn get_file(&self, id: Uuid) -> Result<Option<StoredFile>, AppError>;
    async fn get_file_by_stored_name(
        &self,
        stored_name: &str,
    ) -> Result<Option<StoredFile>, AppError>;
    async fn create_file(&self, new: NewStoredFile) -> Result<StoredFile, AppError>;
    async fn delete_file(&self, id: Uuid) -> Result<Option<StoredFile>, AppError>;
    async fn delete_files_by_category(
        &self,
        category: &str,
        related_id: Option<Uuid>,
    ) -> Result<Vec<StoredFile>, AppError>;

    // Notes
    async fn list_notes(&self, algorithm_id: Uuid) -> Result<Vec<Note>, AppError>;
    async fn create_note(&self, algorithm_id: Uuid, new: NewNote) -> Result<Note, AppError>;
    async fn update_note(&self, id: Uuid, update: NoteUpdate) -> Result<Option<Note>, AppError>;
    async fn delete_note(&self, id: Uuid) -> Result<(), AppError>;
}
