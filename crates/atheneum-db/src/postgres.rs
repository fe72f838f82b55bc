//! Postgres content store.
//!
//! sqlx-backed implementation of [`ContentStore`]. Multi-statement updates
//! (content insert/delete plus the `resource_count` recalculation) run inside
//! a transaction so the denormalized counter can never drift from the actual
//! row count.

use crate::store::ContentStore;
use async_trait::async_trait;
use atheneum_core::models::{
    Algorithm, AlgorithmContent, NewAlgorithm, NewAlgorithmContent, NewNote, NewProject,
    NewStoredFile, Note, NoteUpdate, Project, StoredFile,
};
use atheneum_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Relational [`ContentStore`] over a Postgres pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Recalculate the denormalized counter from the actual content rows.
    async fn recalculate_resource_count(
        tx: &mut Transaction<'_, Postgres>,
        algorithm_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE algorithms
            SET resource_count = (
                SELECT COUNT(*) FROM algorithm_content WHERE algorithm_id = $1
            )
            WHERE id = $1
            "#,
        )
        .bind(algorithm_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn list_algorithms(&self) -> Result<Vec<Algorithm>, AppError> {
        let rows = sqlx::query_as::<Postgres, Algorithm>(
            "SELECT * FROM algorithms ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_algorithm(&self, id: Uuid) -> Result<Option<Algorithm>, AppError> {
        let row = sqlx::query_as::<Postgres, Algorithm>("SELECT * FROM algorithms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_algorithm(&self, new: NewAlgorithm) -> Result<Algorithm, AppError> {
        let row = sqlx::query_as::<Postgres, Algorithm>(
            r#"
            INSERT INTO algorithms (id, title, description, icon, resource_count)
            VALUES ($1, $2, $3, $4, 0)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.icon_or_default())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_algorithm(&self, id: Uuid) -> Result<Vec<AlgorithmContent>, AppError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query_as::<Postgres, AlgorithmContent>(
            "SELECT * FROM algorithm_content WHERE algorithm_id = $1",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        // Content and notes go away via ON DELETE CASCADE.
        sqlx::query("DELETE FROM algorithms WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(removed)
    }

    async fn list_all_content(&self) -> Result<Vec<AlgorithmContent>, AppError> {
        let rows = sqlx::query_as::<Postgres, AlgorithmContent>(
            "SELECT * FROM algorithm_content ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_content_for(
        &self,
        algorithm_id: Uuid,
    ) -> Result<Vec<AlgorithmContent>, AppError> {
        let rows = sqlx::query_as::<Postgres, AlgorithmContent>(
            "SELECT * FROM algorithm_content WHERE algorithm_id = $1 ORDER BY created_at",
        )
        .bind(algorithm_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_content(&self, id: Uuid) -> Result<Option<AlgorithmContent>, AppError> {
        let row = sqlx::query_as::<Postgres, AlgorithmContent>(
            "SELECT * FROM algorithm_content WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_content(
        &self,
        new: NewAlgorithmContent,
    ) -> Result<AlgorithmContent, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM algorithms WHERE id = $1")
                .bind(new.algorithm_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(AppError::NotFound("Algorithm not found".to_string()));
        }

        let row = sqlx::query_as::<Postgres, AlgorithmContent>(
            r#"
            INSERT INTO algorithm_content
                (id, algorithm_id, title, description, file_name, file_type, file_size, file_path, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.algorithm_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.file_name)
        .bind(&new.file_type)
        .bind(new.file_size)
        .bind(&new.file_path)
        .bind(&new.category)
        .fetch_one(&mut *tx)
        .await?;

        Self::recalculate_resource_count(&mut tx, new.algorithm_id).await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn delete_content(&self, id: Uuid) -> Result<Option<AlgorithmContent>, AppError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query_as::<Postgres, AlgorithmContent>(
            "DELETE FROM algorithm_content WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(ref content) = removed {
            Self::recalculate_resource_count(&mut tx, content.algorithm_id).await?;
        }

        tx.commit().await?;
        Ok(removed)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        let rows =
            sqlx::query_as::<Postgres, Project>("SELECT * FROM projects ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    async fn create_project(&self, new: NewProject) -> Result<Project, AppError> {
        let row = sqlx::query_as::<Postgres, Project>(
            r#"
            INSERT INTO projects (id, title, description, category, year, tags, image_url, project_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.category)
        .bind(&new.year)
        .bind(&new.tags)
        .bind(&new.image_url)
        .bind(&new.project_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_project(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_files(
        &self,
        category: Option<&str>,
        related_id: Option<Uuid>,
    ) -> Result<Vec<StoredFile>, AppError> {
        let rows = sqlx::query_as::<Postgres, StoredFile>(
            r#"
            SELECT * FROM files
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::uuid IS NULL OR related_id = $2)
            ORDER BY created_at
            "#,
        )
        .bind(category)
        .bind(related_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_file(&self, id: Uuid) -> Result<Option<StoredFile>, AppError> {
        let row = sqlx::query_as::<Postgres, StoredFile>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_file_by_stored_name(
        &self,
        stored_name: &str,
    ) -> Result<Option<StoredFile>, AppError> {
        let row =
            sqlx::query_as::<Postgres, StoredFile>("SELECT * FROM files WHERE file_name = $1")
                .bind(stored_name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    async fn create_file(&self, new: NewStoredFile) -> Result<StoredFile, AppError> {
        let row = sqlx::query_as::<Postgres, StoredFile>(
            r#"
            INSERT INTO files
                (id, file_name, original_name, file_type, file_size, file_path, category,
                 related_id, uploaded_by, storage_location, imagekit_file_id, imagekit_url,
                 imagekit_thumbnail_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.file_name)
        .bind(&new.original_name)
        .bind(&new.file_type)
        .bind(new.file_size)
        .bind(&new.file_path)
        .bind(&new.category)
        .bind(new.related_id)
        .bind(NewStoredFile::DEFAULT_UPLOADER)
        .bind(new.storage_location)
        .bind(&new.imagekit_file_id)
        .bind(&new.imagekit_url)
        .bind(&new.imagekit_thumbnail_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_file(&self, id: Uuid) -> Result<Option<StoredFile>, AppError> {
        let removed =
            sqlx::query_as::<Postgres, StoredFile>("DELETE FROM files WHERE id = $1 RETURNING *")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(removed)
    }

    async fn delete_files_by_category(
        &self,
        category: &str,
        related_id: Option<Uuid>,
    ) -> Result<Vec<StoredFile>, AppError> {
        let removed = sqlx::query_as::<Postgres, StoredFile>(
            r#"
            DELETE FROM files
            WHERE category = $1
              AND ($2::uuid IS NULL OR related_id = $2)
            RETURNING *
            "#,
        )
        .bind(category)
        .bind(related_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(removed)
    }

    async fn list_notes(&self, algorithm_id: Uuid) -> Result<Vec<Note>, AppError> {
        let rows = sqlx::query_as::<Postgres, Note>(
            "SELECT * FROM notes WHERE algorithm_id = $1 ORDER BY created_at",
        )
        .bind(algorithm_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_note(&self, algorithm_id: Uuid, new: NewNote) -> Result<Note, AppError> {
        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM algorithms WHERE id = $1")
                .bind(algorithm_id)
                .fetch_optional(&self.pool)
                .await?;
        if exists.is_none() {
            return Err(AppError::NotFound("Algorithm not found".to_string()));
        }

        let row = sqlx::query_as::<Postgres, Note>(
            r#"
            INSERT INTO notes (id, title, content, algorithm_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&new.content)
        .bind(algorithm_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_note(&self, id: Uuid, update: NoteUpdate) -> Result<Option<Note>, AppError> {
        let row = sqlx::query_as::<Postgres, Note>(
            r#"
            UPDATE notes
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_note(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
