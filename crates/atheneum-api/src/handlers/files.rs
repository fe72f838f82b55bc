//! Generic file management through the upload pipeline.

use crate::auth::AdminContext;
use crate::error::HttpAppError;
use crate::services::read_upload_form;
use crate::state::AppState;
use atheneum_core::models::NewStoredFile;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListQuery {
    pub category: Option<String>,
    pub related_id: Option<Uuid>,
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FileListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let files = state
        .store
        .list_files(query.category.as_deref(), query.related_id)
        .await?;
    Ok((
        [(header::CACHE_CONTROL, "public, max-age=180")],
        Json(files),
    ))
}

#[tracing::instrument(skip(state, _admin, multipart))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let form = read_upload_form(multipart).await?;
    let category = form
        .field("category")
        .unwrap_or(NewStoredFile::DEFAULT_CATEGORY)
        .to_string();
    let related_id = form
        .field("relatedId")
        .and_then(|s| Uuid::parse_str(s).ok());
    let use_cdn = form
        .field("useImagekit")
        .or_else(|| form.field("useImageKit"))
        .is_some_and(|v| v == "true" || v == "1");
    let (file, _) = form.require_file()?;

    let stored = state
        .uploads
        .store_file(file, category, related_id, use_cdn)
        .await?;

    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    state.uploads.remove_file(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDeleteQuery {
    pub related_id: Option<Uuid>,
}

pub async fn delete_files_by_category(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(category): Path<String>,
    Query(query): Query<CategoryDeleteQuery>,
) -> Result<StatusCode, HttpAppError> {
    let removed = state
        .uploads
        .remove_files_by_category(&category, query.related_id)
        .await?;
    tracing::info!(category = %category, removed = removed, "Deleted files by category");
    Ok(StatusCode::NO_CONTENT)
}
