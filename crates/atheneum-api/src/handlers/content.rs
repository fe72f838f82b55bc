//! Algorithm content: file attachments uploaded through the pipeline.

use crate::auth::AdminContext;
use crate::error::HttpAppError;
use crate::services::read_upload_form;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_all_content(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let content = state.store.list_all_content().await?;
    Ok(Json(content))
}

pub async fn list_content(
    State(state): State<Arc<AppState>>,
    Path(algorithm_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let content = state.store.list_content_for(algorithm_id).await?;
    Ok(Json(content))
}

#[tracing::instrument(skip(state, _admin, multipart))]
pub async fn upload_content(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(algorithm_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let form = read_upload_form(multipart).await?;
    let title = form.field("title").map(str::to_string);
    let description = form.field("description").map(str::to_string);
    let category = form.field("category").map(str::to_string);
    let (file, _) = form.require_file()?;

    let content = state
        .uploads
        .store_content(algorithm_id, file, title, description, category)
        .await?;

    Ok((StatusCode::CREATED, Json(content)))
}

pub async fn delete_content(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    state.uploads.remove_content(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
