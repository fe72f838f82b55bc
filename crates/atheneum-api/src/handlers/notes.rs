//! Notes attached to algorithms.

use crate::auth::AdminContext;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use atheneum_core::models::{NewNote, Note, NoteUpdate};
use atheneum_core::AppError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    Path(algorithm_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let notes = state.store.list_notes(algorithm_id).await?;
    Ok(Json(notes))
}

pub async fn create_note(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(algorithm_id): Path<Uuid>,
    ValidatedJson(new): ValidatedJson<NewNote>,
) -> Result<impl IntoResponse, HttpAppError> {
    let note = state.store.create_note(algorithm_id, new).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_note(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(id): Path<Uuid>,
    ValidatedJson(update): ValidatedJson<NoteUpdate>,
) -> Result<Json<Note>, HttpAppError> {
    let note = state
        .store
        .update_note(id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("Note not found".to_string()))?;
    Ok(Json(note))
}

pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    state.store.delete_note(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
