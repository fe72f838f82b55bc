//! Algorithm catalog CRUD.

use crate::auth::AdminContext;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use atheneum_core::models::{Algorithm, NewAlgorithm};
use atheneum_core::AppError;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_algorithms(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let algorithms = state.store.list_algorithms().await?;
    Ok((
        [(header::CACHE_CONTROL, "public, max-age=300")],
        Json(algorithms),
    ))
}

pub async fn get_algorithm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Algorithm>, HttpAppError> {
    let algorithm = state
        .store
        .get_algorithm(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Algorithm not found".to_string()))?;
    Ok(Json(algorithm))
}

pub async fn create_algorithm(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    ValidatedJson(new): ValidatedJson<NewAlgorithm>,
) -> Result<impl IntoResponse, HttpAppError> {
    let algorithm = state.store.create_algorithm(new).await?;
    tracing::info!(algorithm_id = %algorithm.id, title = %algorithm.title, "Algorithm created");
    Ok((StatusCode::CREATED, Json(algorithm)))
}

pub async fn delete_algorithm(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    state.uploads.remove_algorithm(id).await?;
    tracing::info!(algorithm_id = %id, "Algorithm deleted");
    Ok(StatusCode::NO_CONTENT)
}
