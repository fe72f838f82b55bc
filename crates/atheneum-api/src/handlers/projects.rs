//! Project catalog CRUD.

use crate::auth::AdminContext;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use atheneum_core::models::NewProject;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let projects = state.store.list_projects().await?;
    Ok((
        [(header::CACHE_CONTROL, "public, max-age=600")],
        Json(projects),
    ))
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    ValidatedJson(new): ValidatedJson<NewProject>,
) -> Result<impl IntoResponse, HttpAppError> {
    let project = state.store.create_project(new).await?;
    tracing::info!(project_id = %project.id, title = %project.title, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    state.store.delete_project(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
