//! Remote-CDN passthrough endpoints.
//!
//! Thin delegation to the ImageKit client; every route answers 503 with
//! `CDN_NOT_CONFIGURED` when the CDN environment variables are absent. The
//! optimize redirect is the only anonymous route in the group.

use crate::auth::AdminContext;
use crate::error::HttpAppError;
use crate::services::read_upload_form;
use crate::state::AppState;
use atheneum_core::AppError;
use atheneum_storage::{CdnUploadOptions, ImageKitClient, TransformOptions};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

fn cdn(state: &AppState) -> Result<&Arc<ImageKitClient>, AppError> {
    state.cdn.as_ref().ok_or(AppError::CdnNotConfigured)
}

/// Client-upload auth parameters plus the public configuration the browser
/// needs to talk to the CDN directly.
pub async fn cdn_auth(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let client = cdn(&state)?;
    let params = client.auth_params();
    Ok(Json(serde_json::json!({
        "token": params.token,
        "expire": params.expire,
        "signature": params.signature,
        "configured": true,
        "publicKey": client.public_key(),
        "urlEndpoint": client.url_endpoint(),
    })))
}

pub async fn cdn_upload(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let client = cdn(&state)?.clone();

    let form = read_upload_form(multipart).await?;
    let folder = format!(
        "{}/{}",
        crate::constants::CDN_FOLDER_PREFIX,
        form.field("folder").unwrap_or("uploads")
    );
    let tags: Vec<String> = form
        .field("tags")
        .map(|t| t.split(',').map(|s| s.trim().to_string()).collect())
        .unwrap_or_else(|| vec!["upload".to_string()]);
    let (file, _) = form.require_file()?;

    state.uploads.validate(&file)?;

    let result = client
        .upload(
            &file.original_name,
            file.data,
            CdnUploadOptions {
                folder: Some(folder),
                tags,
            },
        )
        .await
        .map_err(HttpAppError::from)?;

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct OptimizeQuery {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u32>,
    pub format: Option<String>,
}

/// Redirect to a CDN transformation URL. Anonymous: these URLs end up in
/// `<img>` tags.
pub async fn cdn_optimize(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    Query(query): Query<OptimizeQuery>,
) -> Result<Redirect, HttpAppError> {
    let client = cdn(&state)?;
    let url = client.transform_url(
        &path,
        &TransformOptions {
            width: query.width,
            height: query.height,
            quality: query.quality,
            format: query.format,
        },
    );
    Ok(Redirect::temporary(&url))
}

pub async fn cdn_delete(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Path(file_id): Path<String>,
) -> Result<StatusCode, HttpAppError> {
    let client = cdn(&state)?;
    client.delete_file(&file_id).await.map_err(HttpAppError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CdnListQuery {
    #[serde(default)]
    pub skip: u32,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub folder: Option<String>,
}

pub async fn cdn_list_files(
    State(state): State<Arc<AppState>>,
    _admin: AdminContext,
    Query(query): Query<CdnListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let client = cdn(&state)?;
    let files = client
        .list_files(
            query.skip,
            query.limit.unwrap_or(20),
            query.search.as_deref(),
            query.folder.as_deref(),
        )
        .await
        .map_err(HttpAppError::from)?;
    Ok(Json(files))
}
