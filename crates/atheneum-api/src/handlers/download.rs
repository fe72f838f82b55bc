//! Retrieval service: attachment downloads and inline file serving.
//!
//! Download resolution crosses two logical namespaces: generic files first,
//! then algorithm content, unified behind one endpoint. Inline serving of
//! `/uploads/{stored_name}` is metadata-driven; when no record exists the
//! content type falls back to signature sniffing, a best-effort path that is
//! never authoritative.

use crate::error::HttpAppError;
use crate::sniff::{sniff_content_type, SNIFF_PREFIX_LEN};
use crate::state::AppState;
use atheneum_core::AppError;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::sync::Arc;
use uuid::Uuid;

/// A file resolved to its serving metadata, whichever namespace it came from.
struct ResolvedFile {
    stored_name: String,
    original_name: String,
    content_type: String,
    size: i64,
    created_at: DateTime<Utc>,
}

async fn resolve(state: &AppState, file_id: Uuid) -> Result<ResolvedFile, AppError> {
    if let Some(file) = state.store.get_file(file_id).await? {
        return Ok(ResolvedFile {
            stored_name: file.file_name,
            original_name: file.original_name,
            content_type: file.file_type,
            size: file.file_size,
            created_at: file.created_at,
        });
    }

    // Not a generic file: search the algorithm-content namespace. The content
    // title doubles as the user-facing filename.
    if let Some(content) = state.store.get_content(file_id).await? {
        return Ok(ResolvedFile {
            stored_name: content.file_name,
            original_name: content.title,
            content_type: content.file_type,
            size: content.file_size,
            created_at: content.created_at,
        });
    }

    Err(AppError::NotFound("File not found".to_string()))
}

fn http_date(when: DateTime<Utc>) -> String {
    when.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn body_from_storage(stream: atheneum_storage::ByteStream) -> Body {
    Body::from_stream(
        stream.map(|result| result.map_err(|e| std::io::Error::other(e.to_string()))),
    )
}

/// `GET /api/download/{file_id}` - forced attachment download.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<Uuid>,
) -> Result<Response, HttpAppError> {
    let file = resolve(&state, file_id).await?;

    if !state
        .storage
        .exists(&file.stored_name)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?
    {
        tracing::error!(stored_name = %file.stored_name, "Physical file missing for metadata record");
        return Err(AppError::NotFound("Physical file not found".to_string()).into());
    }

    let stream = state
        .storage
        .read_stream(&file.stored_name)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let encoded_name = utf8_percent_encode(&file.original_name, NON_ALPHANUMERIC);
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, file.content_type)
        .header(header::CONTENT_LENGTH, file.size.to_string())
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::LAST_MODIFIED, http_date(file.created_at))
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename*=UTF-8''{}", encoded_name),
        )
        .body(body_from_storage(stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

/// `GET /uploads/{stored_name}` - inline serving by stored name.
pub async fn serve_upload(
    State(state): State<Arc<AppState>>,
    Path(stored_name): Path<String>,
) -> Result<Response, HttpAppError> {
    if !state
        .storage
        .exists(&stored_name)
        .await
        .map_err(|e| AppError::InvalidInput(e.to_string()))?
    {
        return Err(AppError::NotFound("File not found".to_string()).into());
    }

    let metadata = state.store.get_file_by_stored_name(&stored_name).await?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CACHE_CONTROL, "public, max-age=31536000")
        .header(header::ACCEPT_RANGES, "bytes");

    match metadata {
        Some(file) => {
            let encoded_name = utf8_percent_encode(&file.original_name, NON_ALPHANUMERIC);
            builder = builder
                .header(header::CONTENT_TYPE, file.file_type)
                .header(
                    header::CONTENT_DISPOSITION,
                    format!("inline; filename*=UTF-8''{}", encoded_name),
                );
        }
        None => {
            // Best-effort: sniff the signature, then guess from the extension.
            let prefix = state
                .storage
                .read_prefix(&stored_name, SNIFF_PREFIX_LEN)
                .await
                .map_err(|e| AppError::Storage(e.to_string()))?;
            let content_type = sniff_content_type(&prefix)
                .or_else(|| mime_guess::from_path(&stored_name).first_raw())
                .unwrap_or("application/octet-stream");
            tracing::debug!(
                stored_name = %stored_name,
                content_type = %content_type,
                "Serving file without metadata record via signature sniffing"
            );
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
    }

    let stream = state
        .storage
        .read_stream(&stored_name)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let response = builder
        .body(body_from_storage(stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
