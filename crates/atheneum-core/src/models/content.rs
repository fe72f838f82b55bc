use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// A file attached to an algorithm (tutorial, slides, sample code, ...).
///
/// `file_name` is the randomized stored name; `title` doubles as the
/// user-facing original name when the content is downloaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmContent {
    pub id: Uuid,
    pub algorithm_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub file_path: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for algorithm content. Built by the upload pipeline, never
/// directly from a request body.
#[derive(Debug, Clone)]
pub struct NewAlgorithmContent {
    pub algorithm_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub file_path: String,
    pub category: String,
}

impl NewAlgorithmContent {
    pub const DEFAULT_CATEGORY: &'static str = "tutorial";
}
