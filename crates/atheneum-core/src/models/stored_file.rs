use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where the physical bytes of an uploaded file live.
///
/// Local disk is always written first as the durability baseline; `Remote`
/// means the file was additionally offloaded to the CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "storage_location", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum StorageLocation {
    Local,
    Remote,
}

/// Metadata record for a generic uploaded file.
///
/// `file_name` is the randomized stored name used for physical storage and
/// public addressing; the client-supplied name survives only in
/// `original_name`. The CDN fields are populated when `storage_location` is
/// `Remote`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: Uuid,
    pub file_name: String,
    pub original_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub file_path: String,
    pub category: String,
    pub related_id: Option<Uuid>,
    pub uploaded_by: String,
    pub storage_location: StorageLocation,
    pub imagekit_file_id: Option<String>,
    pub imagekit_url: Option<String>,
    pub imagekit_thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a stored file. Built by the upload pipeline after the
/// physical write succeeded.
#[derive(Debug, Clone)]
pub struct NewStoredFile {
    pub file_name: String,
    pub original_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub file_path: String,
    pub category: String,
    pub related_id: Option<Uuid>,
    pub storage_location: StorageLocation,
    pub imagekit_file_id: Option<String>,
    pub imagekit_url: Option<String>,
    pub imagekit_thumbnail_url: Option<String>,
}

impl NewStoredFile {
    pub const DEFAULT_CATEGORY: &'static str = "general";
    pub const DEFAULT_UPLOADER: &'static str = "admin";
}
