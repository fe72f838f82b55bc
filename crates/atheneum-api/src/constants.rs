//! Shared constants for the API crate.

/// Folder prefix for CDN-side organization; the upload category is appended.
pub const CDN_FOLDER_PREFIX: &str = "/atheneum";

/// Tag attached to every server-side CDN upload.
pub const CDN_UPLOAD_TAG: &str = "uploaded-file";

/// Multipart field name carrying the file bytes.
pub const UPLOAD_FILE_FIELD: &str = "file";

/// Extra request-body headroom over the file-size ceiling for multipart
/// boundaries and text fields.
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;
