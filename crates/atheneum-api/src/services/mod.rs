//! Application services.

pub mod upload;

pub use upload::{read_upload_form, FilePart, RemoteCdn, UploadForm, UploadService};
