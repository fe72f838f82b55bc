//! Atheneum Storage Library
//!
//! Physical file storage for uploaded content: the [`FileStorage`] trait with
//! its local-disk implementation, randomized stored-name generation, and the
//! ImageKit remote-CDN client.

pub mod imagekit;
pub mod keys;
pub mod local;
pub mod traits;

pub use imagekit::{
    CdnAuthParams, CdnError, CdnUploadOptions, CdnUploadResult, ImageKitClient, TransformOptions,
};
pub use keys::generate_stored_name;
pub use local::LocalStorage;
pub use traits::{ByteStream, FileStorage, StorageError, StorageResult};
