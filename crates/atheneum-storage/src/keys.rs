//! Randomized stored-name generation.
//!
//! Uploaded files are content-addressed by a random identifier plus the
//! original file's (sanitized) extension. The client-supplied name is never
//! used for the physical path, which makes aggressive immutable caching safe.

use std::path::Path;
use uuid::Uuid;

/// Maximum extension length kept on a stored name.
const MAX_EXTENSION_LEN: usize = 10;

/// Generate a collision-resistant stored name for an uploaded file.
///
/// The extension is taken from the original filename, lowercased and
/// restricted to alphanumerics; anything else (or a missing extension) yields
/// a bare identifier.
pub fn generate_stored_name(original_name: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    match sanitized_extension(original_name) {
        Some(ext) => format!("{}.{}", id, ext),
        None => id,
    }
}

fn sanitized_extension(original_name: &str) -> Option<String> {
    let ext = Path::new(original_name).extension()?.to_str()?.to_lowercase();
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_name_keeps_extension() {
        let name = generate_stored_name("lecture-01.PDF");
        assert!(name.ends_with(".pdf"));
        assert_eq!(name.len(), 32 + 4);
    }

    #[test]
    fn test_stored_name_without_extension() {
        let name = generate_stored_name("README");
        assert_eq!(name.len(), 32);
        assert!(!name.contains('.'));
    }

    #[test]
    fn test_stored_name_drops_hostile_extension() {
        let name = generate_stored_name("evil.p/../df");
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));
    }

    #[test]
    fn test_stored_names_are_unique() {
        let a = generate_stored_name("a.png");
        let b = generate_stored_name("a.png");
        assert_ne!(a, b);
    }
}
