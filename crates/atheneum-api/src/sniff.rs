//! Best-effort content-type sniffing.
//!
//! Fallback path for serving files that have no metadata record: the first
//! bytes are matched against well-known binary signatures. This is explicitly
//! not authoritative; the metadata-driven path always wins when a record
//! exists.

/// Bytes of file prefix needed for signature matching.
pub const SNIFF_PREFIX_LEN: usize = 8;

/// Match a file prefix against known signatures (PNG/JPEG/GIF/PDF).
pub fn sniff_content_type(prefix: &[u8]) -> Option<&'static str> {
    if prefix.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some("image/png")
    } else if prefix.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if prefix.starts_with(b"GIF") {
        Some("image/gif")
    } else if prefix.starts_with(b"%PDF") {
        Some("application/pdf")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_signature() {
        assert_eq!(
            sniff_content_type(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            Some("image/png")
        );
    }

    #[test]
    fn test_jpeg_signature() {
        assert_eq!(
            sniff_content_type(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some("image/jpeg")
        );
    }

    #[test]
    fn test_gif_signature() {
        assert_eq!(sniff_content_type(b"GIF89a"), Some("image/gif"));
    }

    #[test]
    fn test_pdf_signature() {
        assert_eq!(sniff_content_type(b"%PDF-1.7"), Some("application/pdf"));
    }

    #[test]
    fn test_unknown_signature() {
        assert_eq!(sniff_content_type(b"plain text"), None);
        assert_eq!(sniff_content_type(&[]), None);
    }

    #[test]
    fn test_truncated_prefix() {
        // Fewer bytes than any signature cannot match
        assert_eq!(sniff_content_type(&[0x89]), None);
    }
}
