//! Blob-store conventions for recipe images.
//!
//! Images live in the `images` table and are referenced from recipes by
//! their uuid. A storage reference resolves to a plain HTTP URL served by
//! `GET /api/images/{id}`.

use uuid::Uuid;

/// Maximum accepted upload size in bytes.
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// How long an issued upload ticket stays valid.
pub const UPLOAD_TICKET_TTL_MINUTES: i64 = 60;

/// Fetchable URL for a stored image blob.
pub fn url(base_url: &str, storage_id: Uuid) -> String {
    format!("{}/api/images/{}", base_url.trim_end_matches('/'), storage_id)
}

/// Single-use upload destination for a freshly issued ticket.
pub fn upload_url(base_url: &str, ticket: Uuid) -> String {
    format!(
        "{}/api/images/upload/{}",
        base_url.trim_end_matches('/'),
        ticket
    )
}

/// Only image payloads are accepted; the client-declared content type is
/// stored and echoed back verbatim when serving.
pub fn is_supported_content_type(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_tolerates_trailing_slash_in_base() {
        let id = Uuid::new_v4();
        assert_eq!(
            url("http://localhost:3000/", id),
            format!("http://localhost:3000/api/images/{id}")
        );
    }

    #[test]
    fn content_type_gate() {
        assert!(is_supported_content_type("image/jpeg"));
        assert!(is_supported_content_type("image/png"));
        assert!(!is_supported_content_type("text/html"));
        assert!(!is_supported_content_type("application/octet-stream"));
    }
}
