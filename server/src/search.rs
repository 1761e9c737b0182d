//! Escaping for ILIKE title search.

/// Escape LIKE metacharacters so a search term matches literally.
pub fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_terms_pass_through() {
        assert_eq!(escape_like("chicken soup"), "chicken soup");
    }

    #[test]
    fn metacharacters_are_escaped() {
        assert_eq!(escape_like("100%_done"), "100\\%\\_done");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
