//! Utility functions and helpers.

pub mod http;
pub mod text;

use url::Url;

pub use text::sanitize;

/// Normalize a user-entered link.
///
/// Blank input yields `None`. A missing scheme becomes `https://`; anything
/// other than http(s) or an unparsable link is rejected.
pub fn normalize_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_adds_scheme() {
        assert_eq!(
            normalize_url("example.com/cv.pdf"),
            Some("https://example.com/cv.pdf".to_string())
        );
        assert_eq!(
            normalize_url("  http://example.com  "),
            Some("http://example.com/".to_string())
        );
    }

    #[test]
    fn test_normalize_url_rejects() {
        assert_eq!(normalize_url(""), None);
        assert_eq!(normalize_url("   "), None);
        assert_eq!(normalize_url("ftp://example.com/cv.pdf"), None);
        assert_eq!(normalize_url("javascript://alert(1)"), None);
    }
}
