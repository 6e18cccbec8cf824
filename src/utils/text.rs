//! Free-text cleanup before display.

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").ok());

static TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)</?[A-Za-z][^>]*>").ok());

/// Strip markup from user-provided text.
///
/// Script and style blocks are removed with their content; any other tag
/// is dropped and its text kept.
pub fn sanitize(input: &str) -> String {
    if !input.contains('<') {
        return input.to_string();
    }
    let mut text = input.to_string();
    for pattern in [&*SCRIPT_BLOCK, &*TAG].into_iter().flatten() {
        text = pattern.replace_all(&text, "").into_owned();
    }
    text
}

/// Collapse runs of whitespace and trim.
pub fn squish(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(sanitize("Senior Rust Developer"), "Senior Rust Developer");
        assert_eq!(sanitize("salary 1000 > 900"), "salary 1000 > 900");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_scripts_removed_with_content() {
        let input = "Great job<script>alert('x')</script> in Tirana";
        assert_eq!(sanitize(input), "Great job in Tirana");

        let input = "<STYLE type=\"text/css\">body{}</STYLE>Hello";
        assert_eq!(sanitize(input), "Hello");
    }

    #[test]
    fn test_tags_stripped_text_kept() {
        assert_eq!(
            sanitize("<p>We offer <b>remote</b> work</p>"),
            "We offer remote work"
        );
        assert_eq!(sanitize("<img src=x onerror=alert(1)>ok"), "ok");
        assert_eq!(sanitize("a < b"), "a < b");
    }

    #[test]
    fn test_squish() {
        assert_eq!(squish("  rust \n  developer\t"), "rust developer");
        assert_eq!(squish("   "), "");
    }
}
