//! Content helpers shared by models and page builders.
//!
//! Small string/HTML heuristics: tag stripping, first-image extraction,
//! character-bounded truncation, slug generation, and date formatting.

mod render;

pub use render::{ContentType, markdown_to_html, read_time_minutes, rendered_content, word_count};

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

#[allow(clippy::expect_used)]
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("static pattern compiles"));

#[allow(clippy::expect_used)]
static FIRST_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<img[^>]*\ssrc\s*=\s*["']([^"']+)["']"#).expect("static pattern compiles")
});

/// Remove all HTML tags from the input, leaving text content only.
pub fn strip_html_tags(input: &str) -> String {
    TAG_RE.replace_all(input, "").to_string()
}

/// Find the `src` of the first `<img>` tag in an HTML fragment.
pub fn find_first_image(html: &str) -> Option<String> {
    FIRST_IMAGE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Truncate a string to at most `max` characters (not bytes).
///
/// Multi-byte text is never split mid-character.
pub fn truncate_chars(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        input.to_string()
    } else {
        input.chars().take(max).collect()
    }
}

/// Convert text into a URL-safe slug.
///
/// Transforms to lowercase, replaces non-alphanumeric characters with hyphens,
/// collapses consecutive hyphens, and trims leading/trailing hyphens.
pub fn slugify(text: &str) -> String {
    let mapped: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();

    let mut result = String::with_capacity(mapped.len());
    let mut prev_was_hyphen = true; // Start true to skip leading hyphens
    for c in mapped.chars() {
        if c == '-' {
            if !prev_was_hyphen {
                result.push('-');
            }
            prev_was_hyphen = true;
        } else {
            result.push(c);
            prev_was_hyphen = false;
        }
    }

    while result.ends_with('-') {
        result.pop();
    }

    result
}

/// Format a publish date for display, e.g. "January 5, 2026".
pub fn format_publish_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn strip_tags_leaves_text() {
        assert_eq!(strip_html_tags("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn strip_tags_handles_multiline_tags() {
        assert_eq!(strip_html_tags("<div\nclass=\"x\">text</div>"), "text");
    }

    #[test]
    fn first_image_extracts_src() {
        let html =
            r#"<p>intro</p><img alt="x" src="/files/cover.png"><img src="/files/second.png">"#;
        assert_eq!(find_first_image(html), Some("/files/cover.png".to_string()));
    }

    #[test]
    fn first_image_none_without_images() {
        assert_eq!(find_first_image("<p>no pictures here</p>"), None);
    }

    #[test]
    fn truncate_is_char_boundary_safe() {
        let truncated = truncate_chars("héllo wörld", 4);
        assert_eq!(truncated, "héll");
    }

    #[test]
    fn truncate_leaves_short_strings_alone() {
        assert_eq!(truncate_chars("short", 200), "short");
    }

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
    }

    #[test]
    fn slugify_collapses_and_trims_hyphens() {
        assert_eq!(slugify("--A  B__C--"), "a-b-c");
    }

    #[test]
    fn publish_date_format() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(format_publish_date(date), "January 5, 2026");
    }
}
