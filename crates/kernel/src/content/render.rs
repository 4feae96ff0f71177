//! Content rendering based on the post's content-type discriminator.
//!
//! Posts carry three content columns (rich text, Markdown, raw HTML) and a
//! `content_type` flag selecting which one is authoritative. Rendering picks
//! the right column, converts Markdown via pulldown-cmark, and sanitizes the
//! result with ammonia before it reaches a template.

use pulldown_cmark::{Options, Parser, html};
use serde::{Deserialize, Serialize};

use super::strip_html_tags;

/// Words-per-minute rate used for read-time estimation.
const WORDS_PER_MINUTE: usize = 250;

/// Which content column is authoritative for a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    RichText,
    Markdown,
    Html,
}

impl ContentType {
    /// Parse the stored discriminator. Unknown values fall back to rich text,
    /// which reads the plain `content` column.
    pub fn parse(value: &str) -> Self {
        match value {
            "markdown" => Self::Markdown,
            "html" => Self::Html,
            _ => Self::RichText,
        }
    }

    /// Machine name stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RichText => "rich_text",
            Self::Markdown => "markdown",
            Self::Html => "html",
        }
    }
}

/// Render a Markdown string to HTML.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);

    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Select and render the authoritative content column, sanitized for output.
///
/// Mirrors the column layout of `blog_post`: `content` holds editor rich
/// text, `content_md` Markdown source, `content_html` raw HTML.
pub fn rendered_content(
    content: Option<&str>,
    content_md: Option<&str>,
    content_html: Option<&str>,
    content_type: ContentType,
) -> String {
    let raw = match content_type {
        ContentType::Markdown => markdown_to_html(content_md.unwrap_or_default()),
        ContentType::Html => content_html.unwrap_or_default().to_string(),
        ContentType::RichText => content.unwrap_or_default().to_string(),
    };

    ammonia::clean(&raw)
}

/// Count words in an HTML fragment after stripping markup.
pub fn word_count(html: &str) -> usize {
    strip_html_tags(html).split_whitespace().count()
}

/// Estimated read time in whole minutes: `ceil(words / 250)`.
///
/// No floor is applied; zero words yields 0.
pub fn read_time_minutes(html: &str) -> i32 {
    let minutes = word_count(html).div_ceil(WORDS_PER_MINUTE);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}
