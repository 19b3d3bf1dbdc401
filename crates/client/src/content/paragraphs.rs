use std::sync::LazyLock;

use regex::Regex;

static BLOCK_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?:p|div|blockquote|ul|ol|li|h[1-6]|pre|table|figure|section|article|hr)[\s/>]")
        .expect("invalid block markup pattern")
});

/// Whether `html` already carries block-level structure.
pub fn has_block_markup(html: &str) -> bool {
    BLOCK_MARKUP.is_match(html)
}

/// Wrap each non-blank line in `<p>`.
pub fn wrap_paragraphs(content: &str) -> String {
    content
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("<p>{line}</p>"))
        .collect()
}
