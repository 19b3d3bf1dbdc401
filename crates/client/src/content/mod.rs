//! Mention content cleaning.
//!
//! Turns the raw `content.html` / `content.text` of a mention into a
//! sanitized, optionally truncated `content.value` ready for rendering.

pub mod canonical;
pub mod paragraphs;
pub mod sanitize;
pub mod truncate;

use html_escape::encode_text;
use wmcache_core::{AppConfig, MentionRecord};

pub use canonical::{LinkCanonicalizer, NoopCanonicalizer, TwitterCanonicalizer};
pub use paragraphs::{has_block_markup, wrap_paragraphs};
pub use sanitize::{Sanitizer, strip_tags};
pub use truncate::{restore_marker, truncate_html, truncate_text};

/// Rendering options for mention content.
#[derive(Debug, Clone)]
pub struct ContentConfig {
    pub truncate: bool,
    pub max_content_length: usize,
    pub truncation_marker: String,
    pub html_content: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self { truncate: true, max_content_length: 280, truncation_marker: "…".to_string(), html_content: true }
    }
}

impl From<&AppConfig> for ContentConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            truncate: config.truncate,
            max_content_length: config.max_content_length,
            truncation_marker: config.truncation_marker.clone(),
            html_content: config.html_content,
        }
    }
}

/// Content cleaning pipeline.
///
/// Only `content.html` and `content.text` are read, so cleaning an already
/// cleaned record yields the same `content.value`.
pub struct ContentPipeline {
    config: ContentConfig,
    sanitizer: Sanitizer,
    canonicalizer: Box<dyn LinkCanonicalizer>,
}

impl ContentPipeline {
    pub fn new(config: ContentConfig, sanitizer: Sanitizer) -> Self {
        Self { config, sanitizer, canonicalizer: Box::new(NoopCanonicalizer) }
    }

    /// Replace the link canonicalization strategy.
    pub fn with_canonicalizer(mut self, canonicalizer: impl LinkCanonicalizer + 'static) -> Self {
        self.canonicalizer = Box::new(canonicalizer);
        self
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        let pipeline = Self::new(ContentConfig::from(config), Sanitizer::new(&config.sanitize));
        if config.use_canonical_twitter_urls {
            pipeline.with_canonicalizer(TwitterCanonicalizer::with_overrides(config.canonical_overrides.clone()))
        } else {
            pipeline
        }
    }

    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    /// Clean a single record, returning a copy with `content.value` set.
    pub fn clean(&self, record: &MentionRecord) -> MentionRecord {
        let mut cleaned = record.clone();

        if let Some(canonical) = record.url.as_deref().and_then(|url| self.canonicalizer.canonicalize(url)) {
            cleaned.url = Some(canonical);
        }

        if let Some(content) = cleaned.content.as_mut() {
            let html = content.html.as_deref().filter(|html| !html.trim().is_empty());
            let value = match (html, content.text.as_deref()) {
                (Some(html), _) if self.config.html_content => Some(self.clean_html(html)),
                (_, Some(text)) => Some(self.clean_text(text)),
                (Some(html), None) => Some(self.clean_text(&strip_tags(html))),
                (None, None) => None,
            };
            if value.is_some() {
                content.value = value;
            }
        }

        cleaned
    }

    pub fn clean_all(&self, records: &[MentionRecord]) -> Vec<MentionRecord> {
        let cleaned: Vec<_> = records.iter().map(|record| self.clean(record)).collect();
        tracing::debug!("Cleaned content of {} mentions", cleaned.len());
        cleaned
    }

    fn clean_html(&self, html: &str) -> String {
        let rewritten = self.canonicalizer.rewrite_links(html);
        let structured = if has_block_markup(&rewritten) { rewritten } else { wrap_paragraphs(&rewritten) };
        let sanitized = self.sanitizer.sanitize(&structured);

        if !self.config.truncate {
            return sanitized;
        }

        let marker = &self.config.truncation_marker;
        match truncate_html(&sanitized, self.config.max_content_length, marker) {
            Some(cut) => restore_marker(cut, marker),
            None => sanitized,
        }
    }

    fn clean_text(&self, text: &str) -> String {
        let cut = if self.config.truncate { truncate_text(text, self.config.max_content_length) } else { None };
        let kept = cut.map_or(text, str::trim_end);
        let marker = &self.config.truncation_marker;

        if !self.config.html_content {
            return match cut {
                Some(_) => format!("{kept}{}", strip_tags(marker)),
                None => kept.to_string(),
            };
        }

        let wrapped = wrap_paragraphs(&encode_text(kept));
        match cut {
            None => wrapped,
            Some(_) => match wrapped.strip_suffix("</p>") {
                Some(open) => format!("{open}{marker}</p>"),
                None => format!("<p>{marker}</p>"),
            },
        }
    }
}

impl Default for ContentPipeline {
    fn default() -> Self {
        Self::new(ContentConfig::default(), Sanitizer::default())
    }
}
