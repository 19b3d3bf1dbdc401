//! Permalink canonicalization strategies.
//!
//! The content pipeline hands every absolute URL it finds to a
//! `LinkCanonicalizer` and substitutes whatever comes back.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Twitter/X status permalinks, including mobile and `x.com` hosts.
static TWITTER_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:www\.|mobile\.)?(?:twitter\.com|x\.com)/([A-Za-z0-9_]{1,15})/status(?:es)?/(\d+)")
        .expect("invalid twitter status pattern")
});

/// Absolute http(s) URLs inside HTML text or attribute values.
static ABSOLUTE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).expect("invalid absolute url pattern"));

/// Rewrites permalinks of some platform to a preferred form.
pub trait LinkCanonicalizer: Send + Sync {
    /// Canonical replacement for `url`, or `None` to leave it alone.
    fn canonicalize(&self, url: &str) -> Option<String>;

    /// Rewrite every absolute URL in `html` that this canonicalizer knows.
    fn rewrite_links(&self, html: &str) -> String {
        ABSOLUTE_URL
            .replace_all(html, |caps: &regex::Captures<'_>| {
                let found = &caps[0];
                self.canonicalize(found).unwrap_or_else(|| found.to_string())
            })
            .into_owned()
    }
}

/// Leaves every URL untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCanonicalizer;

impl LinkCanonicalizer for NoopCanonicalizer {
    fn canonicalize(&self, _url: &str) -> Option<String> {
        None
    }

    fn rewrite_links(&self, html: &str) -> String {
        html.to_string()
    }
}

/// Maps Twitter/X status links to `https://twitter.com/{user}/status/{id}`.
///
/// An override table (e.g. tweets mirrored to a self-hosted archive) is
/// consulted first, keyed by either the original or the canonical URL.
#[derive(Debug, Default, Clone)]
pub struct TwitterCanonicalizer {
    overrides: HashMap<String, String>,
}

impl TwitterCanonicalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }
}

impl LinkCanonicalizer for TwitterCanonicalizer {
    fn canonicalize(&self, url: &str) -> Option<String> {
        let caps = TWITTER_STATUS.captures(url)?;
        let canonical = format!("https://twitter.com/{}/status/{}", &caps[1], &caps[2]);

        self.overrides
            .get(url)
            .or_else(|| self.overrides.get(&canonical))
            .cloned()
            .or(Some(canonical))
    }
}
