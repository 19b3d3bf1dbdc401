//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (WEBMENTIONS_*)
//! 2. TOML config file (if WEBMENTIONS_CONFIG_FILE set)
//! 3. Built-in defaults

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Environment variable naming an optional TOML config file.
pub const CONFIG_FILE_ENV: &str = "WEBMENTIONS_CONFIG_FILE";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (WEBMENTIONS_*)
/// 2. TOML config file (if WEBMENTIONS_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Domain registered with the mention service.
    ///
    /// Set via WEBMENTIONS_DOMAIN environment variable. Required.
    #[serde(default)]
    pub domain: String,

    /// API token for the mention service.
    ///
    /// Set via WEBMENTIONS_TOKEN environment variable. Required.
    #[serde(default)]
    pub token: String,

    /// Directory holding `webmentions.json`.
    #[serde(default = "default_cache_directory")]
    pub cache_directory: PathBuf,

    /// Seconds a fetched cache stays fresh before the service is asked again.
    #[serde(default = "default_cache_time")]
    pub cache_time: u64,

    /// Whether mention content is cut down to `max_content_length`.
    #[serde(default = "default_true")]
    pub truncate: bool,

    /// Maximum visible characters of mention content.
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,

    /// Appended to truncated content. May contain markup.
    #[serde(default = "default_truncation_marker")]
    pub truncation_marker: String,

    /// Render content as sanitized HTML rather than plain text.
    #[serde(default = "default_true")]
    pub html_content: bool,

    /// Group name to the `wm-property` values it collects.
    #[serde(default = "default_mention_types")]
    pub mention_types: BTreeMap<String, Vec<String>>,

    /// Allow-list applied to mention HTML.
    #[serde(default)]
    pub sanitize: SanitizeOptions,

    /// Page path to one or more alias paths that also count as that page.
    #[serde(default)]
    pub page_aliases: HashMap<String, AliasTarget>,

    /// Rewrite Twitter/X status links to their canonical form.
    #[serde(default)]
    pub use_canonical_twitter_urls: bool,

    /// Explicit permalink rewrites consulted before the canonical Twitter form.
    #[serde(default)]
    pub canonical_overrides: HashMap<String, String>,

    /// Origin page URLs are resolved against. Defaults to `https://{domain}`.
    #[serde(default)]
    pub site_origin: Option<String>,

    /// Mention service feed endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Ceiling on pages requested in one fetch.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

/// Sanitizer allow-list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizeOptions {
    #[serde(default = "default_allowed_tags")]
    pub allowed_tags: Vec<String>,
    /// Tag name to the attributes kept on it. Unlisted tags keep none.
    #[serde(default = "default_allowed_attributes")]
    pub allowed_attributes: BTreeMap<String, Vec<String>>,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self { allowed_tags: default_allowed_tags(), allowed_attributes: default_allowed_attributes() }
    }
}

/// One alias path or several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AliasTarget {
    One(String),
    Many(Vec<String>),
}

impl AliasTarget {
    pub fn paths(&self) -> Vec<&str> {
        match self {
            AliasTarget::One(path) => vec![path.as_str()],
            AliasTarget::Many(paths) => paths.iter().map(String::as_str).collect(),
        }
    }
}

fn default_cache_directory() -> PathBuf {
    PathBuf::from("./_webmentioncache")
}

fn default_cache_time() -> u64 {
    3600
}

fn default_max_content_length() -> usize {
    280
}

fn default_truncation_marker() -> String {
    "…".into()
}

fn default_mention_types() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        ("likes".to_string(), vec!["like-of".to_string()]),
        ("reposts".to_string(), vec!["repost-of".to_string()]),
        ("comments".to_string(), vec!["mention-of".to_string(), "in-reply-to".to_string()]),
    ])
}

fn default_allowed_tags() -> Vec<String> {
    ["b", "i", "em", "strong", "a", "p"].into_iter().map(String::from).collect()
}

fn default_allowed_attributes() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([("a".to_string(), vec!["href".to_string()])])
}

fn default_endpoint() -> String {
    "https://webmention.io/api/mentions.jf2".into()
}

fn default_user_agent() -> String {
    "wmcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_pages() -> usize {
    50
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            token: String::new(),
            cache_directory: default_cache_directory(),
            cache_time: default_cache_time(),
            truncate: true,
            max_content_length: default_max_content_length(),
            truncation_marker: default_truncation_marker(),
            html_content: true,
            mention_types: default_mention_types(),
            sanitize: SanitizeOptions::default(),
            page_aliases: HashMap::new(),
            use_canonical_twitter_urls: false,
            canonical_overrides: HashMap::new(),
            site_origin: None,
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_pages: default_max_pages(),
        }
    }
}

impl AppConfig {
    /// Config with the two required fields set and everything else default.
    pub fn new(domain: impl Into<String>, token: impl Into<String>) -> Self {
        Self { domain: domain.into(), token: token.into(), ..Default::default() }
    }

    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Freshness window of the cache.
    pub fn cache_window(&self) -> chrono::Duration {
        i64::try_from(self.cache_time)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Origin used to resolve relative page URLs.
    pub fn site_origin(&self) -> String {
        match &self.site_origin {
            Some(origin) => origin.clone(),
            None => format!("https://{}", self.domain),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `WEBMENTIONS_`
    /// 2. TOML file from `WEBMENTIONS_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);
        Self::load_from(file.as_deref())
    }

    /// Like [`AppConfig::load`], with an explicit TOML file taking the place
    /// of `WEBMENTIONS_CONFIG_FILE`.
    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(
            Env::prefixed("WEBMENTIONS_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_directory, PathBuf::from("./_webmentioncache"));
        assert_eq!(config.cache_time, 3600);
        assert!(config.truncate);
        assert_eq!(config.max_content_length, 280);
        assert!(config.html_content);
        assert_eq!(config.mention_types.len(), 3);
        assert_eq!(config.mention_types["comments"], vec!["mention-of", "in-reply-to"]);
        assert_eq!(config.sanitize.allowed_tags, vec!["b", "i", "em", "strong", "a", "p"]);
        assert_eq!(config.sanitize.allowed_attributes["a"], vec!["href"]);
        assert!(config.page_aliases.is_empty());
        assert!(!config.use_canonical_twitter_urls);
        assert_eq!(config.endpoint, "https://webmention.io/api/mentions.jf2");
        assert_eq!(config.max_pages, 50);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_site_origin_defaults_to_domain() {
        let config = AppConfig::new("site.example", "t");
        assert_eq!(config.site_origin(), "https://site.example");

        let config = AppConfig { site_origin: Some("http://localhost:8080".into()), ..config };
        assert_eq!(config.site_origin(), "http://localhost:8080");
    }

    #[test]
    fn test_alias_target_paths() {
        assert_eq!(AliasTarget::One("/new".into()).paths(), vec!["/new"]);
        assert_eq!(AliasTarget::Many(vec!["/a".into(), "/b".into()]).paths(), vec!["/a", "/b"]);
    }

    #[test]
    fn test_load_from_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "webmentions.toml",
                r#"
                domain = "site.example"
                token = "file-token"
                cache_time = 60
                truncation_marker = '<span class="sr-only">more</span>'

                [page_aliases]
                "/old" = "/new"
                "/older" = ["/a", "/b"]

                [mention_types]
                likes = ["like-of"]
                bookmarks = ["bookmark-of"]
                "#,
            )?;
            jail.set_env(CONFIG_FILE_ENV, "webmentions.toml");
            jail.set_env("WEBMENTIONS_TOKEN", "env-token");
            jail.set_env("WEBMENTIONS_HTML_CONTENT", "false");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.domain, "site.example");
            assert_eq!(config.token, "env-token");
            assert_eq!(config.cache_time, 60);
            assert!(!config.html_content);
            assert_eq!(config.truncation_marker, r#"<span class="sr-only">more</span>"#);
            assert_eq!(config.page_aliases["/old"], AliasTarget::One("/new".into()));
            assert_eq!(config.page_aliases["/older"].paths(), vec!["/a", "/b"]);
            // file tables merge over the default taxonomy
            assert_eq!(config.mention_types.len(), 4);
            assert_eq!(config.mention_types["bookmarks"], vec!["bookmark-of"]);
            Ok(())
        });
    }

    #[test]
    fn test_load_missing_token_fails() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("WEBMENTIONS_DOMAIN", "site.example");
            let result = AppConfig::load_from(None);
            assert!(matches!(result, Err(ConfigError::Missing { field, .. }) if field == "token"));
            Ok(())
        });
    }
}
