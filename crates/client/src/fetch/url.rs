//! URL handling for the feed endpoint and for page/target matching.

use url::Url;

/// Error type for URL parsing failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize an absolute http(s) URL such as the feed endpoint or the
/// site origin.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let host = host.to_lowercase();
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve a possibly relative URL against `base`.
///
/// Absolute inputs are returned as parsed; `/posts/a` or `posts/a` are joined
/// onto the base origin.
pub fn resolve(base: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }
    match Url::parse(trimmed) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))
        }
        Err(e) => Err(UrlError::InvalidUrl(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_endpoint() {
        let url = canonicalize("https://webmention.io/api/mentions.jf2").unwrap();
        assert_eq!(url.host_str(), Some("webmention.io"));
        assert_eq!(url.path(), "/api/mentions.jf2");
    }

    #[test]
    fn test_canonicalize_bare_domain() {
        let url = canonicalize("Site.Example").unwrap();
        assert_eq!(url.as_str(), "https://site.example/");
    }

    #[test]
    fn test_canonicalize_remove_fragment_keep_query() {
        let url = canonicalize("  http://example.com/feed?x=1#top ").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.query(), Some("x=1"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_canonicalize_rejects() {
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
        assert!(matches!(canonicalize("ftp://example.com/x"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(canonicalize("https://exa mple.com"), Err(UrlError::InvalidUrl(_))));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let base = Url::parse("https://site.example").unwrap();
        assert_eq!(resolve(&base, "/posts/a/").unwrap().path(), "/posts/a/");
        assert_eq!(resolve(&base, "posts/a").unwrap().as_str(), "https://site.example/posts/a");
        assert_eq!(resolve(&base, "https://other.example/x").unwrap().host_str(), Some("other.example"));
        assert!(matches!(resolve(&base, ""), Err(UrlError::Empty)));
    }
}
