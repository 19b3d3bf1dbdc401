//! Path normalization and page aliases.

use std::collections::HashMap;

use url::Url;
use wmcache_core::config::AliasTarget;

/// `path` without any leading or trailing `/`.
pub fn strip_outer_slashes(path: &str) -> &str {
    path.trim_matches('/')
}

/// Case-folded path of `url` without outer slashes.
pub fn normalize_path(url: &Url) -> String {
    normalize_raw(url.path())
}

fn normalize_raw(path: &str) -> String {
    strip_outer_slashes(&path.to_lowercase()).to_string()
}

/// Page path to the normalized paths whose mentions it also shows.
#[derive(Debug, Clone, Default)]
pub struct PageAliases {
    aliases: HashMap<String, Vec<String>>,
}

impl PageAliases {
    pub fn new(configured: &HashMap<String, AliasTarget>) -> Self {
        let aliases = configured
            .iter()
            .map(|(page, target)| (normalize_raw(page), target.paths().into_iter().map(normalize_raw).collect()))
            .collect();
        Self { aliases }
    }

    /// Normalized aliases of a normalized page path.
    pub fn aliases_of(&self, page_path: &str) -> &[String] {
        self.aliases.get(page_path).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether `target_path` belongs to the page at `page_path`.
    pub fn matches(&self, page_path: &str, target_path: &str) -> bool {
        page_path == target_path || self.aliases_of(page_path).iter().any(|alias| alias == target_path)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_outer_slashes() {
        assert_eq!(strip_outer_slashes("///a/b//"), "a/b");
        assert_eq!(strip_outer_slashes("/"), "");
        assert_eq!(strip_outer_slashes("a"), "a");
    }

    #[test]
    fn test_normalize_path() {
        let url = Url::parse("https://Site.Example/Posts/Hello-World/?x=1#top").unwrap();
        assert_eq!(normalize_path(&url), "posts/hello-world");
        assert_eq!(normalize_path(&Url::parse("https://site.example").unwrap()), "");
    }

    #[test]
    fn test_aliases_are_normalized() {
        let configured = HashMap::from([
            ("/New/".to_string(), AliasTarget::One("/OLD".into())),
            ("posts/b".to_string(), AliasTarget::Many(vec!["/b/".into(), "legacy/B".into()])),
        ]);
        let aliases = PageAliases::new(&configured);

        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases.aliases_of("new"), ["old".to_string()]);
        assert!(aliases.matches("posts/b", "legacy/b"));
        assert!(aliases.matches("posts/b", "posts/b"));
        assert!(!aliases.matches("old", "new"));
        assert!(aliases.aliases_of("missing").is_empty());
    }
}
