//! jf2 feed response body.

use serde::Deserialize;
use wmcache_core::MentionRecord;

/// Raw page from the mentions feed.
#[derive(Debug, Deserialize)]
pub struct MentionFeed {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub children: Vec<MentionRecord>,
}

impl MentionFeed {
    /// Number of records on this page.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
