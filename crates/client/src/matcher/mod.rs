//! Per-page selection and grouping of mentions.
//!
//! A record belongs to a page when its `wm-target` path equals the page path
//! (or one of the page's aliases) after normalization. Matching records
//! without an author or with a `wm-property` outside the taxonomy are
//! dropped; the rest are sorted and grouped into the taxonomy's buckets.

pub mod path;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use url::Url;
use wmcache_core::{AppConfig, Error, MentionRecord};

use crate::fetch::{canonicalize, resolve};
pub use path::{PageAliases, normalize_path, strip_outer_slashes};

/// Comparator used to order the mentions of a page.
pub type SortFn = Box<dyn Fn(&MentionRecord, &MentionRecord) -> Ordering + Send + Sync>;

/// Oldest first by `published`, falling back to `wm-received`. Records
/// without a usable timestamp come first.
pub fn by_timestamp(a: &MentionRecord, b: &MentionRecord) -> Ordering {
    a.sort_timestamp().cmp(&b.sort_timestamp())
}

/// Mentions of one page, grouped by bucket.
///
/// Serializes flat: `{ "total": 3, "likes": [...], "reposts": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageMentions {
    pub total: usize,
    #[serde(flatten)]
    pub groups: BTreeMap<String, Vec<MentionRecord>>,
}

impl PageMentions {
    /// Records of one bucket; empty for unknown buckets.
    pub fn group(&self, name: &str) -> &[MentionRecord] {
        self.groups.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Selects, sorts and groups the mentions of a single page.
pub struct MentionFilter {
    taxonomy: BTreeMap<String, Vec<String>>,
    aliases: PageAliases,
    origin: Url,
    sort: SortFn,
}

impl fmt::Debug for MentionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MentionFilter")
            .field("taxonomy", &self.taxonomy)
            .field("aliases", &self.aliases)
            .field("origin", &self.origin.as_str())
            .finish_non_exhaustive()
    }
}

impl MentionFilter {
    pub fn new(taxonomy: BTreeMap<String, Vec<String>>, aliases: PageAliases, origin: Url) -> Self {
        Self { taxonomy, aliases, origin, sort: Box::new(by_timestamp) }
    }

    /// Build from the taxonomy, aliases and site origin of `config`.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = canonicalize(&config.site_origin()).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self::new(config.mention_types.clone(), PageAliases::new(&config.page_aliases), origin))
    }

    /// Replace the comparator applied before grouping.
    pub fn with_sort<F>(mut self, sort: F) -> Self
    where
        F: Fn(&MentionRecord, &MentionRecord) -> Ordering + Send + Sync + 'static,
    {
        self.sort = Box::new(sort);
        self
    }

    /// Normalized path of a page URL, resolved against the site origin.
    pub fn normalize_page_path(&self, page_url: &str) -> Result<String, Error> {
        let url = resolve(&self.origin, page_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(normalize_path(&url))
    }

    /// Grouped mentions of the page at `page_url`.
    pub fn mentions_for(&self, records: &[MentionRecord], page_url: &str) -> PageMentions {
        let mut matched = self.select(records, page_url);
        matched.sort_by(|a, b| (self.sort)(*a, *b));

        let groups = self
            .taxonomy
            .iter()
            .map(|(bucket, properties)| {
                let members = matched
                    .iter()
                    .filter(|record| properties.contains(&record.wm_property))
                    .map(|record| (*record).clone())
                    .collect();
                (bucket.clone(), members)
            })
            .collect();

        PageMentions { total: matched.len(), groups }
    }

    /// Number of mentions `mentions_for` would report as `total`.
    pub fn count_for(&self, records: &[MentionRecord], page_url: &str) -> usize {
        self.select(records, page_url).len()
    }

    /// URL match, then authorship, then taxonomy membership.
    fn select<'a>(&self, records: &'a [MentionRecord], page_url: &str) -> Vec<&'a MentionRecord> {
        let page_path = match self.normalize_page_path(page_url) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Ignoring mentions for unparseable page URL {:?}: {}", page_url, e);
                return Vec::new();
            }
        };

        records
            .iter()
            .filter(|record| self.targets_page(record, &page_path))
            .filter(|record| record.has_author())
            .filter(|record| self.is_classified(record))
            .collect()
    }

    fn targets_page(&self, record: &MentionRecord, page_path: &str) -> bool {
        match resolve(&self.origin, &record.wm_target) {
            Ok(target) => self.aliases.matches(page_path, &normalize_path(&target)),
            Err(_) => false,
        }
    }

    fn is_classified(&self, record: &MentionRecord) -> bool {
        self.taxonomy.values().any(|properties| properties.contains(&record.wm_property))
    }
}
