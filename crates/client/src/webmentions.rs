//! Entry point tying the cache, the feed client, content cleaning and page
//! matching together.

use std::cmp::Ordering;

use wmcache_core::{AppConfig, CacheState, CacheStore, Error, MentionRecord};

use crate::content::{ContentPipeline, LinkCanonicalizer};
use crate::fetch::{FetchConfig, MentionSource, WebmentionClient};
use crate::matcher::{MentionFilter, PageMentions};
use crate::sync::MentionSync;

/// Webmentions of one site.
///
/// ```no_run
/// # async fn run() -> Result<(), wmcache_core::Error> {
/// use wmcache_client::Webmentions;
/// use wmcache_core::AppConfig;
///
/// let webmentions = Webmentions::new(&AppConfig::new("example.com", "token"))?;
/// let records = webmentions.mentions().await;
/// let page = webmentions.mentions_for_page(&records, "/posts/hello/");
/// println!("{} mentions", page.total);
/// # Ok(())
/// # }
/// ```
pub struct Webmentions<S = WebmentionClient> {
    sync: MentionSync<S>,
    pipeline: ContentPipeline,
    filter: MentionFilter,
}

impl Webmentions<WebmentionClient> {
    /// Validate `config` and build the HTTP-backed pipeline.
    pub fn new(config: &AppConfig) -> Result<Self, Error> {
        config.validate()?;
        let client = WebmentionClient::new(FetchConfig::from(config))?;
        Self::assemble(config, client)
    }
}

impl<S: MentionSource> Webmentions<S> {
    /// Build around any mention source.
    pub fn with_source(config: &AppConfig, source: S) -> Result<Self, Error> {
        config.validate()?;
        Self::assemble(config, source)
    }

    /// Wire the components of an already validated `config`.
    fn assemble(config: &AppConfig, source: S) -> Result<Self, Error> {
        let store = CacheStore::new(&config.cache_directory);
        Ok(Self {
            sync: MentionSync::new(store, source, config.cache_window()),
            pipeline: ContentPipeline::from_app_config(config),
            filter: MentionFilter::from_app_config(config)?,
        })
    }

    /// Replace the comparator used to order a page's mentions.
    pub fn with_sort<F>(mut self, sort: F) -> Self
    where
        F: Fn(&MentionRecord, &MentionRecord) -> Ordering + Send + Sync + 'static,
    {
        self.filter = self.filter.with_sort(sort);
        self
    }

    /// Replace the link canonicalization strategy.
    pub fn with_canonicalizer(mut self, canonicalizer: impl LinkCanonicalizer + 'static) -> Self {
        self.pipeline = self.pipeline.with_canonicalizer(canonicalizer);
        self
    }

    /// Cached state, refreshed from the feed when stale.
    pub async fn get(&self) -> CacheState {
        self.sync.get().await
    }

    /// Cached state after an unconditional fetch.
    pub async fn refresh(&self) -> CacheState {
        self.sync.refresh().await
    }

    /// All known mentions with cleaned content.
    pub async fn mentions(&self) -> Vec<MentionRecord> {
        let state = self.get().await;
        self.pipeline.clean_all(&state.children)
    }

    pub fn mentions_for_page(&self, records: &[MentionRecord], page_url: &str) -> PageMentions {
        self.filter.mentions_for(records, page_url)
    }

    pub fn count_for_page(&self, records: &[MentionRecord], page_url: &str) -> usize {
        self.filter.count_for(records, page_url)
    }

    /// Remove the cache file. Returns whether one existed.
    pub async fn clear(&self) -> Result<bool, Error> {
        self.sync.store().clear().await
    }

    pub fn store(&self) -> &CacheStore {
        self.sync.store()
    }

    pub fn pipeline(&self) -> &ContentPipeline {
        &self.pipeline
    }

    pub fn filter(&self) -> &MentionFilter {
        &self.filter
    }
}
