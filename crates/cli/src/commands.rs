//! Subcommand implementations.
//!
//! Each command returns a serializable output that `main` prints as JSON.

use serde::Serialize;
use wmcache_client::fetch::{MentionSource, format_since};
use wmcache_client::{PageMentions, Webmentions};
use wmcache_core::Error;

/// Output of `sync`.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutput {
    /// Records in the cache after syncing.
    pub records: usize,

    /// Time of the last successful fetch.
    pub last_fetched: Option<String>,
}

/// Output of `count`.
#[derive(Debug, Clone, Serialize)]
pub struct CountOutput {
    pub url: String,
    pub count: usize,
}

/// Output of `clear`.
#[derive(Debug, Clone, Serialize)]
pub struct ClearOutput {
    pub path: String,
    pub removed: bool,
}

pub async fn sync_impl<S: MentionSource>(webmentions: &Webmentions<S>, force: bool) -> SyncOutput {
    let state = if force { webmentions.refresh().await } else { webmentions.get().await };
    SyncOutput { records: state.children.len(), last_fetched: state.last_fetched.map(format_since) }
}

pub async fn page_impl<S: MentionSource>(webmentions: &Webmentions<S>, url: &str) -> PageMentions {
    let records = webmentions.mentions().await;
    webmentions.mentions_for_page(&records, url)
}

pub async fn count_impl<S: MentionSource>(webmentions: &Webmentions<S>, url: &str) -> CountOutput {
    let records = webmentions.get().await.children;
    CountOutput { url: url.to_string(), count: webmentions.count_for_page(&records, url) }
}

pub async fn clear_impl<S: MentionSource>(webmentions: &Webmentions<S>) -> Result<ClearOutput, Error> {
    let removed = webmentions.clear().await?;
    Ok(ClearOutput { path: webmentions.store().path().display().to_string(), removed })
}
