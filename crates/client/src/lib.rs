//! Client code for wmcache.
//!
//! This crate provides the paginated feed client, the cache merge engine,
//! mention content cleaning and per-page matching used by the CLI.

pub mod content;
pub mod fetch;
pub mod matcher;
pub mod sync;
pub mod webmentions;

pub use content::{
    ContentConfig, ContentPipeline, LinkCanonicalizer, NoopCanonicalizer, Sanitizer, TwitterCanonicalizer,
};
pub use fetch::{FetchConfig, MentionSource, WebmentionClient};
pub use matcher::{MentionFilter, PageAliases, PageMentions, by_timestamp};
pub use sync::MentionSync;
pub use webmentions::Webmentions;
