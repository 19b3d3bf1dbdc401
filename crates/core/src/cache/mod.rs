//! JSON file cache for fetched webmentions.
//!
//! The whole fetch state lives in one document, `webmentions.json`, inside a
//! configurable directory. It supports:
//!
//! - Creating the cache directory on first write
//! - Falling back to an empty state when the file is absent or unreadable
//! - Atomic replacement (write a sibling temp file, then rename)

pub mod store;

pub use crate::Error;

pub use store::{CACHE_FILE_NAME, CacheStore};
