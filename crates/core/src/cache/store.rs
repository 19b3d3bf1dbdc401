//! Reading and writing the cache document.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::mention::CacheState;

/// Name of the cache document inside the cache directory.
pub const CACHE_FILE_NAME: &str = "webmentions.json";

/// Cache file handle.
///
/// Cheap to clone; holds only the paths. Every call goes to disk.
#[derive(Clone, Debug)]
pub struct CacheStore {
    directory: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `directory`. Nothing is touched on disk yet.
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self { directory: directory.as_ref().to_path_buf() }
    }

    /// Full path of the cache document.
    pub fn path(&self) -> PathBuf {
        self.directory.join(CACHE_FILE_NAME)
    }

    fn temp_path(&self) -> PathBuf {
        self.directory.join(format!("{CACHE_FILE_NAME}.tmp"))
    }

    /// Read the cached state.
    ///
    /// A missing file yields the empty state. So does a file that cannot be
    /// read or parsed; that case is logged since it discards history.
    pub async fn read(&self) -> CacheState {
        let path = self.path();
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no cache at {}, starting empty", path.display());
                return CacheState::default();
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cache unreadable, starting empty");
                return CacheState::default();
            }
        };

        match serde_json::from_slice::<CacheState>(&bytes) {
            Ok(state) => {
                tracing::debug!("cache hit at {}: {} records", path.display(), state.children.len());
                state
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cache malformed, starting empty");
                CacheState::default()
            }
        }
    }

    /// Persist `state`, replacing any previous document.
    ///
    /// The directory is created if missing. The document is written to a
    /// temporary sibling and renamed into place, so a crash mid-write leaves
    /// the previous cache intact.
    pub async fn write(&self, state: &CacheState) -> Result<(), Error> {
        fs::create_dir_all(&self.directory).await?;

        let body = serde_json::to_vec_pretty(state)?;
        let temp = self.temp_path();

        let mut file = fs::File::create(&temp).await?;
        file.write_all(&body).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&temp, self.path()).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        tracing::debug!("wrote {} records to {}", state.children.len(), self.path().display());
        Ok(())
    }

    /// Delete the cache document. A missing document is not an error.
    pub async fn clear(&self) -> Result<bool, Error> {
        match fs::remove_file(self.path()).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mention::{Author, MentionRecord};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn sample_state() -> CacheState {
        let mut record = MentionRecord {
            wm_target: "https://site.example/posts/a/".into(),
            wm_property: "like-of".into(),
            published: Some("2024-01-01T00:00:00Z".into()),
            author: Some(Author { name: Some("Ana".into()), ..Default::default() }),
            ..Default::default()
        };
        record.extra.insert("wm-id".into(), json!(42));

        CacheState {
            last_fetched: Some(Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap()),
            children: vec![record, MentionRecord::default()],
        }
    }

    #[tokio::test]
    async fn test_read_missing_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("nope"));
        let state = store.read().await;
        assert_eq!(state, CacheState::default());
        assert!(state.last_fetched.is_none());
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let state = sample_state();

        store.write(&state).await.unwrap();
        assert_eq!(store.read().await, state);
    }

    #[tokio::test]
    async fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = CacheStore::new(&nested);

        store.write(&CacheState::default()).await.unwrap();
        assert!(nested.join(CACHE_FILE_NAME).exists());
        assert!(!nested.join(format!("{CACHE_FILE_NAME}.tmp")).exists());
    }

    #[tokio::test]
    async fn test_write_is_pretty_json_with_wire_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        store.write(&sample_state()).await.unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n  \"lastFetched\": \"2024-02-03T04:05:06.000Z\""));
        assert!(text.contains("\"wm-target\""));
        assert!(text.contains("\"wm-id\": 42"));
    }

    #[tokio::test]
    async fn test_malformed_cache_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        std::fs::write(store.path(), b"{ not json").unwrap();

        assert_eq!(store.read().await, CacheState::default());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        store.write(&sample_state()).await.unwrap();
        store.write(&CacheState::default()).await.unwrap();

        assert_eq!(store.read().await, CacheState::default());
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        assert!(!store.clear().await.unwrap());

        store.write(&sample_state()).await.unwrap();
        assert!(store.clear().await.unwrap());
        assert!(!store.path().exists());
    }
}
