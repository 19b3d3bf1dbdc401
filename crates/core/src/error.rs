//! Unified error types for wmcache.
//!
//! Display strings carry a stable code prefix so log lines can be grepped
//! by failure class.

use crate::config::ConfigError;

/// Unified error types for the webmention cache and pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration failed to load or validate.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),

    /// Invalid input parameters (e.g., an empty page URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Cache file could not be written or serialized.
    #[error("CACHE_ERROR: {0}")]
    Cache(String),

    /// HTTP error response from the mention service.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// The mention service could not be reached or returned an unusable feed.
    #[error("FETCH_UNAVAILABLE: {0}")]
    FetchUnavailable(String),

    /// The service kept returning full pages past the configured ceiling.
    #[error("PAGINATION_RUNAWAY: more than {max_pages} full pages")]
    PaginationRunaway { max_pages: usize },
}

impl Error {
    /// Whether this error means the remote feed is unavailable for this run.
    ///
    /// Callers serving cached data treat all of these the same way: keep the
    /// previous cache and carry on.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::HttpError(_) | Error::FetchUnavailable(_) | Error::PaginationRunaway { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Cache(format!("serialization failed: {err}"))
    }
}
