//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::collections::HashMap;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `domain` or `token` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `max_content_length` is 0 while truncation is on
    /// - `max_pages` is 0
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` or `endpoint` is empty
    /// - `mention_types` has no buckets
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "domain".into(),
                hint: "Set WEBMENTIONS_DOMAIN environment variable".into(),
            });
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "token".into(),
                hint: "Set WEBMENTIONS_TOKEN environment variable".into(),
            });
        }

        if self.truncate && self.max_content_length == 0 {
            return Err(ConfigError::Invalid {
                field: "max_content_length".into(),
                reason: "must be greater than 0 when truncate is enabled".into(),
            });
        }

        if self.max_pages == 0 {
            return Err(ConfigError::Invalid { field: "max_pages".into(), reason: "must be greater than 0".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }
        if self.endpoint.is_empty() {
            return Err(ConfigError::Invalid { field: "endpoint".into(), reason: "must not be empty".into() });
        }

        if self.mention_types.is_empty() {
            return Err(ConfigError::Invalid {
                field: "mention_types".into(),
                reason: "must define at least one group".into(),
            });
        }

        let mut owners: HashMap<&str, &str> = HashMap::new();
        for (group, properties) in &self.mention_types {
            for property in properties {
                if let Some(previous) = owners.insert(property.as_str(), group.as_str()) {
                    tracing::warn!(
                        property = %property,
                        first = %previous,
                        second = %group,
                        "wm-property listed in two mention groups; matching records appear in both"
                    );
                }
            }
        }

        Ok(())
    }
}
