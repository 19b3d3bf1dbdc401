//! Webmention data model.
//!
//! Records come from an external service and are treated as opaque: the
//! fields the pipeline reads are typed, everything else is carried through
//! untouched so the cache file round-trips what the service sent.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Persisted fetch state: the freshness cursor plus every record seen so far.
///
/// `children` is newest-first across merges: records from a later fetch are
/// placed before records from earlier fetches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheState {
    #[serde(default, with = "iso_millis")]
    pub last_fetched: Option<DateTime<Utc>>,
    #[serde(default)]
    pub children: Vec<MentionRecord>,
}

impl CacheState {
    /// Time elapsed since the last successful fetch, if there ever was one.
    pub fn age(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.last_fetched.map(|fetched| now - fetched)
    }
}

/// A single webmention as delivered by the service's jf2 feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MentionRecord {
    /// Absolute URL of the page being mentioned.
    #[serde(rename = "wm-target", default)]
    pub wm_target: String,

    /// Interaction type, e.g. `like-of` or `in-reply-to`.
    #[serde(rename = "wm-property", default)]
    pub wm_property: String,

    #[serde(rename = "wm-received", default, skip_serializing_if = "Option::is_none")]
    pub wm_received: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,

    /// Permalink of the mentioning post.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MentionContent>,

    /// Fields the pipeline does not interpret (`wm-id`, `wm-source`, `type`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Author card of a mention.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Mention body. `value` is derived by the content pipeline and never
/// present on ingest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MentionContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MentionRecord {
    /// Whether the record names its author by name or URL.
    ///
    /// Records without either are never rendered.
    pub fn has_author(&self) -> bool {
        let present = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.trim().is_empty());
        self.author.as_ref().is_some_and(|a| present(&a.name) || present(&a.url))
    }

    /// Timestamp used for display ordering: `published`, else `wm-received`.
    pub fn sort_timestamp(&self) -> Option<DateTime<Utc>> {
        self.published
            .as_deref()
            .and_then(parse_timestamp)
            .or_else(|| self.wm_received.as_deref().and_then(parse_timestamp))
    }
}

/// Parse the timestamp formats seen in jf2 feeds.
///
/// Accepts RFC 3339 and bare `YYYY-MM-DD` dates (taken as midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `Option<DateTime<Utc>>` as an ISO-8601 string with millisecond precision.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| DateTime::parse_from_rfc3339(&s).map(|ts| ts.with_timezone(&Utc)).map_err(D::Error::custom))
            .transpose()
    }
}
