//! Query parameters for one page of the mentions feed.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Page size the service is asked for.
pub const PER_PAGE: usize = 1000;

/// Query string of a single feed page request.
#[derive(Debug, Clone, Serialize)]
pub struct PageRequest<'a> {
    pub domain: &'a str,
    pub token: &'a str,
    #[serde(rename = "per-page")]
    pub per_page: usize,
    /// Zero-based page index.
    pub page: usize,
    /// Only records received after this instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
}

impl<'a> PageRequest<'a> {
    pub fn new(domain: &'a str, token: &'a str, per_page: usize, page: usize, since: Option<DateTime<Utc>>) -> Self {
        Self { domain, token, per_page, page, since: since.map(format_since) }
    }
}

/// Cursor in the ISO-8601 form the service accepts, e.g. `2024-01-01T00:00:00.000Z`.
pub fn format_since(since: DateTime<Utc>) -> String {
    since.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_since() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_since(ts), "2024-01-02T03:04:05.000Z");
    }

    #[test]
    fn test_request_without_since() {
        let req = PageRequest::new("site.example", "tok", PER_PAGE, 0, None);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["per-page"], 1000);
        assert_eq!(json["page"], 0);
        assert!(json.get("since").is_none());
    }

    #[test]
    fn test_request_with_since() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let req = PageRequest::new("site.example", "tok", 10, 3, Some(ts));
        assert_eq!(req.since.as_deref(), Some("2024-06-01T00:00:00.000Z"));
        assert_eq!(req.page, 3);
    }
}
