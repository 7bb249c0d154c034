//! Domain Value Objects
//!
//! Immutable value types and the store keys derived from them.

use axum::http::HeaderMap;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

/// Client identity - the apparent client address
///
/// Clients behind the same proxy share an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self(platform::client::extract_client_id(headers))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Store key of this client's sliding window
    pub fn rate_limit_key(&self) -> String {
        format!("ratelimit_{}", self.0)
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// UTC calendar day that buckets analytics records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsDay(NaiveDate);

impl AnalyticsDay {
    pub fn of(timestamp: DateTime<Utc>) -> Self {
        Self(timestamp.date_naive())
    }

    pub fn today() -> Self {
        Self::of(Utc::now())
    }

    /// `YYYY-MM-DD`
    pub fn date_string(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// Hash of per-path page-view counters
    pub fn page_views_key(&self) -> String {
        format!("analytics:{}", self.date_string())
    }

    /// Set of client identities seen that day
    pub fn visitors_key(&self) -> String {
        format!("analytics:{}:visitors", self.date_string())
    }
}

/// Hash field counting views of `path`
pub fn page_view_field(path: &str) -> String {
    format!("pageviews:{path}")
}
