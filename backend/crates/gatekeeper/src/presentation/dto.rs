//! API DTOs (Data Transfer Objects)

use crate::application::query_analytics::AnalyticsSnapshot;
use serde::Serialize;
use std::collections::BTreeMap;

/// Response for GET /api/blocked
#[derive(Debug, Clone, Serialize)]
pub struct BlockedResponse {
    pub error: &'static str,
    pub message: &'static str,
}

impl Default for BlockedResponse {
    fn default() -> Self {
        Self {
            error: "Too many requests",
            message: "Please try again in a few seconds",
        }
    }
}

/// Response for GET /api/analytics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub date: String,
    pub page_views: BTreeMap<String, i64>,
    pub unique_visitors: u64,
    pub status: &'static str,
}

impl From<AnalyticsSnapshot> for AnalyticsResponse {
    fn from(snapshot: AnalyticsSnapshot) -> Self {
        Self {
            date: snapshot.date,
            page_views: snapshot.page_views,
            unique_visitors: snapshot.unique_visitors,
            status: "success",
        }
    }
}

/// Response for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}
