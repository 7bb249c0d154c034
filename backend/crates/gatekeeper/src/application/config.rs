//! Application Configuration
//!
//! Configuration for the gatekeeper application layer.

pub use platform::rate_limit::RateLimitConfig;

/// Path of the fixed 429 response blocked clients are redirected to
pub const BLOCKED_PATH: &str = "/api/blocked";

/// Gatekeeper configuration
#[derive(Debug, Clone)]
pub struct GatekeeperConfig {
    /// Sliding window quota per client
    pub rate_limit: RateLimitConfig,
    /// Where rejected requests are redirected
    pub blocked_path: String,
    /// Path prefixes served without gating
    pub excluded_prefixes: Vec<String>,
    /// Exact paths served without gating
    pub excluded_paths: Vec<String>,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            blocked_path: BLOCKED_PATH.to_string(),
            excluded_prefixes: vec![
                "/_next/static".to_string(),
                "/_next/image".to_string(),
                "/public".to_string(),
                "/assets".to_string(),
            ],
            excluded_paths: vec!["/favicon.ico".to_string(), "/health".to_string()],
        }
    }
}

impl GatekeeperConfig {
    /// Whether requests to `path` pass through the gatekeeper
    ///
    /// The blocked endpoint is never gated, otherwise a blocked client
    /// would be redirected to itself.
    pub fn is_gated(&self, path: &str) -> bool {
        if path == self.blocked_path {
            return false;
        }
        if self.excluded_paths.iter().any(|p| p == path) {
            return false;
        }
        !self
            .excluded_prefixes
            .iter()
            .any(|prefix| has_segment_prefix(path, prefix))
    }
}

/// `/public` matches `/public` and `/public/x` but not `/publication`
fn has_segment_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
