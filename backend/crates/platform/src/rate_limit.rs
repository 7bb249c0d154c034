//! Rate Limiting Infrastructure
//!
//! Common rate limiting abstractions shared by the store backends and the
//! gatekeeper.

use std::time::Duration;

/// Rate limit configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 20,
            window: Duration::from_secs(10),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// Raw reply of an atomic sliding-window check-and-increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowOutcome {
    /// Whether this request was counted
    pub admitted: bool,
    /// Requests counted in the trailing window after the decision
    pub count: u32,
    /// Timestamp of the oldest counted request still in the window
    pub oldest_ms: Option<i64>,
}

/// Rate limit check result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at_ms: i64,
}

impl RateLimitResult {
    /// Derive quota metadata from a store reply taken at `now_ms`
    pub fn from_outcome(outcome: WindowOutcome, config: &RateLimitConfig, now_ms: i64) -> Self {
        let window_ms = config.window_ms();
        let reset_at_ms = outcome
            .oldest_ms
            .map(|oldest| oldest + window_ms)
            .unwrap_or(now_ms + window_ms)
            .max(now_ms);

        Self {
            allowed: outcome.admitted,
            limit: config.max_requests,
            remaining: config.max_requests.saturating_sub(outcome.count),
            reset_at_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests, 20);
        assert_eq!(config.window, Duration::from_secs(10));
        assert_eq!(config.window_ms(), 10_000);
    }

    #[test]
    fn test_from_outcome_admitted() {
        let config = RateLimitConfig::default();
        let outcome = WindowOutcome {
            admitted: true,
            count: 1,
            oldest_ms: Some(1_000),
        };

        let result = RateLimitResult::from_outcome(outcome, &config, 1_000);
        assert!(result.allowed);
        assert_eq!(result.limit, 20);
        assert_eq!(result.remaining, 19);
        assert_eq!(result.reset_at_ms, 11_000);
    }

    #[test]
    fn test_from_outcome_over_limit_floors_at_zero() {
        let config = RateLimitConfig::new(2, 10);
        let outcome = WindowOutcome {
            admitted: false,
            count: 5,
            oldest_ms: Some(500),
        };

        let result = RateLimitResult::from_outcome(outcome, &config, 2_000);
        assert!(!result.allowed);
        assert_eq!(result.remaining, 0);
        assert_eq!(result.reset_at_ms, 10_500);
    }

    #[test]
    fn test_from_outcome_empty_window() {
        let config = RateLimitConfig::default();
        let outcome = WindowOutcome {
            admitted: false,
            count: 0,
            oldest_ms: None,
        };

        let result = RateLimitResult::from_outcome(outcome, &config, 7_000);
        assert_eq!(result.remaining, 20);
        assert_eq!(result.reset_at_ms, 17_000);
    }
}
