//! Rate Limit Use Case
//!
//! Sliding-window quota per key, backed by the store's atomic
//! check-and-increment.

use chrono::Utc;
use platform::rate_limit::{RateLimitConfig, RateLimitResult};
use platform::store::{CounterStore, StoreResult};
use std::sync::Arc;

/// Sliding-window rate limiter
pub struct RateLimiter<S>
where
    S: CounterStore,
{
    store: Arc<S>,
    config: RateLimitConfig,
}

impl<S> Clone for RateLimiter<S>
where
    S: CounterStore,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S> RateLimiter<S>
where
    S: CounterStore + Sync,
{
    pub fn new(store: Arc<S>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    /// Count one request for `key` if it still fits in the window
    ///
    /// A rejected request consumes no quota. Store errors are returned to
    /// the caller, which decides whether to fail open.
    pub async fn check_and_consume(&self, key: &str) -> StoreResult<RateLimitResult> {
        self.check_and_consume_at(key, Utc::now().timestamp_millis())
            .await
    }

    pub async fn check_and_consume_at(&self, key: &str, now_ms: i64) -> StoreResult<RateLimitResult> {
        let outcome = self
            .store
            .sliding_window(
                key,
                self.config.max_requests,
                self.config.window_ms(),
                now_ms,
            )
            .await?;

        let result = RateLimitResult::from_outcome(outcome, &self.config, now_ms);

        tracing::debug!(
            key = %key,
            allowed = result.allowed,
            remaining = result.remaining,
            reset_at_ms = result.reset_at_ms,
            "Rate limit checked"
        );

        Ok(result)
    }
}
