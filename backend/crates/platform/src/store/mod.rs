//! Counter Store
//!
//! Key-value primitives the gatekeeper needs from its backing store:
//! hash counters, sets and an atomic sliding-window counter.

pub mod memory;
pub mod upstash;

use crate::rate_limit::WindowOutcome;
use std::collections::BTreeMap;
use thiserror::Error;

pub use memory::MemoryStore;
pub use upstash::{UpstashConfig, UpstashStore};

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors talking to the counter store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network failure or timeout
    #[error("Store transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status from the store API
    #[error("Store returned HTTP {0}")]
    Status(u16),

    /// Command rejected by the store
    #[error("Store command failed: {0}")]
    Command(String),

    /// Reply did not have the expected shape
    #[error("Unexpected store reply: {0}")]
    Decode(String),

    /// Store is not configured or not reachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Trait for counter store backends
///
/// Implementations must make [`LocalCounterStore::sliding_window`] atomic per
/// key: concurrent calls for the same key never admit more than `limit`
/// requests in a window.
#[trait_variant::make(CounterStore: Send)]
pub trait LocalCounterStore {
    /// Increment `field` of hash `key` by `delta`, returning the new value
    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> StoreResult<i64>;

    /// Add `member` to set `key`. Returns true if it was not present
    async fn sadd(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Cardinality of set `key` (0 if missing)
    async fn scard(&self, key: &str) -> StoreResult<u64>;

    /// All fields of hash `key` (empty if missing)
    async fn hgetall(&self, key: &str) -> StoreResult<BTreeMap<String, i64>>;

    /// Check and increment a sliding-window counter
    ///
    /// Drops entries older than `now_ms - window_ms`, then records `now_ms`
    /// only if fewer than `limit` entries remain.
    async fn sliding_window(
        &self,
        key: &str,
        limit: u32,
        window_ms: i64,
        now_ms: i64,
    ) -> StoreResult<WindowOutcome>;
}

/// Store used when no backend could be built; every call fails
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> StoreError {
        StoreError::Unavailable(self.reason.clone())
    }
}

impl CounterStore for UnavailableStore {
    async fn hincrby(&self, _key: &str, _field: &str, _delta: i64) -> StoreResult<i64> {
        Err(self.error())
    }

    async fn sadd(&self, _key: &str, _member: &str) -> StoreResult<bool> {
        Err(self.error())
    }

    async fn scard(&self, _key: &str) -> StoreResult<u64> {
        Err(self.error())
    }

    async fn hgetall(&self, _key: &str) -> StoreResult<BTreeMap<String, i64>> {
        Err(self.error())
    }

    async fn sliding_window(
        &self,
        _key: &str,
        _limit: u32,
        _window_ms: i64,
        _now_ms: i64,
    ) -> StoreResult<WindowOutcome> {
        Err(self.error())
    }
}

#[cfg(test)]
mod tests {
    use super::{CounterStore, StoreError, UnavailableStore};

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = UnavailableStore::new("not configured");

        assert!(matches!(
            store.hincrby("k", "f", 1).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.sadd("k", "m").await.is_err());
        assert!(store.scard("k").await.is_err());
        assert!(store.hgetall("k").await.is_err());
        assert!(store.sliding_window("k", 1, 1_000, 0).await.is_err());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(StoreError::Status(401).to_string(), "Store returned HTTP 401");
        assert!(
            StoreError::Unavailable("missing url".into())
                .to_string()
                .contains("missing url")
        );
    }
}
