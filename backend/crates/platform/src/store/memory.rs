//! In-memory counter store
//!
//! Single-process backend for local development and tests. Per-key
//! atomicity comes from the dashmap entry lock. Window logs idle for a full
//! window are swept, at most once per window.

use super::{CounterStore, StoreResult};
use crate::rate_limit::WindowOutcome;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug, Default)]
struct Inner {
    hashes: DashMap<String, BTreeMap<String, i64>>,
    sets: DashMap<String, HashSet<String>>,
    windows: DashMap<String, VecDeque<i64>>,
    last_sweep_ms: AtomicI64,
}

impl Inner {
    /// Drop window logs whose newest entry has left the window
    ///
    /// Must not be called while holding a `windows` entry guard.
    fn sweep_windows(&self, window_ms: i64, now_ms: i64) {
        let last = self.last_sweep_ms.load(Ordering::Relaxed);
        if now_ms - last < window_ms {
            return;
        }
        if self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let cutoff = now_ms - window_ms;
        let before = self.windows.len();
        self.windows
            .retain(|_, log| log.back().is_some_and(|&ts| ts > cutoff));

        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            tracing::debug!(removed, "Expired idle rate limit windows");
        }
    }
}

/// In-memory store; clones share the same data
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for MemoryStore {
    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> StoreResult<i64> {
        let mut hash = self.inner.hashes.entry(key.to_string()).or_default();
        let value = hash.entry(field.to_string()).or_insert(0);
        *value += delta;
        Ok(*value)
    }

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut set = self.inner.sets.entry(key.to_string()).or_default();
        Ok(set.insert(member.to_string()))
    }

    async fn scard(&self, key: &str) -> StoreResult<u64> {
        Ok(self
            .inner
            .sets
            .get(key)
            .map(|set| set.len() as u64)
            .unwrap_or(0))
    }

    async fn hgetall(&self, key: &str) -> StoreResult<BTreeMap<String, i64>> {
        Ok(self
            .inner
            .hashes
            .get(key)
            .map(|hash| hash.value().clone())
            .unwrap_or_default())
    }

    async fn sliding_window(
        &self,
        key: &str,
        limit: u32,
        window_ms: i64,
        now_ms: i64,
    ) -> StoreResult<WindowOutcome> {
        self.inner.sweep_windows(window_ms, now_ms);

        let mut log = self.inner.windows.entry(key.to_string()).or_default();

        let cutoff = now_ms - window_ms;
        while log.front().is_some_and(|&ts| ts <= cutoff) {
            log.pop_front();
        }

        let admitted = (log.len() as u32) < limit;
        if admitted {
            log.push_back(now_ms);
        }

        Ok(WindowOutcome {
            admitted,
            count: log.len() as u32,
            oldest_ms: log.front().copied(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hincrby_creates_and_accumulates() {
        let store = MemoryStore::new();

        assert_eq!(store.hincrby("h", "a", 1).await.unwrap(), 1);
        assert_eq!(store.hincrby("h", "a", 2).await.unwrap(), 3);
        assert_eq!(store.hincrby("h", "b", 1).await.unwrap(), 1);

        let all = store.hgetall("h").await.unwrap();
        assert_eq!(all.get("a"), Some(&3));
        assert_eq!(all.get("b"), Some(&1));
    }

    #[tokio::test]
    async fn test_sets_deduplicate() {
        let store = MemoryStore::new();

        assert!(store.sadd("s", "1.2.3.4").await.unwrap());
        assert!(!store.sadd("s", "1.2.3.4").await.unwrap());
        assert!(store.sadd("s", "5.6.7.8").await.unwrap());
        assert_eq!(store.scard("s").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_keys_are_empty() {
        let store = MemoryStore::new();

        assert_eq!(store.scard("nope").await.unwrap(), 0);
        assert!(store.hgetall("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sliding_window_rejects_without_counting() {
        let store = MemoryStore::new();

        for i in 0..3 {
            let outcome = store.sliding_window("w", 3, 1_000, i).await.unwrap();
            assert!(outcome.admitted);
            assert_eq!(outcome.count, (i + 1) as u32);
            assert_eq!(outcome.oldest_ms, Some(0));
        }

        for _ in 0..5 {
            let outcome = store.sliding_window("w", 3, 1_000, 10).await.unwrap();
            assert!(!outcome.admitted);
            assert_eq!(outcome.count, 3);
        }
    }

    #[tokio::test]
    async fn test_sliding_window_slides() {
        let store = MemoryStore::new();

        store.sliding_window("w", 2, 1_000, 0).await.unwrap();
        store.sliding_window("w", 2, 1_000, 500).await.unwrap();
        assert!(!store.sliding_window("w", 2, 1_000, 900).await.unwrap().admitted);

        // The request at t=0 leaves the window at t=1000
        let outcome = store.sliding_window("w", 2, 1_000, 1_000).await.unwrap();
        assert!(outcome.admitted);
        assert_eq!(outcome.count, 2);
        assert_eq!(outcome.oldest_ms, Some(500));
    }

    #[tokio::test]
    async fn test_idle_windows_expire_after_one_window() {
        let store = MemoryStore::new();

        for i in 0..1_000 {
            store
                .sliding_window(&format!("ratelimit_{i}"), 20, 10_000, 0)
                .await
                .unwrap();
        }
        assert_eq!(store.inner.windows.len(), 1_000);

        store
            .sliding_window("ratelimit_other", 20, 10_000, 1_000_000)
            .await
            .unwrap();
        assert_eq!(store.inner.windows.len(), 1);
        assert!(store.inner.windows.contains_key("ratelimit_other"));
    }

    #[tokio::test]
    async fn test_active_windows_survive_sweep() {
        let store = MemoryStore::new();

        store.sliding_window("idle", 2, 1_000, 0).await.unwrap();
        store.sliding_window("busy", 2, 1_000, 0).await.unwrap();
        store.sliding_window("busy", 2, 1_000, 900).await.unwrap();

        // Sweep at t=1000 drops "idle" (last seen at 0) but keeps "busy"
        let outcome = store.sliding_window("busy", 2, 1_000, 1_000).await.unwrap();
        assert!(outcome.admitted);
        assert_eq!(outcome.count, 2);
        assert_eq!(outcome.oldest_ms, Some(900));
        assert!(!store.inner.windows.contains_key("idle"));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.sadd("s", "a").await.unwrap();
        assert_eq!(other.scard("s").await.unwrap(), 1);
    }
}
