//! Upstash Redis REST backend
//!
//! Commands are sent as JSON arrays to the REST endpoint; the sliding window
//! runs as a Lua script so the check and the increment happen atomically on
//! the server.

use super::{CounterStore, StoreError, StoreResult};
use crate::rate_limit::WindowOutcome;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

pub const URL_ENV: &str = "UPSTASH_REDIS_REST_URL";
pub const TOKEN_ENV: &str = "UPSTASH_REDIS_REST_TOKEN";

const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local limit = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local now = tonumber(ARGV[3])

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)
local admitted = 0
if count < limit then
    redis.call('ZADD', key, now, ARGV[4])
    count = count + 1
    admitted = 1
end
redis.call('PEXPIRE', key, window)

local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
local oldest_ms = -1
if oldest[2] then
    oldest_ms = tonumber(oldest[2])
end
return {admitted, count, oldest_ms}
"#;

/// Connection settings for the REST API
#[derive(Debug, Clone)]
pub struct UpstashConfig {
    pub url: String,
    pub token: String,
    pub timeout: Duration,
}

impl UpstashConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            timeout: Duration::from_secs(2),
        }
    }

    /// Read `UPSTASH_REDIS_REST_URL` and `UPSTASH_REDIS_REST_TOKEN`
    pub fn from_env() -> StoreResult<Self> {
        let url = non_empty_env(URL_ENV)?;
        let token = non_empty_env(TOKEN_ENV)?;
        Ok(Self::new(url, token))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn non_empty_env(name: &str) -> StoreResult<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| StoreError::Unavailable(format!("{name} is not set")))
}

#[derive(Debug, Deserialize)]
struct RestReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Upstash Redis store over HTTPS
#[derive(Debug, Clone)]
pub struct UpstashStore {
    client: reqwest::Client,
    config: Arc<UpstashConfig>,
    /// Distinguishes replicas writing to the same sorted set
    instance: Arc<str>,
    member_seq: Arc<AtomicU64>,
}

impl UpstashStore {
    pub fn new(config: UpstashConfig) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        tracing::info!(url = %config.url, "Upstash store configured");

        Ok(Self {
            client,
            config: Arc::new(config),
            instance: Uuid::new_v4().simple().to_string().into(),
            member_seq: Arc::new(AtomicU64::new(0)),
        })
    }

    async fn command(&self, args: Value) -> StoreResult<Value> {
        let response = self
            .client
            .post(self.config.url.trim_end_matches('/'))
            .bearer_auth(&self.config.token)
            .json(&args)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        parse_reply(status, &body)
    }

    fn next_member(&self, now_ms: i64) -> String {
        let seq = self.member_seq.fetch_add(1, Ordering::Relaxed);
        format!("{now_ms}-{}-{seq}", self.instance)
    }
}

/// Map a REST reply to the command result
///
/// An `error` field wins over the status code; an unreadable body is a
/// status error when the status is not 2xx and a decode error otherwise.
fn parse_reply(status: StatusCode, body: &[u8]) -> StoreResult<Value> {
    match serde_json::from_slice::<RestReply>(body) {
        Ok(RestReply {
            error: Some(message),
            ..
        }) => Err(StoreError::Command(message)),
        Ok(_) if !status.is_success() => Err(StoreError::Status(status.as_u16())),
        Ok(RestReply { result, .. }) => Ok(result.unwrap_or(Value::Null)),
        Err(_) if !status.is_success() => Err(StoreError::Status(status.as_u16())),
        Err(e) => Err(StoreError::Decode(e.to_string())),
    }
}

impl CounterStore for UpstashStore {
    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> StoreResult<i64> {
        let reply = self
            .command(json!(["HINCRBY", key, field, delta.to_string()]))
            .await?;
        as_i64(&reply)
    }

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<bool> {
        let reply = self.command(json!(["SADD", key, member])).await?;
        Ok(as_i64(&reply)? > 0)
    }

    async fn scard(&self, key: &str) -> StoreResult<u64> {
        let reply = self.command(json!(["SCARD", key])).await?;
        Ok(as_i64(&reply)?.max(0) as u64)
    }

    async fn hgetall(&self, key: &str) -> StoreResult<BTreeMap<String, i64>> {
        let reply = self.command(json!(["HGETALL", key])).await?;
        decode_hash(&reply)
    }

    async fn sliding_window(
        &self,
        key: &str,
        limit: u32,
        window_ms: i64,
        now_ms: i64,
    ) -> StoreResult<WindowOutcome> {
        let member = self.next_member(now_ms);
        let reply = self
            .command(json!([
                "EVAL",
                SLIDING_WINDOW_SCRIPT,
                "1",
                key,
                limit.to_string(),
                window_ms.to_string(),
                now_ms.to_string(),
                member,
            ]))
            .await?;
        decode_window(&reply)
    }
}

/// Integers may come back as JSON numbers or as strings
fn as_i64(value: &Value) -> StoreResult<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| StoreError::Decode(format!("non-integer number {n}"))),
        Value::String(s) => s
            .parse()
            .map_err(|_| StoreError::Decode(format!("non-integer string {s:?}"))),
        other => Err(StoreError::Decode(format!("expected integer, got {other}"))),
    }
}

/// HGETALL replies are a flat `[field, value, field, value, ...]` array
fn decode_hash(value: &Value) -> StoreResult<BTreeMap<String, i64>> {
    let items = match value {
        Value::Null => return Ok(BTreeMap::new()),
        Value::Array(items) => items,
        other => return Err(StoreError::Decode(format!("expected array, got {other}"))),
    };

    if items.len() % 2 != 0 {
        return Err(StoreError::Decode("odd-length HGETALL reply".into()));
    }

    items
        .chunks_exact(2)
        .map(|pair| {
            let field = pair[0]
                .as_str()
                .ok_or_else(|| StoreError::Decode(format!("non-string field {}", pair[0])))?;
            Ok((field.to_string(), as_i64(&pair[1])?))
        })
        .collect()
}

fn decode_window(value: &Value) -> StoreResult<WindowOutcome> {
    let items = value
        .as_array()
        .filter(|items| items.len() == 3)
        .ok_or_else(|| StoreError::Decode(format!("expected 3-element array, got {value}")))?;

    let admitted = as_i64(&items[0])? == 1;
    let count = as_i64(&items[1])?.clamp(0, u32::MAX as i64) as u32;
    let oldest = as_i64(&items[2])?;

    Ok(WindowOutcome {
        admitted,
        count,
        oldest_ms: (oldest >= 0).then_some(oldest),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_i64_accepts_numbers_and_strings() {
        assert_eq!(as_i64(&json!(7)).unwrap(), 7);
        assert_eq!(as_i64(&json!("42")).unwrap(), 42);
        assert!(matches!(as_i64(&json!("x")), Err(StoreError::Decode(_))));
        assert!(matches!(as_i64(&json!(null)), Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_decode_hash() {
        let reply = json!(["pageviews:/", "5", "pageviews:/api/analytics", "2"]);
        let hash = decode_hash(&reply).unwrap();

        assert_eq!(hash.len(), 2);
        assert_eq!(hash["pageviews:/"], 5);
        assert_eq!(hash["pageviews:/api/analytics"], 2);
    }

    #[test]
    fn test_decode_hash_empty_and_null() {
        assert!(decode_hash(&json!([])).unwrap().is_empty());
        assert!(decode_hash(&json!(null)).unwrap().is_empty());
    }

    #[test]
    fn test_decode_hash_odd_length() {
        assert!(decode_hash(&json!(["a"])).is_err());
    }

    #[test]
    fn test_decode_window() {
        let outcome = decode_window(&json!([1, 3, 1_700_000_000_000i64])).unwrap();
        assert!(outcome.admitted);
        assert_eq!(outcome.count, 3);
        assert_eq!(outcome.oldest_ms, Some(1_700_000_000_000));

        let outcome = decode_window(&json!([0, 0, -1])).unwrap();
        assert!(!outcome.admitted);
        assert_eq!(outcome.oldest_ms, None);
    }

    #[test]
    fn test_decode_window_bad_shape() {
        assert!(decode_window(&json!([1, 2])).is_err());
        assert!(decode_window(&json!("OK")).is_err());
    }

    #[test]
    fn test_config_with_timeout() {
        let config = UpstashConfig::new("https://example.upstash.io", "token")
            .with_timeout(Duration::from_millis(500));
        assert_eq!(config.timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_member_is_unique() {
        let store =
            UpstashStore::new(UpstashConfig::new("https://example.upstash.io", "token")).unwrap();
        assert_ne!(store.next_member(1), store.next_member(1));
    }

    #[test]
    fn test_members_differ_across_instances() {
        let config = UpstashConfig::new("https://example.upstash.io", "token");
        let first = UpstashStore::new(config.clone()).unwrap();
        let second = UpstashStore::new(config).unwrap();

        // Same millisecond, same sequence number
        assert_ne!(first.next_member(1), second.next_member(1));
    }

    #[test]
    fn test_parse_reply_result() {
        let value = parse_reply(StatusCode::OK, br#"{"result": 3}"#).unwrap();
        assert_eq!(value, json!(3));

        let value = parse_reply(StatusCode::OK, br#"{"result": null}"#).unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_parse_reply_errors() {
        let err = parse_reply(
            StatusCode::BAD_REQUEST,
            br#"{"error": "ERR wrong number of arguments"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Command(m) if m.contains("wrong number")));

        let err = parse_reply(StatusCode::OK, br#"{"error": "WRONGTYPE"}"#).unwrap_err();
        assert!(matches!(err, StoreError::Command(_)));

        let err = parse_reply(StatusCode::UNAUTHORIZED, br#"{"result": null}"#).unwrap_err();
        assert!(matches!(err, StoreError::Status(401)));

        let err = parse_reply(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, StoreError::Status(502)));
    }

    #[test]
    fn test_parse_reply_unreadable_success_is_decode_error() {
        let err = parse_reply(StatusCode::OK, b"not json").unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }
}
