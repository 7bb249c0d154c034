//! Gate Use Case
//!
//! Decides, per request, whether to forward or block. Every failure on this
//! path resolves to forwarding the request.

use crate::application::config::GatekeeperConfig;
use crate::application::rate_limit::RateLimiter;
use crate::application::record_visit::AnalyticsRecorder;
use crate::domain::value_objects::ClientIdentity;
use crate::error::{GatekeeperError, GatekeeperResult};
use chrono::Utc;
use platform::rate_limit::RateLimitResult;
use platform::store::CounterStore;
use std::sync::Arc;

/// Outcome of gating one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Within quota: forward with quota headers
    Allow(RateLimitResult),
    /// Over quota: redirect to the blocked endpoint
    Block(RateLimitResult),
    /// Rate limiting could not run: forward unmodified
    FailOpen,
}

impl GateDecision {
    pub fn is_blocked(&self) -> bool {
        matches!(self, GateDecision::Block(_))
    }

    pub fn quota(&self) -> Option<&RateLimitResult> {
        match self {
            GateDecision::Allow(result) | GateDecision::Block(result) => Some(result),
            GateDecision::FailOpen => None,
        }
    }
}

/// Request gatekeeper
pub struct Gatekeeper<S>
where
    S: CounterStore,
{
    recorder: AnalyticsRecorder<S>,
    limiter: RateLimiter<S>,
    config: Arc<GatekeeperConfig>,
}

impl<S> Clone for Gatekeeper<S>
where
    S: CounterStore,
{
    fn clone(&self) -> Self {
        Self {
            recorder: self.recorder.clone(),
            limiter: self.limiter.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S> Gatekeeper<S>
where
    S: CounterStore + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, config: GatekeeperConfig) -> Self {
        Self {
            recorder: AnalyticsRecorder::new(store.clone()),
            limiter: RateLimiter::new(store, config.rate_limit.clone()),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &GatekeeperConfig {
        &self.config
    }

    /// Record the visit and apply the client's quota
    pub async fn evaluate(&self, path: &str, client: &ClientIdentity) -> GateDecision {
        self.recorder
            .spawn_record(path.to_string(), client.clone(), Utc::now());

        match self.check(client).await {
            Ok(result) if result.allowed => GateDecision::Allow(result),
            Ok(result) => {
                tracing::warn!(
                    client_id = %client,
                    path = %path,
                    reset_at_ms = result.reset_at_ms,
                    "Rate limit exceeded"
                );
                GateDecision::Block(result)
            }
            Err(e) => {
                tracing::warn!(
                    client_id = %client,
                    error = %e,
                    "Rate limit check failed, failing open"
                );
                GateDecision::FailOpen
            }
        }
    }

    /// Run the rate limit check on its own task so a panic inside it is
    /// contained
    async fn check(&self, client: &ClientIdentity) -> GatekeeperResult<RateLimitResult> {
        let limiter = self.limiter.clone();
        let key = client.rate_limit_key();

        tokio::spawn(async move { limiter.check_and_consume(&key).await })
            .await
            .map_err(|e| GatekeeperError::Aborted(e.to_string()))?
            .map_err(GatekeeperError::from)
    }
}
