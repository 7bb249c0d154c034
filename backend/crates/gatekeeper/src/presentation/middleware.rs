//! Gatekeeper Middleware

use crate::application::gate::GateDecision;
use crate::domain::value_objects::ClientIdentity;
use crate::presentation::handlers::GatekeeperAppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use platform::rate_limit::RateLimitResult;
use platform::store::CounterStore;

pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Middleware that records analytics and enforces the per-client quota
///
/// Allowed requests are forwarded with quota headers, rejected ones are
/// redirected to the blocked endpoint with the same headers. If the quota
/// could not be checked the request is forwarded unmodified.
pub async fn gate_request<S>(
    State(state): State<GatekeeperAppState<S>>,
    req: Request<Body>,
    next: Next,
) -> Response
where
    S: CounterStore + Send + Sync + 'static,
{
    let gatekeeper = &state.gatekeeper;
    let path = req.uri().path().to_string();

    if !gatekeeper.config().is_gated(&path) {
        return next.run(req).await;
    }

    let client = ClientIdentity::from_headers(req.headers());
    let decision = gatekeeper.evaluate(&path, &client).await;

    let mut response = match decision {
        GateDecision::Block(_) => {
            Redirect::temporary(&gatekeeper.config().blocked_path).into_response()
        }
        GateDecision::Allow(_) | GateDecision::FailOpen => next.run(req).await,
    };

    if let Some(quota) = decision.quota() {
        apply_quota_headers(response.headers_mut(), quota);
    }

    response
}

fn apply_quota_headers(headers: &mut HeaderMap, quota: &RateLimitResult) {
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(quota.limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(quota.remaining));
    headers.insert(RATE_LIMIT_RESET, HeaderValue::from(quota.reset_at_ms));
}
