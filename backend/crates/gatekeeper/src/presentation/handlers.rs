//! HTTP Handlers

use crate::application::gate::Gatekeeper;
use crate::application::query_analytics::QueryAnalyticsUseCase;
use crate::error::GatekeeperResult;
use crate::presentation::dto::{AnalyticsResponse, BlockedResponse, HealthResponse};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use platform::store::CounterStore;
use std::sync::Arc;

/// Shared state for gatekeeper handlers and middleware
pub struct GatekeeperAppState<S>
where
    S: CounterStore,
{
    pub gatekeeper: Gatekeeper<S>,
    pub store: Arc<S>,
}

impl<S> Clone for GatekeeperAppState<S>
where
    S: CounterStore,
{
    fn clone(&self) -> Self {
        Self {
            gatekeeper: self.gatekeeper.clone(),
            store: self.store.clone(),
        }
    }
}

/// GET /api/blocked
pub async fn blocked() -> impl IntoResponse {
    (StatusCode::TOO_MANY_REQUESTS, Json(BlockedResponse::default()))
}

/// GET /api/analytics
pub async fn analytics<S>(
    State(state): State<GatekeeperAppState<S>>,
) -> GatekeeperResult<Json<AnalyticsResponse>>
where
    S: CounterStore + Send + Sync + 'static,
{
    let use_case = QueryAnalyticsUseCase::new(state.store.clone());
    let snapshot = use_case.execute().await?;

    Ok(Json(snapshot.into()))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
