//! Gatekeeper Router

use crate::application::config::GatekeeperConfig;
use crate::application::gate::Gatekeeper;
use crate::presentation::handlers::{self, GatekeeperAppState};
use crate::presentation::middleware::gate_request;
use axum::{Router, middleware, routing::get};
use platform::store::CounterStore;
use std::sync::Arc;

/// Wrap `site` with the gatekeeper and add its endpoints
///
/// `site` carries the downstream content (pages, static files). The
/// returned router gates every non-excluded path, including the analytics
/// endpoint.
pub fn gatekeeper_router<S>(site: Router, store: S, config: GatekeeperConfig) -> Router
where
    S: CounterStore + Send + Sync + 'static,
{
    let store = Arc::new(store);
    let blocked_path = config.blocked_path.clone();
    let state = GatekeeperAppState {
        gatekeeper: Gatekeeper::new(store.clone(), config),
        store,
    };

    Router::new()
        .route(&blocked_path, get(handlers::blocked))
        .route("/api/analytics", get(handlers::analytics::<S>))
        .route("/health", get(handlers::health))
        .with_state(state.clone())
        .merge(site)
        .layer(middleware::from_fn_with_state(state, gate_request::<S>))
}
