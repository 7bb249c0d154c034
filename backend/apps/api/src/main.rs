//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-path errors are handled by the
//! gatekeeper, which fails open.

use axum::Router;
use gatekeeper::{GatekeeperConfig, gatekeeper_router};
use platform::store::{MemoryStore, StoreResult, UnavailableStore, UpstashConfig, UpstashStore};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,gatekeeper=info,platform=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let store_timeout = Duration::from_millis(
        env::var("STORE_TIMEOUT_MS")
            .ok()
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(2_000),
    );

    // Downstream content: the static single-page site
    let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string());
    let site = Router::new().fallback_service(ServeDir::new(&static_dir));
    tracing::info!(static_dir = %static_dir, "Serving static site");

    let config = GatekeeperConfig::default();
    tracing::info!(
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window.as_secs(),
        "Rate limit configured"
    );

    let app = match env::var("STORE_BACKEND").as_deref() {
        Ok("memory") => {
            tracing::warn!("Using in-memory store, counters are local to this process");
            gatekeeper_router(site, MemoryStore::new(), config)
        }
        _ => match upstash_store(store_timeout) {
            Ok(store) => gatekeeper_router(site, store, config),
            // The site must stay up without its store
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Counter store unavailable, rate limiting and analytics disabled"
                );
                gatekeeper_router(site, UnavailableStore::new(e.to_string()), config)
            }
        },
    };

    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn upstash_store(timeout: Duration) -> StoreResult<UpstashStore> {
    let config = UpstashConfig::from_env()?.with_timeout(timeout);
    UpstashStore::new(config)
}
