//! Gatekeeper Module
//!
//! Per-client rate limiting and page-view analytics in front of the site.
//!
//! Clean Architecture structure:
//! - `domain/` - Client identity and analytics key derivation
//! - `application/` - Use cases (record visit, rate limit, gate policy, analytics query)
//! - `presentation/` - Axum middleware, handlers and router
//!
//! ## Availability Model
//! - Every store failure on the request path lets the request through
//! - Analytics recording runs detached and never delays the gating decision
//! - Only the reporting endpoint surfaces store failures (503)

pub mod application;
pub mod domain;
pub mod error;
pub mod presentation;

// Re-exports for convenience
pub use application::config::GatekeeperConfig;
pub use error::{GatekeeperError, GatekeeperResult};
pub use presentation::router::gatekeeper_router;
