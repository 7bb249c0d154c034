//! Presentation Layer
//!
//! Axum middleware, handlers and DTOs for the gatekeeper.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
