//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and the counter store.

pub mod config;
pub mod gate;
pub mod query_analytics;
pub mod rate_limit;
pub mod record_visit;
