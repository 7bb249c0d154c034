//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Client identification from proxy headers
//! - Rate limiting primitives (configuration, results)
//! - Counter store abstraction with Upstash REST and in-memory backends

pub mod client;
pub mod rate_limit;
pub mod store;
