//! Domain Layer
//!
//! This layer contains:
//! - Domain value objects (ClientIdentity, AnalyticsDay)
//! - Store key derivation for rate-limit and analytics records

pub mod value_objects;
