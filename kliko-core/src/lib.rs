//! Core types and service wiring for the kliko nearby-container lookup.

/// Single-slot snapshot cache with time-based expiry.
pub mod cache;
/// Locating and decoding the records embedded in the operator page.
pub mod extract;
/// Haversine distance and radius queries.
pub mod geo;
/// Domain models and identifiers.
pub mod model;
/// Operator bundle wiring an upstream to its script layout.
pub mod plugin;
/// Traits and errors describing the upstream boundary.
pub mod ports;
/// High-level query facade used by clients.
pub mod service;
/// Cache-aware snapshot retrieval.
pub mod snapshot;

#[cfg(test)]
mod testing;

pub use cache::*;
pub use extract::*;
pub use geo::*;
pub use model::*;
pub use plugin::*;
pub use ports::*;
pub use service::*;
pub use snapshot::*;
