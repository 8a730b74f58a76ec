//! Domain logic
//!
//! - `telemetry` - tiered telemetry query engine

pub mod telemetry;

pub use telemetry::{QueryError, QueryRouter};
