//! Tiered telemetry query engine
//!
//! - `registry` - metric kinds, coercion and reduction rules
//! - `bucket` - aggregation interval and bucket alignment
//! - `request` - query parameter validation and cache keys
//! - `normalize` - native tier rows to uniform records
//! - `aggregate` - per-bucket reduction
//! - `router` - cache, tier selection and orchestration

mod aggregate;
mod bucket;
mod error;
mod normalize;
mod registry;
mod request;
mod router;
mod types;


pub use bucket::{BucketInterval, interval};
pub use error::{CoercionError, QueryError};
pub use registry::{MetricKind, classify};
pub use request::{DataParams, TelemetryQuery};
pub use router::{QueryRouter, RouterSettings, SharedResponse, Tier};
pub use types::{MetricValue, NormalizedRecord, QueryResponse};
