//! Cold tier: long-retention readings in a query-string analytical store

mod query;
mod reader;
mod timestream;

pub use query::{ColdQuery, MeasureType, is_valid_device_id};
pub use reader::ColdReader;
pub use timestream::TimestreamColdStore;

pub(crate) const BACKEND: &str = "timestream";
