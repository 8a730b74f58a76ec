//! Hot tier: recent readings in a day-partitioned key-range store

mod dynamodb;
mod reader;

pub use dynamodb::DynamoHotStore;
pub use reader::{HotReader, day_requests};

pub(crate) const BACKEND: &str = "dynamodb";
