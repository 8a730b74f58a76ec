//! Data layer: storage tier backends and the response cache
//!
//! - `hot` - recent readings, day-partitioned key-range store (DynamoDB)
//! - `cold` - long-retention readings, query-string store (Timestream)
//! - `cache` - bounded in-process response cache

pub mod cache;
pub mod cold;
pub mod error;
pub mod hot;
mod paging;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheKey, ResponseCache};
pub use error::DataError;
pub use traits::{ColdPage, ColdStore, HotCursor, HotItem, HotPage, HotPageRequest, HotStore, RawValue};
