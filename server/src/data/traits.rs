//! Backend traits for the two storage tiers
//!
//! Each tier is reduced to a single paginated primitive. The SDK-backed
//! implementations live in `hot::dynamodb` and `cold::timestream`; readers
//! drive pagination, timeouts and cancellation on top of these traits.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::data::error::DataError;

// ============================================================================
// Hot Tier
// ============================================================================

/// Attribute value stored in a hot-tier payload map
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// String attribute
    Text(String),
    /// Number attribute, kept in its wire text form
    Number(String),
    Bool(bool),
    Null,
}

/// One stored hot-tier item
#[derive(Debug, Clone)]
pub struct HotItem {
    /// Partition key: `YYYY-MM-DD`
    pub pk: String,
    /// Sort key: `HH:MM:SS#device`
    pub sk: String,
    pub payload: HashMap<String, RawValue>,
}

/// Continuation key returned by a partial hot-tier page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotCursor {
    pub pk: String,
    pub sk: String,
}

/// Key-range request for one day partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotPageRequest {
    pub date: NaiveDate,
    /// Inclusive lower sort-key bound
    pub from_sk: String,
    /// Inclusive upper sort-key bound
    pub to_sk: String,
}

impl HotPageRequest {
    /// Partition key for this request
    pub fn partition(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct HotPage {
    pub items: Vec<HotItem>,
    pub cursor: Option<HotCursor>,
}

/// Day-partitioned key-range store holding recent readings
#[async_trait]
pub trait HotStore: Send + Sync {
    /// Fetch one page of items in `[from_sk, to_sk]` for the request's day
    async fn query_page(
        &self,
        request: &HotPageRequest,
        cursor: Option<HotCursor>,
    ) -> Result<HotPage, DataError>;
}

// ============================================================================
// Cold Tier
// ============================================================================

/// One page of positional result rows. `None` marks a backend null.
#[derive(Debug, Clone, Default)]
pub struct ColdPage {
    pub rows: Vec<Vec<Option<String>>>,
    pub next_token: Option<String>,
}

/// Query-string analytical store holding long-retention readings
#[async_trait]
pub trait ColdStore: Send + Sync {
    /// Run `query`, resuming from `next_token` when given
    async fn query_page(
        &self,
        query: &str,
        next_token: Option<String>,
    ) -> Result<ColdPage, DataError>;
}
