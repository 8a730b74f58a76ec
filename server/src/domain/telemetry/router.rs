//! Query router: cache lookup, tier selection, read, normalize, aggregate

use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};
use tokio_util::sync::CancellationToken;

use super::aggregate::aggregate;
use super::bucket::{self, BucketInterval};
use super::error::QueryError;
use super::normalize::{normalize_cold, normalize_hot};
use super::registry;
use super::request::{DataParams, TelemetryQuery};
use super::types::{NormalizedRecord, QueryResponse};
use crate::core::config::{AppConfig, TierMode};
use crate::data::ResponseCache;
use crate::data::cold::{ColdQuery, ColdReader};
use crate::data::hot::HotReader;

/// Storage tier serving one query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Hot,
    Cold,
}

/// Routing settings resolved from configuration
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub tier_mode: TierMode,
    /// Age of `start` up to which the hot tier still holds the data
    pub hot_retention: TimeDelta,
    pub cold_database: String,
    pub cold_table: String,
}

impl RouterSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            tier_mode: config.query.tier_mode,
            hot_retention: config.hot.retention(),
            cold_database: config.cold.database.clone(),
            cold_table: config.cold.table.clone(),
        }
    }
}

pub type SharedResponse = Arc<QueryResponse>;

/// Orchestrates one telemetry query end to end.
///
/// The response cache is owned here and shared by every request; each call
/// otherwise works on request-local state only.
pub struct QueryRouter {
    /// Absent when running cold-only
    hot: Option<HotReader>,
    cold: ColdReader,
    settings: RouterSettings,
    cache: ResponseCache<SharedResponse>,
}

impl QueryRouter {
    pub fn new(
        hot: Option<HotReader>,
        cold: ColdReader,
        settings: RouterSettings,
        cache: ResponseCache<SharedResponse>,
    ) -> Self {
        Self {
            hot,
            cold,
            settings,
            cache,
        }
    }

    /// Pick the tier by the age of `start` alone
    pub fn select_tier(&self, start: NaiveDateTime, now: NaiveDateTime) -> Tier {
        if self.settings.tier_mode == TierMode::Cold || self.hot.is_none() {
            return Tier::Cold;
        }
        if now - start <= self.settings.hot_retention {
            Tier::Hot
        } else {
            Tier::Cold
        }
    }

    /// Parse and validate `params`, then execute
    pub async fn query(
        &self,
        params: &DataParams,
        now: NaiveDateTime,
        cancel: &CancellationToken,
    ) -> Result<SharedResponse, QueryError> {
        let query = TelemetryQuery::from_params(params, now)?;
        self.execute(&query, now, cancel).await
    }

    /// Serve `query` from cache or from the selected tier.
    /// Only successful responses are cached.
    pub async fn execute(
        &self,
        query: &TelemetryQuery,
        now: NaiveDateTime,
        cancel: &CancellationToken,
    ) -> Result<SharedResponse, QueryError> {
        let key = query.cache_key();
        tracing::debug!(key = %key, "Cache key");
        if let Some(hit) = self.cache.get(&key, now) {
            tracing::debug!(rows = hit.data.len(), "Serving cached response");
            return Ok(hit);
        }

        let interval = bucket::interval(query.start, query.end);
        let tier = self.select_tier(query.start, now);
        tracing::debug!(
            ?tier,
            start = %query.start,
            end = %query.end,
            interval_secs = interval.map(BucketInterval::secs),
            "Routing query"
        );

        let records = match (tier, &self.hot) {
            (Tier::Hot, Some(hot)) => self.read_hot(hot, query, interval, cancel).await?,
            _ => self.read_cold(query, interval, cancel).await?,
        };

        let response = Arc::new(QueryResponse::new(records));
        self.cache.put(key, now, Arc::clone(&response));
        Ok(response)
    }

    async fn read_hot(
        &self,
        hot: &HotReader,
        query: &TelemetryQuery,
        interval: Option<BucketInterval>,
        cancel: &CancellationToken,
    ) -> Result<Vec<NormalizedRecord>, QueryError> {
        let items = hot.read(query.start, query.end, cancel).await?;
        let records = normalize_hot(items, &query.devices, &query.metrics)?;
        Ok(match interval {
            Some(interval) => aggregate(records, &query.metrics, query.start, interval),
            None => records,
        })
    }

    /// The cold tier buckets natively, so its rows are never re-aggregated
    async fn read_cold(
        &self,
        query: &TelemetryQuery,
        interval: Option<BucketInterval>,
        cancel: &CancellationToken,
    ) -> Result<Vec<NormalizedRecord>, QueryError> {
        let metrics = query
            .metrics
            .iter()
            .map(|m| {
                registry::classify(m)
                    .map(|kind| (m.clone(), kind.measure_type()))
                    .ok_or_else(|| QueryError::input(format!("Unsupported metric: {m}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let sql = ColdQuery {
            database: &self.settings.cold_database,
            table: &self.settings.cold_table,
            devices: &query.devices,
            metrics: &metrics,
            start: query.start,
            end: query.end,
            bucket_secs: interval.map(BucketInterval::secs),
        }
        .build()?;

        let rows = self.cold.read(&sql, cancel).await?;
        Ok(normalize_cold(rows, &query.metrics)?)
    }
}
