//! Record and response types shared by both tiers

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::utils::time::serialize_record_time;

/// A single metric value after coercion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    /// Present but unreadable, or null in the backend
    Null,
}

impl MetricValue {
    /// Numeric view used for max comparison
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Integer(i) => Some(*i as f64),
            MetricValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetricValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MetricValue::Null)
    }
}

/// One device's readings at one instant (or one bucket)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    #[serde(serialize_with = "serialize_record_time")]
    pub time: NaiveDateTime,
    pub device: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, MetricValue>,
}

impl NormalizedRecord {
    pub fn new(time: NaiveDateTime, device: impl Into<String>) -> Self {
        Self {
            time,
            device: device.into(),
            values: BTreeMap::new(),
        }
    }

    /// Sort key for response ordering
    pub fn order_key(&self) -> (NaiveDateTime, &str) {
        (self.time, &self.device)
    }
}

/// Sort records by (time, device) ascending
pub fn sort_records(records: &mut [NormalizedRecord]) {
    records.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
}

/// Body of a successful query.
///
/// `daily_stats` and `longterm_stats` are always `null`; clients expect the
/// keys to exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub data: Vec<NormalizedRecord>,
    pub daily_stats: Option<serde_json::Value>,
    pub longterm_stats: Option<serde_json::Value>,
}

impl QueryResponse {
    pub fn new(data: Vec<NormalizedRecord>) -> Self {
        Self {
            data,
            daily_stats: None,
            longterm_stats: None,
        }
    }
}
