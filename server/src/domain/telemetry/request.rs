//! Query parameter parsing and validation

use chrono::{NaiveDateTime, TimeDelta};
use serde::Deserialize;

use super::error::QueryError;
use crate::core::constants::{DEFAULT_LOOKBACK_SECS, MAX_DEVICES, MAX_METRICS};
use crate::data::CacheKey;
use crate::data::cold::is_valid_device_id;
use crate::utils::sql::is_plain_identifier;
use crate::utils::time::{format_query_time, parse_query_time, truncate_to_minute};

/// Raw query string of `GET /data`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataParams {
    pub devices: Option<String>,
    pub metrics: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl DataParams {
    fn is_empty(&self) -> bool {
        self.devices.is_none()
            && self.metrics.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
    }
}

/// A validated telemetry query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryQuery {
    /// Distinct device ids, in request order
    pub devices: Vec<String>,
    /// Distinct metric names, in request order (fixes cold tier column order)
    pub metrics: Vec<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TelemetryQuery {
    /// Validate request parameters.
    ///
    /// Omitted bounds default to `now` and `now - 1 day`, truncated to the
    /// minute like explicit bounds.
    pub fn from_params(params: &DataParams, now: NaiveDateTime) -> Result<Self, QueryError> {
        if params.is_empty() {
            return Err(QueryError::input("No query parameters"));
        }

        let (Some(devices), Some(metrics)) = (&params.devices, &params.metrics) else {
            return Err(QueryError::input("Invalid parameters"));
        };
        let devices = split_list(devices).ok_or_else(|| QueryError::input("Invalid parameters"))?;
        let metrics = split_list(metrics).ok_or_else(|| QueryError::input("Invalid parameters"))?;

        if devices.len() > MAX_DEVICES {
            return Err(QueryError::input(format!(
                "Too many devices (max {MAX_DEVICES})"
            )));
        }
        if metrics.len() > MAX_METRICS {
            return Err(QueryError::input(format!(
                "Too many metrics (max {MAX_METRICS})"
            )));
        }
        if let Some(bad) = devices.iter().find(|d| !is_valid_device_id(d)) {
            return Err(QueryError::input(format!("Invalid device identifier: {bad}")));
        }
        if let Some(bad) = metrics.iter().find(|m| !is_plain_identifier(m)) {
            return Err(QueryError::input(format!("Invalid metric name: {bad}")));
        }

        let now = truncate_to_minute(now);
        let start = parse_bound(params.start_time.as_deref())?
            .unwrap_or_else(|| now - TimeDelta::seconds(DEFAULT_LOOKBACK_SECS));
        let end = parse_bound(params.end_time.as_deref())?.unwrap_or(now);

        if start > end {
            return Err(QueryError::input("start_time must not be after end_time"));
        }

        Ok(Self {
            devices,
            metrics,
            start,
            end,
        })
    }

    /// Cache key over the effective parameters
    pub fn cache_key(&self) -> String {
        CacheKey::query(
            &self.metrics,
            &self.devices,
            &format_query_time(&self.start),
            &format_query_time(&self.end),
        )
    }
}

/// Empty or blank parameters count as absent
fn parse_bound(value: Option<&str>) -> Result<Option<NaiveDateTime>, QueryError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => parse_query_time(v)
            .map(Some)
            .ok_or_else(|| QueryError::input("Invalid timestamp format")),
    }
}

/// Split a comma-separated list, trimming and de-duplicating entries.
/// Returns `None` if any entry is empty.
fn split_list(raw: &str) -> Option<Vec<String>> {
    let mut items: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            return None;
        }
        if !items.iter().any(|existing| existing == part) {
            items.push(part.to_string());
        }
    }
    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(12, 30, 45)
            .unwrap()
    }

    fn params(devices: &str, metrics: &str, start: Option<&str>, end: Option<&str>) -> DataParams {
        DataParams {
            devices: Some(devices.to_string()),
            metrics: Some(metrics.to_string()),
            start_time: start.map(str::to_string),
            end_time: end.map(str::to_string),
        }
    }

    fn input_message(err: QueryError) -> String {
        match err {
            QueryError::Input(msg) => msg,
            other => panic!("expected input error, got {other:?}"),
        }
    }

    #[test]
    fn test_parses_explicit_bounds() {
        let q = TelemetryQuery::from_params(
            &params("d1,d2", "temperature,co2", Some("2024-01-01T00:00"), Some("2024-01-01T00:10")),
            now(),
        )
        .unwrap();
        assert_eq!(q.devices, vec!["d1", "d2"]);
        assert_eq!(q.metrics, vec!["temperature", "co2"]);
        assert_eq!(q.start.to_string(), "2024-01-01 00:00:00");
        assert_eq!(q.end.to_string(), "2024-01-01 00:10:00");
    }

    #[test]
    fn test_defaults_to_last_day_at_minute_precision() {
        let q = TelemetryQuery::from_params(&params("d1", "co2", None, None), now()).unwrap();
        assert_eq!(q.end.to_string(), "2024-01-02 12:30:00");
        assert_eq!(q.start.to_string(), "2024-01-01 12:30:00");
    }

    #[test]
    fn test_blank_bound_uses_default() {
        let q = TelemetryQuery::from_params(&params("d1", "co2", Some(""), None), now()).unwrap();
        assert_eq!(q.start.to_string(), "2024-01-01 12:30:00");
    }

    #[test]
    fn test_no_parameters() {
        let err = TelemetryQuery::from_params(&DataParams::default(), now()).unwrap_err();
        assert_eq!(input_message(err), "No query parameters");
    }

    #[test]
    fn test_missing_devices_or_metrics() {
        let p = DataParams {
            metrics: Some("co2".to_string()),
            ..Default::default()
        };
        let err = TelemetryQuery::from_params(&p, now()).unwrap_err();
        assert_eq!(input_message(err), "Invalid parameters");

        let err = TelemetryQuery::from_params(&params("d1,,d2", "co2", None, None), now()).unwrap_err();
        assert_eq!(input_message(err), "Invalid parameters");
    }

    #[test]
    fn test_malformed_timestamp() {
        let err = TelemetryQuery::from_params(
            &params("d1", "co2", Some("not-a-date"), None),
            now(),
        )
        .unwrap_err();
        assert_eq!(input_message(err), "Invalid timestamp format");
    }

    #[test]
    fn test_start_after_end() {
        let err = TelemetryQuery::from_params(
            &params("d1", "co2", Some("2024-01-02T00:00"), Some("2024-01-01T00:00")),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, QueryError::Input(_)));
    }

    #[test]
    fn test_rejects_unsafe_identifiers() {
        assert!(TelemetryQuery::from_params(&params("d1'--", "co2", None, None), now()).is_err());
        assert!(
            TelemetryQuery::from_params(&params("d1", "co2 OR 1=1", None, None), now()).is_err()
        );
    }

    #[test]
    fn test_rejects_too_many_devices() {
        let devices = (0..=MAX_DEVICES)
            .map(|i| format!("d{i}"))
            .collect::<Vec<_>>()
            .join(",");
        assert!(TelemetryQuery::from_params(&params(&devices, "co2", None, None), now()).is_err());
    }

    #[test]
    fn test_duplicates_collapse() {
        let q = TelemetryQuery::from_params(&params("d1, d1 ,d2", "co2,co2", None, None), now())
            .unwrap();
        assert_eq!(q.devices, vec!["d1", "d2"]);
        assert_eq!(q.metrics, vec!["co2"]);
    }

    #[test]
    fn test_cache_key_uses_effective_bounds() {
        let implicit = TelemetryQuery::from_params(&params("d2,d1", "co2", None, None), now())
            .unwrap();
        let explicit = TelemetryQuery::from_params(
            &params("d1,d2", "co2", Some("2024-01-01T12:30"), Some("2024-01-02T12:30")),
            now(),
        )
        .unwrap();
        assert_eq!(implicit.cache_key(), explicit.cache_key());
        assert_eq!(
            explicit.cache_key(),
            "co2_d1_d2_2024-01-01T12:30_2024-01-02T12:30"
        );
    }
}
