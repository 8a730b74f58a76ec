//! Conversion of native tier rows into [`NormalizedRecord`]s

use chrono::NaiveDateTime;

use super::registry;
use super::types::{MetricValue, NormalizedRecord, sort_records};
use crate::core::constants::{HOT_SORT_KEY_SEPARATOR, RECORD_TIME_FORMAT};
use crate::data::cold::BACKEND as COLD;
use crate::data::hot::BACKEND as HOT;
use crate::data::{DataError, HotItem};
use crate::utils::time::parse_record_time;

/// Normalize hot tier items.
///
/// Items for devices outside `devices` are dropped, payload entries outside
/// `metrics` are ignored, and values are coerced per the registry. A value
/// that fails coercion becomes an explicit null.
pub fn normalize_hot(
    items: Vec<HotItem>,
    devices: &[String],
    metrics: &[String],
) -> Result<Vec<NormalizedRecord>, DataError> {
    let mut records = Vec::with_capacity(items.len());

    for item in items {
        let Some((sk_time, device)) = item.sk.split_once(HOT_SORT_KEY_SEPARATOR) else {
            return Err(DataError::malformed(
                HOT,
                format!("sort key '{}' has no device part", item.sk),
            ));
        };
        if !devices.iter().any(|d| d == device) {
            continue;
        }

        let time_text = format!("{} {}", item.pk, sk_time);
        let time = NaiveDateTime::parse_from_str(&time_text, RECORD_TIME_FORMAT)
            .map_err(|_| DataError::malformed(HOT, format!("invalid item time '{time_text}'")))?;

        let mut record = NormalizedRecord::new(time, device);
        for (metric, raw) in &item.payload {
            if !metrics.contains(metric) {
                continue;
            }
            let value = registry::coerce(metric, raw).unwrap_or_else(|e| {
                tracing::debug!(error = %e, device, "Coercion failed, using null");
                MetricValue::Null
            });
            record.values.insert(metric.clone(), value);
        }
        records.push(record);
    }

    sort_records(&mut records);
    tracing::debug!(records = records.len(), "Normalized hot tier items");
    Ok(records)
}

/// Normalize positional cold tier rows.
///
/// Columns 0 and 1 are the timestamp (or bucket) and device; column `i + 2`
/// holds `metrics[i]`. Backend nulls leave the metric out of the record.
pub fn normalize_cold(
    rows: Vec<Vec<Option<String>>>,
    metrics: &[String],
) -> Result<Vec<NormalizedRecord>, DataError> {
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let mut columns = row.into_iter();
        let time_text = columns.next().flatten().ok_or_else(|| {
            DataError::malformed(COLD, "row is missing its time column")
        })?;
        let device = columns.next().flatten().ok_or_else(|| {
            DataError::malformed(COLD, "row is missing its device column")
        })?;
        let time = parse_record_time(&time_text)
            .ok_or_else(|| DataError::malformed(COLD, format!("invalid row time '{time_text}'")))?;

        let mut record = NormalizedRecord::new(time, device);
        for (metric, cell) in metrics.iter().zip(columns) {
            let Some(text) = cell else {
                continue;
            };
            let value = registry::coerce_text(metric, &text).unwrap_or_else(|e| {
                tracing::debug!(error = %e, "Coercion failed, using null");
                MetricValue::Null
            });
            record.values.insert(metric.clone(), value);
        }
        records.push(record);
    }

    sort_records(&mut records);
    tracing::debug!(records = records.len(), "Normalized cold tier rows");
    Ok(records)
}
