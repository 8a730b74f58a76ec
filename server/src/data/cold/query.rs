//! Cold tier query text generation
//!
//! Produces one statement per request. Every device id and metric name is
//! checked before it is embedded, and all values go in as quoted literals.

use chrono::NaiveDateTime;

use super::BACKEND;
use crate::core::constants::COLD_DEVICE_COLUMN;
use crate::data::error::DataError;
use crate::utils::sql::{is_plain_identifier, quote_identifier, quote_literal};
use crate::utils::time::format_record_time;

/// Measure value column a metric is stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureType {
    Double,
    Bigint,
    Varchar,
}

impl MeasureType {
    fn column(self) -> &'static str {
        match self {
            MeasureType::Double => "measure_value::double",
            MeasureType::Bigint => "measure_value::bigint",
            MeasureType::Varchar => "measure_value::varchar",
        }
    }
}

/// Device identifiers are restricted to a conservative character set
pub fn is_valid_device_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}

/// Inputs for one cold tier statement
#[derive(Debug, Clone)]
pub struct ColdQuery<'a> {
    pub database: &'a str,
    pub table: &'a str,
    pub devices: &'a [String],
    /// Requested metrics in response column order
    pub metrics: &'a [(String, MeasureType)],
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Bucket width in seconds; `None` selects raw rows
    pub bucket_secs: Option<i64>,
}

impl ColdQuery<'_> {
    /// Render the statement.
    ///
    /// Column 0 is the timestamp (or bucket), column 1 the device, and the
    /// remaining columns follow `metrics` one-to-one.
    pub fn build(&self) -> Result<String, DataError> {
        if self.devices.is_empty() || self.metrics.is_empty() {
            return Err(DataError::validation(
                BACKEND,
                "at least one device and one metric are required",
            ));
        }
        if let Some(bad) = self.devices.iter().find(|d| !is_valid_device_id(d)) {
            return Err(DataError::validation(
                BACKEND,
                format!("invalid device identifier '{bad}'"),
            ));
        }
        if let Some((bad, _)) = self.metrics.iter().find(|(m, _)| !is_plain_identifier(m)) {
            return Err(DataError::validation(
                BACKEND,
                format!("invalid metric name '{bad}'"),
            ));
        }
        if let Some(secs) = self.bucket_secs
            && secs <= 0
        {
            return Err(DataError::validation(BACKEND, "bucket width must be positive"));
        }

        let projections = self
            .metrics
            .iter()
            .map(|(name, ty)| {
                format!(
                    "MAX(CASE WHEN measure_name = {} THEN {} END) AS {}",
                    quote_literal(name),
                    ty.column(),
                    name
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        let devices = join_literals(self.devices.iter().map(String::as_str));
        let measures = join_literals(self.metrics.iter().map(|(m, _)| m.as_str()));

        let (time_expr, group_expr, order_expr) = match self.bucket_secs {
            Some(secs) => {
                let bucket = self.bucket_expr(secs);
                (
                    format!("{bucket} AS binned_time"),
                    bucket,
                    "binned_time".to_string(),
                )
            }
            None => ("time".to_string(), "time".to_string(), "time".to_string()),
        };

        Ok(format!(
            "SELECT {time_expr}, {COLD_DEVICE_COLUMN}, {projections} \
             FROM {}.{} \
             WHERE {COLD_DEVICE_COLUMN} IN ({devices}) \
             AND measure_name IN ({measures}) \
             AND time BETWEEN {} AND {} \
             GROUP BY {group_expr}, {COLD_DEVICE_COLUMN} \
             ORDER BY {order_expr}",
            quote_identifier(self.database),
            quote_identifier(self.table),
            quote_literal(&format_record_time(&self.start)),
            quote_literal(&format_record_time(&self.end)),
        ))
    }

    /// Bucket start aligned to `start`, not to the epoch as `BIN` would be.
    /// Rows satisfy `time >= start`, so integer division floors.
    fn bucket_expr(&self, secs: i64) -> String {
        let anchor = format!(
            "TIMESTAMP {}",
            quote_literal(&format_record_time(&self.start))
        );
        format!(
            "date_add('second', (date_diff('second', {anchor}, time) / {secs}) * {secs}, {anchor})"
        )
    }
}

fn join_literals<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.map(quote_literal).collect::<Vec<_>>().join(", ")
}
