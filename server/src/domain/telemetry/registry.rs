//! Metric type registry
//!
//! Static mapping from metric name to semantic kind. The kind decides how raw
//! values are coerced, which cold tier measure column holds the metric, and
//! how bucket members are reduced. Metrics not listed here pass through
//! unclassified.

use std::cmp::Ordering;

use super::error::CoercionError;
use super::types::MetricValue;
use crate::data::RawValue;
use crate::data::cold::MeasureType;

const FLOAT_METRICS: &[&str] = &[
    "temperature",
    "humidity",
    "illuminance",
    "pm1_0",
    "pm2_5",
    "pm4_0",
    "pm10_0",
    "pm2_5_avg_24h",
    "pm10_0_avg_24h",
    "pressure",
    "uv",
];

const INTEGER_METRICS: &[&str] = &["co2", "voc", "nox"];

const CATEGORICAL_METRICS: &[&str] = &["presence"];

/// Categorical value that wins a bucket
const ON: &str = "on";
const OFF: &str = "off";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Float,
    Integer,
    /// On/off state
    Categorical,
}

impl MetricKind {
    /// Cold tier measure column for this kind
    pub fn measure_type(self) -> MeasureType {
        match self {
            MetricKind::Float => MeasureType::Double,
            MetricKind::Integer => MeasureType::Bigint,
            MetricKind::Categorical => MeasureType::Varchar,
        }
    }
}

pub fn classify(metric: &str) -> Option<MetricKind> {
    if FLOAT_METRICS.contains(&metric) {
        Some(MetricKind::Float)
    } else if INTEGER_METRICS.contains(&metric) {
        Some(MetricKind::Integer)
    } else if CATEGORICAL_METRICS.contains(&metric) {
        Some(MetricKind::Categorical)
    } else {
        None
    }
}

/// Coerce a hot tier payload value to its metric's type
pub fn coerce(metric: &str, raw: &RawValue) -> Result<MetricValue, CoercionError> {
    let fail = |value: &str| CoercionError {
        metric: metric.to_string(),
        value: value.to_string(),
    };

    match (classify(metric), raw) {
        (Some(MetricKind::Float), RawValue::Number(s) | RawValue::Text(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(MetricValue::Float)
            .ok_or_else(|| fail(s)),
        (Some(MetricKind::Integer), RawValue::Number(s) | RawValue::Text(s)) => {
            parse_integer(s).map(MetricValue::Integer).ok_or_else(|| fail(s))
        }
        (Some(MetricKind::Categorical), RawValue::Text(s) | RawValue::Number(s)) => {
            Ok(MetricValue::Text(s.clone()))
        }
        (Some(MetricKind::Categorical), RawValue::Bool(b)) => {
            Ok(MetricValue::Text(b.to_string()))
        }
        (Some(_), RawValue::Bool(b)) => Err(fail(&b.to_string())),
        (None, RawValue::Number(s)) => {
            Ok(parse_numeric_text(s).unwrap_or_else(|| MetricValue::Text(s.clone())))
        }
        (None, RawValue::Text(s)) => Ok(MetricValue::Text(s.clone())),
        (None, RawValue::Bool(b)) => Ok(MetricValue::Bool(*b)),
        (_, RawValue::Null) => Ok(MetricValue::Null),
    }
}

/// Integer from whole-number text; a stored `"12.0"` still reads as 12,
/// fractional parts are truncated
fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
            .map(|f| f.trunc() as i64)
    })
}

/// Cold tier scalar text rule: a `.` means float, anything else integer
pub fn parse_numeric_text(s: &str) -> Option<MetricValue> {
    let s = s.trim();
    if s.contains('.') {
        s.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(MetricValue::Float)
    } else {
        s.parse::<i64>().ok().map(MetricValue::Integer)
    }
}

/// Coerce a cold tier scalar to its metric's type
pub fn coerce_text(metric: &str, text: &str) -> Result<MetricValue, CoercionError> {
    if classify(metric) == Some(MetricKind::Categorical) {
        return Ok(MetricValue::Text(unquote(text).to_string()));
    }
    parse_numeric_text(text).ok_or_else(|| CoercionError {
        metric: metric.to_string(),
        value: text.to_string(),
    })
}

/// Remove one layer of surrounding double quotes
fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}

/// Reduce one bucket's values for `metric`.
///
/// Categorical metrics are "on" if any member is "on", else "off". Everything
/// else takes the maximum: numerically when any member is numeric, otherwise
/// lexicographically. Nulls never win; an all-null bucket stays null.
pub fn reduce(metric: &str, values: &[MetricValue]) -> MetricValue {
    let present = values.iter().filter(|v| !v.is_null());

    if classify(metric) == Some(MetricKind::Categorical) {
        let mut any = false;
        for value in present {
            any = true;
            if value.as_str() == Some(ON) {
                return MetricValue::Text(ON.to_string());
            }
        }
        return if any {
            MetricValue::Text(OFF.to_string())
        } else {
            MetricValue::Null
        };
    }

    let numeric_max = present
        .clone()
        .filter_map(|v| v.as_f64().map(|f| (f, v)))
        .max_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|(_, v)| v.clone());
    if let Some(max) = numeric_max {
        return max;
    }

    present
        .filter_map(|v| v.as_str())
        .max()
        .map(|s| MetricValue::Text(s.to_string()))
        .unwrap_or(MetricValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(s: &str) -> RawValue {
        RawValue::Number(s.to_string())
    }

    fn text(s: &str) -> MetricValue {
        MetricValue::Text(s.to_string())
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("temperature"), Some(MetricKind::Float));
        assert_eq!(classify("pm2_5_avg_24h"), Some(MetricKind::Float));
        assert_eq!(classify("co2"), Some(MetricKind::Integer));
        assert_eq!(classify("presence"), Some(MetricKind::Categorical));
        assert_eq!(classify("battery"), None);
    }

    #[test]
    fn test_measure_type() {
        assert_eq!(MetricKind::Float.measure_type(), MeasureType::Double);
        assert_eq!(MetricKind::Integer.measure_type(), MeasureType::Bigint);
        assert_eq!(MetricKind::Categorical.measure_type(), MeasureType::Varchar);
    }

    #[test]
    fn test_coerce_float_and_integer() {
        assert_eq!(
            coerce("temperature", &num("23.5")).unwrap(),
            MetricValue::Float(23.5)
        );
        assert_eq!(coerce("co2", &num("120")).unwrap(), MetricValue::Integer(120));
        assert_eq!(coerce("co2", &num("120.0")).unwrap(), MetricValue::Integer(120));
        assert_eq!(
            coerce("temperature", &RawValue::Text("21".into())).unwrap(),
            MetricValue::Float(21.0)
        );
    }

    #[test]
    fn test_coerce_failure() {
        let err = coerce("temperature", &RawValue::Text("warm".into())).unwrap_err();
        assert_eq!(err.metric, "temperature");
        assert!(coerce("co2", &RawValue::Bool(true)).is_err());
    }

    #[test]
    fn test_coerce_categorical_and_passthrough() {
        assert_eq!(
            coerce("presence", &RawValue::Text("on".into())).unwrap(),
            text("on")
        );
        assert_eq!(coerce("battery", &num("87")).unwrap(), MetricValue::Integer(87));
        assert_eq!(
            coerce("label", &RawValue::Text("lab".into())).unwrap(),
            text("lab")
        );
        assert_eq!(coerce("temperature", &RawValue::Null).unwrap(), MetricValue::Null);
    }

    #[test]
    fn test_coerce_text_cold_rules() {
        assert_eq!(coerce_text("temperature", "23.5").unwrap(), MetricValue::Float(23.5));
        assert_eq!(coerce_text("co2", "120").unwrap(), MetricValue::Integer(120));
        // Rule is textual, not by kind
        assert_eq!(coerce_text("temperature", "21").unwrap(), MetricValue::Integer(21));
        assert_eq!(coerce_text("presence", "\"on\"").unwrap(), text("on"));
        assert_eq!(coerce_text("presence", "off").unwrap(), text("off"));
        assert!(coerce_text("co2", "n/a").is_err());
    }

    #[test]
    fn test_unquote_one_layer() {
        assert_eq!(unquote("\"\"on\"\""), "\"on\"");
        assert_eq!(unquote("\"on"), "\"on");
    }

    #[test]
    fn test_reduce_presence() {
        assert_eq!(reduce("presence", &[text("off"), text("on"), text("off")]), text("on"));
        assert_eq!(reduce("presence", &[text("off"), text("off")]), text("off"));
        assert_eq!(reduce("presence", &[text("unknown")]), text("off"));
        assert_eq!(reduce("presence", &[MetricValue::Null]), MetricValue::Null);
    }

    #[test]
    fn test_reduce_numeric_max() {
        assert_eq!(
            reduce("temperature", &[MetricValue::Float(21.0), MetricValue::Float(22.0)]),
            MetricValue::Float(22.0)
        );
        assert_eq!(
            reduce(
                "co2",
                &[MetricValue::Integer(400), MetricValue::Null, MetricValue::Integer(650)]
            ),
            MetricValue::Integer(650)
        );
        // Mixed numeric representations keep the winning element as-is
        assert_eq!(
            reduce("temperature", &[MetricValue::Integer(21), MetricValue::Float(20.5)]),
            MetricValue::Integer(21)
        );
    }

    #[test]
    fn test_reduce_unclassified_text() {
        assert_eq!(reduce("label", &[text("a"), text("c"), text("b")]), text("c"));
        assert_eq!(reduce("label", &[]), MetricValue::Null);
    }
}
