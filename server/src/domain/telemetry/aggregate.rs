//! Bucket aggregation for hot tier records

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use super::bucket::BucketInterval;
use super::registry;
use super::types::{MetricValue, NormalizedRecord};

/// Collapse records into one per (bucket start, device).
///
/// Buckets are aligned to `origin`. Each requested metric seen in at least one
/// member of a group is reduced with its registry rule. The output is ordered
/// by (time, device).
pub fn aggregate(
    records: Vec<NormalizedRecord>,
    metrics: &[String],
    origin: NaiveDateTime,
    interval: BucketInterval,
) -> Vec<NormalizedRecord> {
    let input_len = records.len();
    let mut groups: BTreeMap<(NaiveDateTime, String), BTreeMap<String, Vec<MetricValue>>> =
        BTreeMap::new();

    for record in records {
        let bucket = interval.bucket_start(record.time, origin);
        let members = groups.entry((bucket, record.device)).or_default();
        for (metric, value) in record.values {
            if metrics.contains(&metric) {
                members.entry(metric).or_default().push(value);
            }
        }
    }

    let aggregated: Vec<NormalizedRecord> = groups
        .into_iter()
        .map(|((time, device), members)| {
            let mut record = NormalizedRecord::new(time, device);
            for (metric, values) in members {
                let reduced = registry::reduce(&metric, &values);
                record.values.insert(metric, reduced);
            }
            record
        })
        .collect();

    tracing::debug!(
        input = input_len,
        output = aggregated.len(),
        interval_secs = interval.secs(),
        "Aggregated records"
    );
    aggregated
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn record(time: NaiveDateTime, device: &str, values: &[(&str, MetricValue)]) -> NormalizedRecord {
        let mut r = NormalizedRecord::new(time, device);
        for (k, v) in values {
            r.values.insert(k.to_string(), v.clone());
        }
        r
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_aggregate_max_per_bucket() {
        let records = vec![
            record(ts(1, 0, 0), "d1", &[("temperature", MetricValue::Float(21.0))]),
            record(ts(1, 0, 5), "d1", &[("temperature", MetricValue::Float(22.0))]),
        ];
        let interval = BucketInterval::from_secs(600).unwrap();
        let out = aggregate(records, &strings(&["temperature"]), ts(1, 0, 0), interval);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].time, ts(1, 0, 0));
        assert_eq!(out[0].values.get("temperature"), Some(&MetricValue::Float(22.0)));
    }

    #[test]
    fn test_aggregate_presence_and_ordering() {
        let on = MetricValue::Text("on".into());
        let off = MetricValue::Text("off".into());
        let records = vec![
            record(ts(1, 0, 12), "d2", &[("presence", off.clone())]),
            record(ts(1, 0, 1), "d2", &[("presence", off.clone())]),
            record(ts(1, 0, 2), "d1", &[("presence", off.clone())]),
            record(ts(1, 0, 3), "d1", &[("presence", on.clone())]),
        ];
        let interval = BucketInterval::from_secs(600).unwrap();
        let out = aggregate(records, &strings(&["presence"]), ts(1, 0, 0), interval);

        let summary: Vec<_> = out
            .iter()
            .map(|r| (r.time, r.device.as_str(), r.values.get("presence").cloned()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ts(1, 0, 0), "d1", Some(on)),
                (ts(1, 0, 0), "d2", Some(off.clone())),
                (ts(1, 0, 10), "d2", Some(off)),
            ]
        );
    }

    #[test]
    fn test_aggregate_times_are_aligned_to_origin() {
        let origin = ts(1, 0, 7);
        let interval = BucketInterval::from_secs(900).unwrap();
        let records = (0..12)
            .map(|i| {
                record(
                    origin + chrono::TimeDelta::minutes(i * 7),
                    "d1",
                    &[("co2", MetricValue::Integer(i))],
                )
            })
            .collect();
        let out = aggregate(records, &strings(&["co2"]), origin, interval);

        for r in &out {
            assert_eq!((r.time - origin).num_seconds() % interval.secs(), 0);
        }
    }

    #[test]
    fn test_aggregate_only_metrics_present_in_group() {
        let records = vec![
            record(ts(1, 0, 0), "d1", &[("co2", MetricValue::Integer(400))]),
            record(ts(1, 0, 30), "d1", &[("voc", MetricValue::Integer(90))]),
        ];
        let interval = BucketInterval::from_secs(600).unwrap();
        let out = aggregate(records, &strings(&["co2", "voc"]), ts(1, 0, 0), interval);

        assert_eq!(out.len(), 2);
        assert!(out[0].values.contains_key("co2"));
        assert!(!out[0].values.contains_key("voc"));
        assert!(out[1].values.contains_key("voc"));
    }
}
