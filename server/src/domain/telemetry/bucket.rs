//! Time bucketing for long query spans

use std::num::NonZeroU32;

use chrono::{NaiveDateTime, TimeDelta};

use crate::core::constants::{AGGREGATION_THRESHOLD_SECS, BASE_BUCKET_SECS};

/// Width of one aggregation bucket, never zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketInterval(NonZeroU32);

impl BucketInterval {
    pub fn from_secs(secs: u32) -> Option<Self> {
        NonZeroU32::new(secs).map(Self)
    }

    pub fn secs(self) -> i64 {
        i64::from(self.0.get())
    }

    /// Start of the bucket containing `ts`, with buckets aligned to `origin`
    pub fn bucket_start(self, ts: NaiveDateTime, origin: NaiveDateTime) -> NaiveDateTime {
        let width = self.secs();
        let index = (ts - origin).num_seconds().div_euclid(width);
        origin + TimeDelta::seconds(index * width)
    }
}

/// Aggregation interval for a query span.
///
/// Spans up to one day are returned raw. Longer spans get
/// `round(300 * span_days)` second buckets (ties to even), so a response
/// stays near 288 buckets per device regardless of span.
pub fn interval(start: NaiveDateTime, end: NaiveDateTime) -> Option<BucketInterval> {
    let span = (end - start).num_seconds();
    if span <= AGGREGATION_THRESHOLD_SECS {
        return None;
    }
    let ratio = span as f64 / AGGREGATION_THRESHOLD_SECS as f64;
    let secs = (BASE_BUCKET_SECS * ratio).round_ties_even();
    if secs > f64::from(u32::MAX) {
        return BucketInterval::from_secs(u32::MAX);
    }
    BucketInterval::from_secs(secs as u32)
}
