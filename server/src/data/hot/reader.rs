//! Day-partitioned range reads over the hot tier

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime};
use tokio_util::sync::CancellationToken;

use super::BACKEND;
use crate::core::constants::HOT_SORT_KEY_SEPARATOR;
use crate::data::error::DataError;
use crate::data::paging::fetch_page;
use crate::data::traits::{HotItem, HotPageRequest, HotStore};

/// Upper bound suffix that sorts after every `time#device` key sharing the time
const SORT_KEY_CEILING: char = char::MAX;

/// Build one key-range request per calendar day in `[start, end]`.
///
/// The first day starts at `start`'s time of day and the last day ends at
/// `end`'s; days in between cover the full day. Upper bounds are inclusive of
/// every device recorded at the bounding second.
pub fn day_requests(start: NaiveDateTime, end: NaiveDateTime) -> Vec<HotPageRequest> {
    let (first, last) = (start.date(), end.date());
    first
        .iter_days()
        .take_while(|day| *day <= last)
        .map(|date| {
            let from = if date == first { start.time() } else { NaiveTime::MIN };
            let to = if date == last {
                end.time()
            } else {
                NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
            };
            HotPageRequest {
                date,
                from_sk: from.format("%H:%M:%S").to_string(),
                to_sk: format!(
                    "{}{}{}",
                    to.format("%H:%M:%S"),
                    HOT_SORT_KEY_SEPARATOR,
                    SORT_KEY_CEILING
                ),
            }
        })
        .collect()
}

/// Reads raw items from a [`HotStore`], following continuation keys
#[derive(Clone)]
pub struct HotReader {
    store: Arc<dyn HotStore>,
    timeout: Duration,
}

impl HotReader {
    pub fn new(store: Arc<dyn HotStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Fetch every item in `[start, end]`. Any failed page aborts the read.
    pub async fn read(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        cancel: &CancellationToken,
    ) -> Result<Vec<HotItem>, DataError> {
        let mut items = Vec::new();

        for request in day_requests(start, end) {
            let mut cursor = None;
            let mut pages = 0usize;
            loop {
                let page = fetch_page(
                    BACKEND,
                    self.timeout,
                    cancel,
                    self.store.query_page(&request, cursor.take()),
                )
                .await
                .inspect_err(|e| {
                    tracing::error!(
                        error = %e,
                        partition = %request.partition(),
                        "Hot tier query failed"
                    );
                })?;

                pages += 1;
                tracing::debug!(
                    partition = %request.partition(),
                    page = pages,
                    items = page.items.len(),
                    "Fetched hot tier page"
                );
                items.extend(page.items);

                match page.cursor {
                    Some(next) => cursor = Some(next),
                    None => break,
                }
            }
        }

        tracing::debug!(items = items.len(), "Hot tier read complete");
        Ok(items)
    }
}
