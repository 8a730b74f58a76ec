//! In-memory tier stores for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::DataError;
use super::traits::{
    ColdPage, ColdStore, HotCursor, HotItem, HotPage, HotPageRequest, HotStore, RawValue,
};

/// Hot store serving items from memory, one item per page
#[derive(Default)]
pub struct MemoryHotStore {
    items: Mutex<Vec<HotItem>>,
    calls: AtomicUsize,
    failure: Mutex<Option<fn() -> DataError>>,
}

impl MemoryHotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reading: `time` is `YYYY-MM-DD HH:MM:SS`
    pub fn insert(&self, time: &str, device: &str, payload: &[(&str, RawValue)]) {
        let (date, clock) = time.split_once(' ').unwrap_or((time, "00:00:00"));
        self.items.lock().push(HotItem {
            pk: date.to_string(),
            sk: format!("{clock}#{device}"),
            payload: payload
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<HashMap<_, _>>(),
        });
    }

    pub fn fail_with(&self, failure: fn() -> DataError) {
        *self.failure.lock() = Some(failure);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HotStore for MemoryHotStore {
    async fn query_page(
        &self,
        request: &HotPageRequest,
        cursor: Option<HotCursor>,
    ) -> Result<HotPage, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.failure.lock() {
            return Err(failure());
        }

        let pk = request.partition();
        let mut matching: Vec<HotItem> = self
            .items
            .lock()
            .iter()
            .filter(|i| {
                i.pk == pk && i.sk.as_str() >= request.from_sk.as_str() && i.sk <= request.to_sk
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.sk.cmp(&b.sk));

        let remaining: Vec<HotItem> = match &cursor {
            Some(c) => matching.into_iter().filter(|i| i.sk > c.sk).collect(),
            None => matching,
        };

        let mut iter = remaining.into_iter();
        let Some(first) = iter.next() else {
            return Ok(HotPage::default());
        };
        let cursor = iter.next().map(|_| HotCursor {
            pk: first.pk.clone(),
            sk: first.sk.clone(),
        });
        Ok(HotPage {
            items: vec![first],
            cursor,
        })
    }
}

/// Cold store returning fixed rows in two pages, recording each query
#[derive(Default)]
pub struct MemoryColdStore {
    rows: Mutex<Vec<Vec<Option<String>>>>,
    queries: Mutex<Vec<String>>,
    failure: Mutex<Option<fn() -> DataError>>,
}

impl MemoryColdStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_row(&self, row: &[Option<&str>]) {
        self.rows
            .lock()
            .push(row.iter().map(|c| c.map(str::to_string)).collect());
    }

    pub fn fail_with(&self, failure: fn() -> DataError) {
        *self.failure.lock() = Some(failure);
    }

    /// Distinct statements executed (continuation calls are not repeated)
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl ColdStore for MemoryColdStore {
    async fn query_page(
        &self,
        query: &str,
        next_token: Option<String>,
    ) -> Result<ColdPage, DataError> {
        if let Some(failure) = *self.failure.lock() {
            return Err(failure());
        }

        let rows = self.rows.lock().clone();
        let split = rows.len().div_ceil(2);
        match next_token.as_deref() {
            None => {
                self.queries.lock().push(query.to_string());
                Ok(ColdPage {
                    rows: rows[..split].to_vec(),
                    next_token: (split < rows.len()).then(|| "page-2".to_string()),
                })
            }
            Some(_) => Ok(ColdPage {
                rows: rows[split..].to_vec(),
                next_token: None,
            }),
        }
    }
}
