//! Continuation-token reads over the cold tier

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::BACKEND;
use crate::data::error::DataError;
use crate::data::paging::fetch_page;
use crate::data::traits::ColdStore;

/// Reads positional rows from a [`ColdStore`], following continuation tokens
#[derive(Clone)]
pub struct ColdReader {
    store: Arc<dyn ColdStore>,
    timeout: Duration,
}

impl ColdReader {
    pub fn new(store: Arc<dyn ColdStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Run `query` to completion. Any failed page aborts the read.
    pub async fn read(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Vec<Option<String>>>, DataError> {
        tracing::debug!(query, "Running cold tier query");

        let mut rows = Vec::new();
        let mut next_token = None;
        let mut pages = 0usize;

        loop {
            let page = fetch_page(
                BACKEND,
                self.timeout,
                cancel,
                self.store.query_page(query, next_token.take()),
            )
            .await
            .inspect_err(|e| {
                if e.is_validation() {
                    tracing::error!(error = %e, query, "Cold tier rejected query");
                } else {
                    tracing::error!(error = %e, "Cold tier query failed");
                }
            })?;

            pages += 1;
            tracing::debug!(page = pages, rows = page.rows.len(), "Fetched cold tier page");
            rows.extend(page.rows);

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(rows = rows.len(), pages, "Cold tier read complete");
        Ok(rows)
    }
}
