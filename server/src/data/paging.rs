//! Per-page deadline and cancellation shared by both tier readers

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::error::DataError;

/// Run one backend page request under a timeout.
///
/// Cancellation is checked before the request is issued, so a cancelled
/// query never starts another page.
pub(crate) async fn fetch_page<T, F>(
    backend: &'static str,
    timeout: Duration,
    cancel: &CancellationToken,
    request: F,
) -> Result<T, DataError>
where
    F: Future<Output = Result<T, DataError>>,
{
    if cancel.is_cancelled() {
        tracing::debug!(backend, "Query cancelled before next page");
        return Err(DataError::Cancelled);
    }

    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(backend, timeout_secs = timeout.as_secs(), "Page request timed out");
            Err(DataError::Timeout {
                backend,
                timeout_secs: timeout.as_secs(),
            })
        }
    }
}
