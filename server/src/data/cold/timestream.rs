//! Timestream-backed cold tier store

use async_trait::async_trait;
use aws_sdk_timestreamquery::Client;
use aws_sdk_timestreamquery::error::DisplayErrorContext;
use aws_sdk_timestreamquery::types::Datum;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::BACKEND;
use crate::data::error::DataError;
use crate::data::traits::{ColdPage, ColdStore};

#[derive(Debug, Clone)]
pub struct TimestreamColdStore {
    client: Client,
}

impl TimestreamColdStore {
    /// Connect with endpoint discovery.
    ///
    /// Timestream only serves queries on discovered endpoints; the returned
    /// task keeps them fresh until shutdown is signalled.
    pub async fn connect(
        config: &aws_config::SdkConfig,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(Self, JoinHandle<()>), DataError> {
        let (client, reload) = Client::new(config)
            .with_endpoint_discovery_enabled()
            .await
            .map_err(|e| DataError::unavailable(BACKEND, format!("endpoint discovery failed: {e}")))?;

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = reload.reload_task() => {
                    tracing::debug!("Timestream endpoint reload task exited");
                }
                _ = shutdown_rx.wait_for(|&v| v) => {
                    tracing::debug!("Timestream endpoint reload task stopped");
                }
            }
        });

        tracing::debug!("Timestream cold tier initialized");
        Ok((Self { client }, handle))
    }
}

#[async_trait]
impl ColdStore for TimestreamColdStore {
    async fn query_page(
        &self,
        query: &str,
        next_token: Option<String>,
    ) -> Result<ColdPage, DataError> {
        let output = self
            .client
            .query()
            .query_string(query)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(service_err) if service_err.is_validation_exception() => {
                    DataError::validation(BACKEND, service_err.to_string())
                }
                _ => DataError::unavailable(BACKEND, DisplayErrorContext(&e).to_string()),
            })?;

        let rows = output
            .rows()
            .iter()
            .map(|row| row.data().iter().map(scalar).collect())
            .collect();

        Ok(ColdPage {
            rows,
            next_token: output.next_token().map(str::to_owned),
        })
    }
}

/// Scalar text of a datum; nulls and nested values map to `None`
fn scalar(datum: &Datum) -> Option<String> {
    if datum.null_value() == Some(true) {
        return None;
    }
    datum.scalar_value().map(str::to_owned)
}
