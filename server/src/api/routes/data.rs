//! Telemetry query endpoint

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Extension, Json, Router};
use tokio_util::sync::CancellationToken;

use crate::api::auth::Caller;
use crate::api::types::ApiError;
use crate::domain::QueryRouter;
use crate::domain::telemetry::{DataParams, SharedResponse};
use crate::utils::time::utc_now;

/// Shared state for the query endpoint
#[derive(Clone)]
pub struct DataApiState {
    pub router: Arc<QueryRouter>,
    /// Cancelled on shutdown; stops pagination between pages
    pub cancel: CancellationToken,
}

/// Build query routes
pub fn routes(router: Arc<QueryRouter>, cancel: CancellationToken) -> Router<()> {
    Router::new()
        .route("/data", get(get_data))
        .with_state(DataApiState { router, cancel })
}

/// `GET /data?devices=..&metrics=..&start_time=..&end_time=..`
pub async fn get_data(
    State(state): State<DataApiState>,
    Extension(caller): Extension<Caller>,
    params: Result<Query<DataParams>, QueryRejection>,
) -> Result<Json<SharedResponse>, ApiError> {
    let Query(params) = params.map_err(|e| {
        tracing::debug!(error = %e, "Unreadable query string");
        ApiError::bad_request("Invalid parameters")
    })?;

    tracing::info!(
        subject = %caller.subject,
        devices = params.devices.as_deref().unwrap_or_default(),
        metrics = params.metrics.as_deref().unwrap_or_default(),
        "Telemetry query"
    );

    let response = state
        .router
        .query(&params, utc_now(), &state.cancel)
        .await?;

    tracing::debug!(rows = response.data.len(), "Query complete");
    Ok(Json(response))
}
