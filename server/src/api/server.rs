//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::auth::{AuthState, IdentityService, require_auth};
use super::middleware;
use super::routes::{data, health};
use crate::core::CoreApp;
use crate::core::constants::{APP_NAME, DEFAULT_BODY_LIMIT};
use crate::domain::QueryRouter;

pub struct ApiServer {
    app: CoreApp,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        Self { app }
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self { app } = self;

        let shutdown = app.shutdown.clone();
        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);

        let router = build_router(
            app.router.clone(),
            app.identity.clone(),
            shutdown.cancellation_token(),
            &app.config.server.allow_origin,
        )?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(
            address = %addr,
            tier_mode = %app.config.query.tier_mode,
            auth = app.config.auth.enabled,
            "{} listening",
            APP_NAME
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        Ok(app)
    }
}

/// Assemble the HTTP surface: `/data` behind authentication, `/health` open
pub fn build_router(
    query: Arc<QueryRouter>,
    identity: Arc<dyn IdentityService>,
    cancel: CancellationToken,
    allow_origin: &str,
) -> Result<Router> {
    let data_routes = data::routes(query, cancel).route_layer(
        axum::middleware::from_fn_with_state(AuthState { identity }, require_auth),
    );

    Ok(Router::new()
        .route("/health", get(health::health))
        .merge(data_routes)
        .fallback(middleware::handle_404)
        .layer(CompressionLayer::new())
        .layer(middleware::cors(allow_origin)?)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT)))
}
