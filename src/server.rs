// ABOUTME: HTTP server assembly for the portal API
// ABOUTME: Merges route groups, applies tracing, request-id, CORS, timeout and body-limit layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use crate::middleware::{create_request_span, setup_cors, REQUEST_ID_HEADER};
use crate::resources::ServerResources;
use crate::routes::{
    AdminRoutes, AnnouncementRoutes, AuthRoutes, DeviceRoutes, DownloadRoutes, HealthRoutes,
    ReleaseRoutes, ResourceRoutes, SettingRoutes, TicketRoutes, UserRoutes,
};
use anyhow::{Context, Result};
use axum::{http::HeaderName, http::StatusCode, Router};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Upper bound on a single request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Largest accepted request body
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The portal HTTP server
pub struct PortalServer {
    resources: Arc<ServerResources>,
}

impl PortalServer {
    /// Create a server over shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Build the complete router with middleware
    pub fn router(&self) -> Router {
        let resources = &self.resources;
        let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(create_request_span))
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                REQUEST_TIMEOUT,
            ))
            .map_response(|res: axum::response::Response<_>| res.map(axum::body::Body::new))
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
            .layer(setup_cors(&resources.config));

        Router::new()
            .merge(HealthRoutes::routes(resources.clone()))
            .merge(AuthRoutes::routes(resources.clone()))
            .merge(UserRoutes::routes(resources.clone()))
            .merge(DeviceRoutes::routes(resources.clone()))
            .merge(ReleaseRoutes::routes(resources.clone()))
            .merge(TicketRoutes::routes(resources.clone()))
            .merge(AnnouncementRoutes::routes(resources.clone()))
            .merge(ResourceRoutes::routes(resources.clone()))
            .merge(SettingRoutes::routes(resources.clone()))
            .merge(DownloadRoutes::routes(resources.clone()))
            .merge(AdminRoutes::routes(resources.clone()))
            .layer(middleware)
    }

    /// Serve until `shutdown` resolves
    ///
    /// # Errors
    ///
    /// Returns an error if binding or serving fails
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let addr = format!(
            "{}:{}",
            self.resources.config.host, self.resources.config.http_port
        );
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;

        info!(address = %addr, "Portal server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server error")?;

        info!("Portal server stopped");
        Ok(())
    }
}

/// Resolve on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
