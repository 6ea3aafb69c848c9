// ABOUTME: Admin console routes
// ABOUTME: Dashboard analytics over accounts, tickets, releases, content and devices
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::ok;
use crate::resources::ServerResources;
use axum::{extract::State, http::HeaderMap, response::Response, routing::get, Router};
use chrono::Utc;
use portal_core::{errors::AppError, permissions::Capability};
use std::sync::Arc;

/// Admin routes
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/admin/analytics", get(Self::handle_analytics))
            .with_state(resources)
    }

    /// Handle GET /api/admin/analytics
    async fn handle_analytics(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ViewAnalytics)?;

        let analytics = resources.database.portal_analytics(Utc::now()).await?;
        Ok(ok(analytics))
    }
}
