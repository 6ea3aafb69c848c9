// ABOUTME: Login route exchanging a handle and secret for an access token
// ABOUTME: Delegates to the credential verifier and returns the token with the account view
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::{ok, AccountView, JsonBody};
use crate::resources::ServerResources;
use axum::{
    extract::{Json, State},
    response::Response,
    routing::post,
    Router,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use portal_core::errors::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Handle, matched case-insensitively
    pub username: Option<String>,
    /// Secret
    pub password: Option<String>,
}

/// Login response with token
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token
    pub token: String,
    /// Token expiry
    pub expires_at: DateTime<Utc>,
    /// The logged-in account
    pub user: AccountView,
}

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create the login route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/login", post(Self::handle_login))
            .with_state(resources)
    }

    /// Handle POST /api/auth/login
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        WithRejection(Json(request), _): JsonBody<LoginRequest>,
    ) -> Result<Response, AppError> {
        let username = request.username.unwrap_or_default();
        let password = request.password.unwrap_or_default();

        let authenticated = resources
            .verifier
            .authenticate(&username, &password)
            .await?;

        Ok(ok(LoginResponse {
            token: authenticated.token.token,
            expires_at: authenticated.token.expires_at,
            user: AccountView::from(&authenticated.account),
        }))
    }
}
