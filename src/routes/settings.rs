// ABOUTME: Key-value settings routes
// ABOUTME: Public single-key reads, admin listing, upsert, update and delete
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::{deleted, ok, optional_text, required_text, JsonBody};
use crate::database::SettingUpdate;
use crate::resources::ServerResources;
use axum::{
    extract::{Json, Path, State},
    http::HeaderMap,
    response::Response,
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use portal_core::{errors::AppError, permissions::Capability};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
struct UpsertSettingBody {
    key: Option<String>,
    value: Option<serde_json::Value>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UpdateSettingBody {
    value: Option<serde_json::Value>,
    description: Option<String>,
}

/// Settings routes
pub struct SettingRoutes;

impl SettingRoutes {
    /// Create all settings routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/settings",
                get(Self::handle_list).post(Self::handle_upsert),
            )
            .route(
                "/api/settings/:key",
                get(Self::handle_get)
                    .patch(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Handle GET /api/settings
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ListSettings)?;

        let settings = resources.database.list_settings().await?;
        Ok(ok(serde_json::json!({ "settings": settings })))
    }

    /// Handle POST /api/settings
    async fn handle_upsert(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        WithRejection(Json(body), _): JsonBody<UpsertSettingBody>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ManageSettings)?;

        let key = required_text(body.key, "key")?;
        // JSON null deserializes to None here, so a null value counts as missing
        let value = body.value.ok_or_else(|| AppError::missing_field("value"))?;
        let description = optional_text(body.description);

        let setting = resources
            .database
            .upsert_setting(&key, &value, description.as_deref())
            .await?;

        info!(key = %setting.key, "Setting saved");
        Ok(ok(serde_json::json!({ "setting": setting })))
    }

    /// Handle GET /api/settings/:key
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(key): Path<String>,
    ) -> Result<Response, AppError> {
        let setting = resources
            .database
            .get_setting(&key)
            .await?
            .ok_or_else(|| AppError::not_found("Setting"))?;

        Ok(ok(serde_json::json!({ "setting": setting })))
    }

    /// Handle PATCH /api/settings/:key
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(key): Path<String>,
        WithRejection(Json(body), _): JsonBody<UpdateSettingBody>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ManageSettings)?;

        let update = SettingUpdate {
            value: body.value,
            description: optional_text(body.description),
        };
        let setting = resources
            .database
            .update_setting(&key, &update)
            .await?
            .ok_or_else(|| AppError::not_found("Setting"))?;

        info!(key = %setting.key, "Setting updated");
        Ok(ok(serde_json::json!({ "setting": setting })))
    }

    /// Handle DELETE /api/settings/:key
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(key): Path<String>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ManageSettings)?;

        if !resources.database.delete_setting(&key).await? {
            return Err(AppError::not_found("Setting"));
        }

        info!(key = %key, "Setting deleted");
        Ok(deleted("Setting"))
    }
}
