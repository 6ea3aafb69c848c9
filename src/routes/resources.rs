// ABOUTME: Learning resource routes
// ABOUTME: Public ordered listing of visible items, admin create/update/delete
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::{
    created, deleted, ok, optional_text, published_only, required_text, JsonBody, QueryParams,
};
use crate::database::{LearningResourceUpdate, NewLearningResource};
use crate::resources::ServerResources;
use axum::{
    extract::{Json, Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::{get, patch},
    Router,
};
use axum_extra::extract::WithRejection;
use portal_core::{
    errors::AppError,
    models::{ResourceKind, SkillLevel},
    permissions::Capability,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
struct ResourceListQuery {
    visible: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResourceBody {
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "type")]
    kind: Option<ResourceKind>,
    url: Option<String>,
    storage_key: Option<String>,
    duration: Option<String>,
    size: Option<String>,
    level: Option<SkillLevel>,
    order: Option<i64>,
    visible: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResourceBody {
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "type")]
    kind: Option<ResourceKind>,
    url: Option<String>,
    storage_key: Option<String>,
    duration: Option<String>,
    size: Option<String>,
    level: Option<SkillLevel>,
    order: Option<i64>,
    visible: Option<bool>,
}

/// Learning resource routes
pub struct ResourceRoutes;

impl ResourceRoutes {
    /// Create all learning resource routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/resources",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/resources/:id",
                patch(Self::handle_update).delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Handle GET /api/resources
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        WithRejection(Query(query), _): QueryParams<ResourceListQuery>,
    ) -> Result<Response, AppError> {
        let viewer = resources.gate.identify(&headers);
        let visible_only = published_only(viewer.as_ref(), query.visible);

        let items = resources
            .database
            .list_learning_resources(visible_only)
            .await?;
        Ok(ok(serde_json::json!({ "resources": items })))
    }

    /// Handle POST /api/resources
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        WithRejection(Json(body), _): JsonBody<CreateResourceBody>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ManageCatalog)?;

        let new = NewLearningResource {
            title: required_text(body.title, "title")?,
            description: optional_text(body.description),
            kind: body.kind.ok_or_else(|| AppError::missing_field("type"))?,
            url: optional_text(body.url),
            storage_key: optional_text(body.storage_key),
            duration: optional_text(body.duration),
            size: optional_text(body.size),
            level: body.level,
            order: body.order.unwrap_or(0),
            visible: body.visible.unwrap_or(true),
        };
        let resource = resources.database.create_learning_resource(&new).await?;

        info!(resource_id = %resource.id, kind = resource.kind.as_str(), "Learning resource added");
        Ok(created(serde_json::json!({ "resource": resource })))
    }

    /// Handle PATCH /api/resources/:id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        WithRejection(Json(body), _): JsonBody<UpdateResourceBody>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ManageCatalog)?;

        let update = LearningResourceUpdate {
            title: optional_text(body.title),
            description: optional_text(body.description),
            kind: body.kind,
            url: optional_text(body.url),
            storage_key: optional_text(body.storage_key),
            duration: optional_text(body.duration),
            size: optional_text(body.size),
            level: body.level,
            order: body.order,
            visible: body.visible,
        };
        let resource = resources
            .database
            .update_learning_resource(&id, &update)
            .await?
            .ok_or_else(|| AppError::not_found("Resource"))?;

        info!(resource_id = %resource.id, "Learning resource updated");
        Ok(ok(serde_json::json!({ "resource": resource })))
    }

    /// Handle DELETE /api/resources/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ManageCatalog)?;

        if !resources.database.delete_learning_resource(&id).await? {
            return Err(AppError::not_found("Resource"));
        }

        info!(resource_id = %id, "Learning resource deleted");
        Ok(deleted("Resource"))
    }
}
