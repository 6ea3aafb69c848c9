// ABOUTME: Software release routes for the download center
// ABOUTME: Public listing with platform and latest filters, admin create/update/delete
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::{
    created, deleted, nullable, ok, optional_text, required_text, JsonBody, QueryParams,
};
use crate::database::{NewRelease, ReleaseFilter, ReleaseUpdate};
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
    errors::{AppError, AppResult},
    models::Platform,
    permissions::Capability,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
struct ReleaseListQuery {
    platform: Option<Platform>,
    latest: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateReleaseBody {
    version: Option<String>,
    file_name: Option<String>,
    platform: Option<Platform>,
    platform_label: Option<String>,
    size: Option<String>,
    changelog: Option<Vec<String>>,
    is_latest: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateReleaseBody {
    version: Option<String>,
    file_name: Option<String>,
    platform: Option<Platform>,
    platform_label: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    size: Option<Option<String>>,
    changelog: Option<Vec<String>>,
    is_latest: Option<bool>,
}

/// Drop blank changelog lines
fn clean_changelog(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| line.trim().to_owned())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Release routes
pub struct ReleaseRoutes;

impl ReleaseRoutes {
    /// Create all release routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/releases",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/releases/:id",
                patch(Self::handle_update).delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Handle GET /api/releases
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        WithRejection(Query(query), _): QueryParams<ReleaseListQuery>,
    ) -> Result<Response, AppError> {
        let releases = resources
            .database
            .list_releases(ReleaseFilter {
                platform: query.platform,
                latest_only: query.latest.unwrap_or(false),
            })
            .await?;

        Ok(ok(serde_json::json!({ "releases": releases })))
    }

    /// Handle POST /api/releases
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        WithRejection(Json(body), _): JsonBody<CreateReleaseBody>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ManageCatalog)?;

        let new = Self::new_release(body)?;
        let release = resources.database.create_release(&new).await?;

        info!(
            release_id = %release.id,
            version = %release.version,
            is_latest = release.is_latest,
            "Release published"
        );
        Ok(created(serde_json::json!({ "release": release })))
    }

    fn new_release(body: CreateReleaseBody) -> AppResult<NewRelease> {
        Ok(NewRelease {
            version: required_text(body.version, "version")?,
            file_name: required_text(body.file_name, "fileName")?,
            platform: body
                .platform
                .ok_or_else(|| AppError::missing_field("platform"))?,
            platform_label: required_text(body.platform_label, "platformLabel")?,
            size: optional_text(body.size),
            changelog: clean_changelog(body.changelog.unwrap_or_default()),
            is_latest: body.is_latest.unwrap_or(false),
        })
    }

    /// Handle PATCH /api/releases/:id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        WithRejection(Json(body), _): JsonBody<UpdateReleaseBody>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ManageCatalog)?;

        let update = ReleaseUpdate {
            version: optional_text(body.version),
            file_name: optional_text(body.file_name),
            platform: body.platform,
            platform_label: optional_text(body.platform_label),
            // null or an empty string clears the size
            size: body.size.map(optional_text),
            changelog: body.changelog.map(clean_changelog),
            is_latest: body.is_latest,
        };

        let release = resources
            .database
            .update_release(&id, &update)
            .await?
            .ok_or_else(|| AppError::not_found("Release"))?;

        info!(release_id = %release.id, is_latest = release.is_latest, "Release updated");
        Ok(ok(serde_json::json!({ "release": release })))
    }

    /// Handle DELETE /api/releases/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ManageCatalog)?;

        if !resources.database.delete_release(&id).await? {
            return Err(AppError::not_found("Release"));
        }

        info!(release_id = %id, "Release deleted");
        Ok(deleted("Release"))
    }
}
