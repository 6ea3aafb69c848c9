// ABOUTME: Announcement routes
// ABOUTME: Public listing limited to the publication window, admin create/update/delete
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::{
    created, deleted, nullable, ok, optional_text, published_only, required_text, JsonBody,
    QueryParams,
};
use crate::database::{AnnouncementFilter, AnnouncementUpdate, NewAnnouncement};
use crate::resources::ServerResources;
use axum::{
    extract::{Json, Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::{get, patch},
    Router,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use portal_core::{
    errors::{AppError, AppResult},
    models::AnnouncementKind,
    permissions::Capability,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
struct AnnouncementListQuery {
    active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAnnouncementBody {
    title: Option<String>,
    body: Option<String>,
    #[serde(rename = "type")]
    kind: Option<AnnouncementKind>,
    active: Option<bool>,
    start_at: Option<DateTime<Utc>>,
    end_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAnnouncementBody {
    title: Option<String>,
    body: Option<String>,
    #[serde(rename = "type")]
    kind: Option<AnnouncementKind>,
    active: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    start_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    end_at: Option<Option<DateTime<Utc>>>,
}

fn check_window(start_at: Option<DateTime<Utc>>, end_at: Option<DateTime<Utc>>) -> AppResult<()> {
    match (start_at, end_at) {
        (Some(start), Some(end)) if start > end => Err(AppError::invalid_input(
            "startAt must not be later than endAt",
        )),
        _ => Ok(()),
    }
}

/// Announcement routes
pub struct AnnouncementRoutes;

impl AnnouncementRoutes {
    /// Create all announcement routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/announcements",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/announcements/:id",
                patch(Self::handle_update).delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Handle GET /api/announcements
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        WithRejection(Query(query), _): QueryParams<AnnouncementListQuery>,
    ) -> Result<Response, AppError> {
        let viewer = resources.gate.identify(&headers);
        let filter = if published_only(viewer.as_ref(), query.active) {
            AnnouncementFilter::PublishedAt(Utc::now())
        } else {
            AnnouncementFilter::All
        };

        let announcements = resources.database.list_announcements(filter).await?;
        Ok(ok(serde_json::json!({ "announcements": announcements })))
    }

    /// Handle POST /api/announcements
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        WithRejection(Json(body), _): JsonBody<CreateAnnouncementBody>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ManageCatalog)?;

        check_window(body.start_at, body.end_at)?;
        let announcement = resources
            .database
            .create_announcement(&NewAnnouncement {
                title: required_text(body.title, "title")?,
                body: required_text(body.body, "body")?,
                kind: body.kind.unwrap_or_default(),
                active: body.active.unwrap_or(true),
                start_at: body.start_at,
                end_at: body.end_at,
            })
            .await?;

        info!(announcement_id = %announcement.id, "Announcement posted");
        Ok(created(serde_json::json!({ "announcement": announcement })))
    }

    /// Handle PATCH /api/announcements/:id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        WithRejection(Json(body), _): JsonBody<UpdateAnnouncementBody>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ManageCatalog)?;

        let current = resources
            .database
            .get_announcement(&id)
            .await?
            .ok_or_else(|| AppError::not_found("Announcement"))?;
        check_window(
            body.start_at.unwrap_or(current.start_at),
            body.end_at.unwrap_or(current.end_at),
        )?;

        let update = AnnouncementUpdate {
            title: optional_text(body.title),
            body: optional_text(body.body),
            kind: body.kind,
            active: body.active,
            start_at: body.start_at,
            end_at: body.end_at,
        };
        let announcement = resources
            .database
            .update_announcement(&id, &update)
            .await?
            .ok_or_else(|| AppError::not_found("Announcement"))?;

        info!(announcement_id = %announcement.id, "Announcement updated");
        Ok(ok(serde_json::json!({ "announcement": announcement })))
    }

    /// Handle DELETE /api/announcements/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ManageCatalog)?;

        if !resources.database.delete_announcement(&id).await? {
            return Err(AppError::not_found("Announcement"));
        }

        info!(announcement_id = %id, "Announcement deleted");
        Ok(deleted("Announcement"))
    }
}
