// ABOUTME: Download center link route
// ABOUTME: Resolves an installer file from a name, a version or the latest release and issues a signed link
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::{ok, optional_text, QueryParams};
use crate::downloads::software_key;
use crate::resources::ServerResources;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use portal_core::{
    errors::{AppError, AppResult},
    permissions::Capability,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadQuery {
    version: Option<String>,
    file_name: Option<String>,
}

/// Response for a download request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DownloadResponse {
    download_url: String,
    file_name: String,
    expires_in: u64,
}

/// Download routes
pub struct DownloadRoutes;

impl DownloadRoutes {
    /// Create the download route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/download", get(Self::handle_download))
            .with_state(resources)
    }

    /// Handle GET /api/download
    async fn handle_download(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        WithRejection(Query(query), _): QueryParams<DownloadQuery>,
    ) -> Result<Response, AppError> {
        let principal = resources
            .gate
            .authorize(&headers, Capability::RequestDownload)?;

        let file_name = Self::resolve_file_name(&resources, query).await?;
        let key = software_key(&file_name)?;

        let issuer = resources
            .link_issuer
            .as_ref()
            .ok_or_else(|| AppError::config("Downloads are not configured"))?;
        let link = issuer.issue(&key, Utc::now()).await?;

        info!(account_id = %principal.id, file_name = %file_name, "Download link issued");
        Ok(ok(DownloadResponse {
            download_url: link.url,
            file_name,
            expires_in: link.expires_in,
        }))
    }

    /// An explicit file name wins, then the named version, then the latest release
    async fn resolve_file_name(
        resources: &ServerResources,
        query: DownloadQuery,
    ) -> AppResult<String> {
        if let Some(file_name) = optional_text(query.file_name) {
            return Ok(file_name);
        }

        let release = match optional_text(query.version) {
            Some(version) => resources.database.get_release_by_version(&version).await?,
            None => resources.database.get_latest_release().await?,
        };

        release
            .map(|release| release.file_name)
            .ok_or_else(|| AppError::not_found("Release"))
    }
}
