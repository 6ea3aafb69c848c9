// ABOUTME: Route module organization for the portal REST API
// ABOUTME: One route group per entity plus shared extractor aliases and body helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

//! Route module for the portal
//!
//! Each group owns its paths and thin handlers. Every handler consults the
//! access gate first and touches storage only after the gate passes.

/// Admin dashboard routes
pub mod admin;
/// Announcement routes
pub mod announcements;
/// Login route
pub mod auth;
/// Device registry routes
pub mod devices;
/// Signed download link route
pub mod download;
/// Health and readiness routes
pub mod health;
/// Software release routes
pub mod releases;
/// Learning resource routes
pub mod resources;
/// Key-value settings routes
pub mod settings;
/// Support ticket routes
pub mod tickets;
/// Account and profile routes
pub mod users;

pub use admin::AdminRoutes;
pub use announcements::AnnouncementRoutes;
pub use auth::{AuthRoutes, LoginRequest, LoginResponse};
pub use devices::DeviceRoutes;
pub use download::DownloadRoutes;
pub use health::HealthRoutes;
pub use releases::ReleaseRoutes;
pub use resources::ResourceRoutes;
pub use settings::SettingRoutes;
pub use tickets::TicketRoutes;
pub use users::{AccountView, UserRoutes};

use axum::{
    extract::{Json, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use portal_core::{
    errors::{AppError, AppResult},
    permissions::Principal,
};
use serde::{Deserialize, Deserializer, Serialize};

/// JSON body whose rejection renders as our error envelope
pub(crate) type JsonBody<T> = WithRejection<Json<T>, AppError>;

/// Query string whose rejection renders as our error envelope
pub(crate) type QueryParams<T> = WithRejection<Query<T>, AppError>;

/// Trimmed value of a required text field
pub(crate) fn required_text(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::missing_field(field))
}

/// Trimmed optional text; blank input counts as absent
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Whether a public listing is restricted to published items
///
/// Admins get the unfiltered list unless they ask for the published view;
/// everyone else always gets the published view.
pub(crate) fn published_only(viewer: Option<&Principal>, requested: Option<bool>) -> bool {
    match viewer {
        Some(principal) if principal.is_admin() => requested == Some(true),
        _ => true,
    }
}

/// Deserialize a nullable field so that `null` and absence differ
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: absent is `None`, `null` is `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `200 OK` with a JSON body
pub(crate) fn ok<T: Serialize>(body: T) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

/// `201 Created` with a JSON body
pub(crate) fn created<T: Serialize>(body: T) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}

/// `200 OK` with `{ "message": "<what> deleted" }`
pub(crate) fn deleted(what: &str) -> Response {
    ok(serde_json::json!({ "message": format!("{what} deleted") }))
}
