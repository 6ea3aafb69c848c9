// ABOUTME: Device registry routes
// ABOUTME: Admin CRUD over devices plus an owner-only "mine" listing and owner-or-admin reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::{created, deleted, nullable, ok, optional_text, required_text, JsonBody, QueryParams};
use crate::database::{DeviceFilter, DeviceUpdate, NewDevice};
use crate::middleware::AccessGate;
use crate::resources::ServerResources;
use axum::{
    extract::{Json, Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use portal_core::{
    errors::{AppError, AppResult},
    models::DeviceStatus,
    permissions::Capability,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceListQuery {
    user_id: Option<String>,
    status: Option<DeviceStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDeviceBody {
    serial_number: Option<String>,
    user_id: Option<String>,
    model: Option<String>,
    firmware_version: Option<String>,
    status: Option<DeviceStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDeviceBody {
    serial_number: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    user_id: Option<Option<String>>,
    model: Option<String>,
    firmware_version: Option<String>,
    status: Option<DeviceStatus>,
    last_seen: Option<DateTime<Utc>>,
}

/// Device routes
pub struct DeviceRoutes;

impl DeviceRoutes {
    /// Create all device routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/devices",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route("/api/devices/mine", get(Self::handle_list_mine))
            .route(
                "/api/devices/:id",
                get(Self::handle_get)
                    .patch(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Reject assignment to an account that does not exist
    async fn ensure_owner_exists(resources: &ServerResources, user_id: &str) -> AppResult<()> {
        if resources.database.get_account(user_id).await?.is_none() {
            return Err(AppError::invalid_input("Assigned user does not exist"));
        }
        Ok(())
    }

    /// Handle GET /api/devices
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        WithRejection(Query(query), _): QueryParams<DeviceListQuery>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ListAllDevices)?;

        let devices = resources
            .database
            .list_devices(&DeviceFilter {
                user_id: optional_text(query.user_id),
                status: query.status,
            })
            .await?;

        Ok(ok(serde_json::json!({ "devices": devices })))
    }

    /// Handle GET /api/devices/mine
    async fn handle_list_mine(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let principal = resources
            .gate
            .authorize(&headers, Capability::ListOwnDevices)?;

        let devices = resources
            .database
            .list_devices_for_owner(&principal.id)
            .await?;

        Ok(ok(serde_json::json!({ "devices": devices })))
    }

    /// Handle GET /api/devices/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = resources.gate.authenticate(&headers)?;

        let device = resources
            .database
            .get_device(&id)
            .await?
            .ok_or_else(|| AppError::not_found("Device"))?;
        AccessGate::permit(&principal, Capability::ReadDevice, device.user_id.as_deref())?;

        Ok(ok(serde_json::json!({ "device": device })))
    }

    /// Handle POST /api/devices
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        WithRejection(Json(body), _): JsonBody<CreateDeviceBody>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ManageDevices)?;

        let serial_number = required_text(body.serial_number, "serialNumber")?;
        let user_id = optional_text(body.user_id);
        if let Some(user_id) = &user_id {
            Self::ensure_owner_exists(&resources, user_id).await?;
        }

        let device = resources
            .database
            .create_device(&NewDevice {
                serial_number,
                user_id,
                model: optional_text(body.model),
                firmware_version: optional_text(body.firmware_version),
                status: body.status,
            })
            .await?;

        info!(device_id = %device.id, serial = %device.serial_number, "Device registered");
        Ok(created(serde_json::json!({ "device": device })))
    }

    /// Handle PATCH /api/devices/:id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        WithRejection(Json(body), _): JsonBody<UpdateDeviceBody>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ManageDevices)?;

        let user_id = body.user_id.map(optional_text);
        if let Some(Some(user_id)) = &user_id {
            Self::ensure_owner_exists(&resources, user_id).await?;
        }

        let device = resources
            .database
            .update_device(
                &id,
                &DeviceUpdate {
                    serial_number: optional_text(body.serial_number),
                    user_id,
                    model: optional_text(body.model),
                    firmware_version: optional_text(body.firmware_version),
                    status: body.status,
                    last_seen: body.last_seen,
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found("Device"))?;

        info!(device_id = %device.id, "Device updated");
        Ok(ok(serde_json::json!({ "device": device })))
    }

    /// Handle DELETE /api/devices/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ManageDevices)?;

        if !resources.database.delete_device(&id).await? {
            return Err(AppError::not_found("Device"));
        }

        info!(device_id = %id, "Device deleted");
        Ok(deleted("Device"))
    }
}
