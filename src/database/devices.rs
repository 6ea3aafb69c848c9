// ABOUTME: Device registry database operations
// ABOUTME: Serial-unique device records with optional owner assignment and status filters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::{
    decode_optional_timestamp, decode_timestamp, encode_timestamp, invalid_stored_value, Database,
};
use chrono::{DateTime, Utc};
use portal_core::{
    constants::defaults::{DEVICE_FIRMWARE_VERSION, DEVICE_MODEL},
    errors::{AppError, AppResult, ErrorCode},
    models::{Device, DeviceStatus},
};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

const DEVICE_COLUMNS: &str =
    "id, serial_number, user_id, model, firmware_version, status, last_seen, created_at, updated_at";

/// Input for registering a device
#[derive(Debug, Clone, Default)]
pub struct NewDevice {
    /// Hardware serial
    pub serial_number: String,
    /// Initial owner
    pub user_id: Option<String>,
    /// Model, defaulted when absent
    pub model: Option<String>,
    /// Firmware, defaulted when absent
    pub firmware_version: Option<String>,
    /// Status, defaults to active
    pub status: Option<DeviceStatus>,
}

/// Partial device update
#[derive(Debug, Clone, Default)]
pub struct DeviceUpdate {
    /// New serial
    pub serial_number: Option<String>,
    /// `Some(None)` unassigns, `Some(Some(id))` assigns, `None` leaves as is
    pub user_id: Option<Option<String>>,
    /// New model
    pub model: Option<String>,
    /// New firmware version
    pub firmware_version: Option<String>,
    /// New status
    pub status: Option<DeviceStatus>,
    /// New last-seen timestamp
    pub last_seen: Option<DateTime<Utc>>,
}

/// Filters for the admin device list
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    /// Only devices owned by this account
    pub user_id: Option<String>,
    /// Only devices in this status
    pub status: Option<DeviceStatus>,
}

impl Database {
    /// Create the devices table
    pub(super) async fn migrate_devices(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS devices (
                id TEXT PRIMARY KEY,
                serial_number TEXT NOT NULL UNIQUE,
                user_id TEXT REFERENCES accounts(id) ON DELETE SET NULL,
                model TEXT NOT NULL,
                firmware_version TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive', 'blocked')),
                last_seen TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_devices_user_id ON devices(user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Register a device
    ///
    /// # Errors
    ///
    /// Returns a conflict error if the serial is already registered
    pub async fn create_device(&self, new: &NewDevice) -> AppResult<Device> {
        let now = Utc::now();
        let device = Device {
            id: Uuid::new_v4().to_string(),
            serial_number: new.serial_number.clone(),
            user_id: new.user_id.clone(),
            model: new.model.clone().unwrap_or_else(|| DEVICE_MODEL.to_owned()),
            firmware_version: new
                .firmware_version
                .clone()
                .unwrap_or_else(|| DEVICE_FIRMWARE_VERSION.to_owned()),
            status: new.status.unwrap_or_default(),
            last_seen: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r"
            INSERT INTO devices (id, serial_number, user_id, model, firmware_version, status, last_seen, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?)
            ",
        )
        .bind(&device.id)
        .bind(&device.serial_number)
        .bind(&device.user_id)
        .bind(&device.model)
        .bind(&device.firmware_version)
        .bind(device.status.as_str())
        .bind(encode_timestamp(now))
        .bind(encode_timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(serial_conflict)?;

        Ok(device)
    }

    /// Get a device by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_device(&self, id: &str) -> AppResult<Option<Device>> {
        let row = sqlx::query(&format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_device).transpose()
    }

    /// List devices matching a filter, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_devices(&self, filter: &DeviceFilter) -> AppResult<Vec<Device>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {DEVICE_COLUMNS} FROM devices
            WHERE (?1 IS NULL OR user_id = ?1)
              AND (?2 IS NULL OR status = ?2)
            ORDER BY created_at DESC, rowid DESC
            "
        ))
        .bind(&filter.user_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_device).collect()
    }

    /// List devices assigned to an account, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_devices_for_owner(&self, user_id: &str) -> AppResult<Vec<Device>> {
        self.list_devices(&DeviceFilter {
            user_id: Some(user_id.to_owned()),
            status: None,
        })
        .await
    }

    /// Apply a partial update
    ///
    /// # Errors
    ///
    /// Returns a conflict error if the new serial is taken
    pub async fn update_device(&self, id: &str, update: &DeviceUpdate) -> AppResult<Option<Device>> {
        let result = sqlx::query(
            r"
            UPDATE devices SET
                serial_number = COALESCE(?, serial_number),
                user_id = CASE WHEN ? THEN ? ELSE user_id END,
                model = COALESCE(?, model),
                firmware_version = COALESCE(?, firmware_version),
                status = COALESCE(?, status),
                last_seen = COALESCE(?, last_seen),
                updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&update.serial_number)
        .bind(update.user_id.is_some())
        .bind(update.user_id.clone().flatten())
        .bind(&update.model)
        .bind(&update.firmware_version)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.last_seen.map(encode_timestamp))
        .bind(encode_timestamp(Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(serial_conflict)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_device(id).await
    }

    /// Delete a device
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn delete_device(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM devices WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn serial_conflict(error: sqlx::Error) -> AppError {
    let error = AppError::from(error);
    if error.code == ErrorCode::ResourceAlreadyExists {
        AppError::conflict("Device with this serial number already exists")
    } else {
        error
    }
}

fn row_to_device(row: &SqliteRow) -> AppResult<Device> {
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Device {
        id: row.try_get("id")?,
        serial_number: row.try_get("serial_number")?,
        user_id: row.try_get("user_id")?,
        model: row.try_get("model")?,
        firmware_version: row.try_get("firmware_version")?,
        status: DeviceStatus::parse(&status).ok_or_else(|| invalid_stored_value("status", &status))?,
        last_seen: decode_optional_timestamp(row.try_get("last_seen")?)?,
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}
