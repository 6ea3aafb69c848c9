// ABOUTME: Key-value settings database operations
// ABOUTME: JSON values keyed by unique name with upsert semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::{decode_timestamp, encode_timestamp, invalid_stored_value, Database};
use chrono::Utc;
use portal_core::{
    errors::{AppError, AppResult},
    models::Setting,
};
use sqlx::{sqlite::SqliteRow, Row};

/// Partial setting update
#[derive(Debug, Clone, Default)]
pub struct SettingUpdate {
    /// New value
    pub value: Option<serde_json::Value>,
    /// New description
    pub description: Option<String>,
}

impl Database {
    /// Create the settings table
    pub(super) async fn migrate_settings(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                description TEXT,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace a setting
    ///
    /// An existing description is kept when none is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub async fn upsert_setting(
        &self,
        key: &str,
        value: &serde_json::Value,
        description: Option<&str>,
    ) -> AppResult<Setting> {
        sqlx::query(
            r"
            INSERT INTO settings (key, value, description, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                description = COALESCE(excluded.description, settings.description),
                updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(encode_value(value)?)
        .bind(description)
        .bind(encode_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        self.get_setting(key)
            .await?
            .ok_or_else(|| AppError::internal(format!("Setting '{key}' missing after upsert")))
    }

    /// Get a setting by key
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_setting(&self, key: &str) -> AppResult<Option<Setting>> {
        let row =
            sqlx::query("SELECT key, value, description, updated_at FROM settings WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        row.as_ref().map(row_to_setting).transpose()
    }

    /// List every setting sorted by key
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_settings(&self) -> AppResult<Vec<Setting>> {
        let rows =
            sqlx::query("SELECT key, value, description, updated_at FROM settings ORDER BY key ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_setting).collect()
    }

    /// Apply a partial update to an existing setting
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn update_setting(
        &self,
        key: &str,
        update: &SettingUpdate,
    ) -> AppResult<Option<Setting>> {
        let value = update.value.as_ref().map(encode_value).transpose()?;
        let result = sqlx::query(
            r"
            UPDATE settings SET
                value = COALESCE(?, value),
                description = COALESCE(?, description),
                updated_at = ?
            WHERE key = ?
            ",
        )
        .bind(value)
        .bind(&update.description)
        .bind(encode_timestamp(Utc::now()))
        .bind(key)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_setting(key).await
    }

    /// Delete a setting
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn delete_setting(&self, key: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn encode_value(value: &serde_json::Value) -> AppResult<String> {
    serde_json::to_string(value)
        .map_err(|e| AppError::internal(format!("Failed to encode setting value: {e}")))
}

fn row_to_setting(row: &SqliteRow) -> AppResult<Setting> {
    let value: String = row.try_get("value")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Setting {
        key: row.try_get("key")?,
        value: serde_json::from_str(&value).map_err(|_| invalid_stored_value("value", &value))?,
        description: row.try_get("description")?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}
