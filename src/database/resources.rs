// ABOUTME: Learning resource database operations
// ABOUTME: Ordered catalog of videos, documents and links with a visibility flag
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::{decode_timestamp, encode_timestamp, invalid_stored_value, Database};
use chrono::Utc;
use portal_core::{
    errors::AppResult,
    models::{LearningResource, ResourceKind, SkillLevel},
};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

const RESOURCE_COLUMNS: &str = "id, title, description, kind, url, storage_key, duration, size, level, sort_order, visible, created_at, updated_at";

/// Input for adding a learning resource
#[derive(Debug, Clone)]
pub struct NewLearningResource {
    /// Title
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// Media kind
    pub kind: ResourceKind,
    /// External link
    pub url: Option<String>,
    /// Object storage key
    pub storage_key: Option<String>,
    /// Playback length
    pub duration: Option<String>,
    /// File size
    pub size: Option<String>,
    /// Audience level
    pub level: Option<SkillLevel>,
    /// Sort position
    pub order: i64,
    /// Visible to non-admins
    pub visible: bool,
}

/// Partial learning resource update
#[derive(Debug, Clone, Default)]
pub struct LearningResourceUpdate {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New media kind
    pub kind: Option<ResourceKind>,
    /// New link
    pub url: Option<String>,
    /// New storage key
    pub storage_key: Option<String>,
    /// New duration
    pub duration: Option<String>,
    /// New size
    pub size: Option<String>,
    /// New level
    pub level: Option<SkillLevel>,
    /// New sort position
    pub order: Option<i64>,
    /// New visibility
    pub visible: Option<bool>,
}

impl Database {
    /// Create the learning resources table
    pub(super) async fn migrate_resources(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS learning_resources (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                kind TEXT NOT NULL CHECK (kind IN ('video', 'pdf', 'link')),
                url TEXT,
                storage_key TEXT,
                duration TEXT,
                size TEXT,
                level TEXT CHECK (level IS NULL OR level IN ('Beginner', 'Intermediate', 'Advanced')),
                sort_order INTEGER NOT NULL DEFAULT 0,
                visible INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add a learning resource
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_learning_resource(
        &self,
        new: &NewLearningResource,
    ) -> AppResult<LearningResource> {
        let now = Utc::now();
        let resource = LearningResource {
            id: Uuid::new_v4().to_string(),
            title: new.title.clone(),
            description: new.description.clone(),
            kind: new.kind,
            url: new.url.clone(),
            storage_key: new.storage_key.clone(),
            duration: new.duration.clone(),
            size: new.size.clone(),
            level: new.level,
            order: new.order,
            visible: new.visible,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r"
            INSERT INTO learning_resources
                (id, title, description, kind, url, storage_key, duration, size, level, sort_order, visible, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&resource.id)
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(resource.kind.as_str())
        .bind(&resource.url)
        .bind(&resource.storage_key)
        .bind(&resource.duration)
        .bind(&resource.size)
        .bind(resource.level.map(|l| l.as_str()))
        .bind(resource.order)
        .bind(resource.visible)
        .bind(encode_timestamp(now))
        .bind(encode_timestamp(now))
        .execute(&self.pool)
        .await?;

        Ok(resource)
    }

    /// Get a learning resource by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_learning_resource(&self, id: &str) -> AppResult<Option<LearningResource>> {
        let row = sqlx::query(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM learning_resources WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_resource).transpose()
    }

    /// List resources by sort position, then creation time
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_learning_resources(
        &self,
        visible_only: bool,
    ) -> AppResult<Vec<LearningResource>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {RESOURCE_COLUMNS} FROM learning_resources
            WHERE (? = 0 OR visible = 1)
            ORDER BY sort_order ASC, created_at ASC, rowid ASC
            "
        ))
        .bind(visible_only)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_resource).collect()
    }

    /// Apply a partial update
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn update_learning_resource(
        &self,
        id: &str,
        update: &LearningResourceUpdate,
    ) -> AppResult<Option<LearningResource>> {
        let result = sqlx::query(
            r"
            UPDATE learning_resources SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                kind = COALESCE(?, kind),
                url = COALESCE(?, url),
                storage_key = COALESCE(?, storage_key),
                duration = COALESCE(?, duration),
                size = COALESCE(?, size),
                level = COALESCE(?, level),
                sort_order = COALESCE(?, sort_order),
                visible = COALESCE(?, visible),
                updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.kind.map(|k| k.as_str()))
        .bind(&update.url)
        .bind(&update.storage_key)
        .bind(&update.duration)
        .bind(&update.size)
        .bind(update.level.map(|l| l.as_str()))
        .bind(update.order)
        .bind(update.visible)
        .bind(encode_timestamp(Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_learning_resource(id).await
    }

    /// Delete a learning resource
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn delete_learning_resource(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM learning_resources WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_resource(row: &SqliteRow) -> AppResult<LearningResource> {
    let kind: String = row.try_get("kind")?;
    let level: Option<String> = row.try_get("level")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    let level = level
        .map(|l| SkillLevel::parse(&l).ok_or_else(|| invalid_stored_value("level", &l)))
        .transpose()?;

    Ok(LearningResource {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        kind: ResourceKind::parse(&kind).ok_or_else(|| invalid_stored_value("kind", &kind))?,
        url: row.try_get("url")?,
        storage_key: row.try_get("storage_key")?,
        duration: row.try_get("duration")?,
        size: row.try_get("size")?,
        level,
        order: row.try_get("sort_order")?,
        visible: row.try_get("visible")?,
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}
