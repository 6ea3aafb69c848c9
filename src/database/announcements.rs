// ABOUTME: Announcement database operations
// ABOUTME: Active flag plus optional publication window, filtered at query time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::{
    decode_optional_timestamp, decode_timestamp, encode_timestamp, invalid_stored_value, Database,
};
use chrono::{DateTime, Utc};
use portal_core::{
    errors::AppResult,
    models::{Announcement, AnnouncementKind},
};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

const ANNOUNCEMENT_COLUMNS: &str =
    "id, title, body, kind, active, start_at, end_at, created_at, updated_at";

/// Input for posting an announcement
#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    /// Headline
    pub title: String,
    /// Body text
    pub body: String,
    /// Category
    pub kind: AnnouncementKind,
    /// Active flag
    pub active: bool,
    /// Window start
    pub start_at: Option<DateTime<Utc>>,
    /// Window end
    pub end_at: Option<DateTime<Utc>>,
}

/// Partial announcement update
#[derive(Debug, Clone, Default)]
pub struct AnnouncementUpdate {
    /// New headline
    pub title: Option<String>,
    /// New body
    pub body: Option<String>,
    /// New category
    pub kind: Option<AnnouncementKind>,
    /// New active flag
    pub active: Option<bool>,
    /// `Some(None)` opens the window start
    pub start_at: Option<Option<DateTime<Utc>>>,
    /// `Some(None)` opens the window end
    pub end_at: Option<Option<DateTime<Utc>>>,
}

/// Which announcements a listing returns
#[derive(Debug, Clone, Copy)]
pub enum AnnouncementFilter {
    /// Every announcement
    All,
    /// Active announcements whose window contains the instant
    PublishedAt(DateTime<Utc>),
}

impl Database {
    /// Create the announcements table
    pub(super) async fn migrate_announcements(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS announcements (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                kind TEXT NOT NULL DEFAULT 'news' CHECK (kind IN ('info', 'warning', 'maintenance', 'news')),
                active INTEGER NOT NULL DEFAULT 1,
                start_at TEXT,
                end_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Post an announcement
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_announcement(&self, new: &NewAnnouncement) -> AppResult<Announcement> {
        let now = Utc::now();
        let announcement = Announcement {
            id: Uuid::new_v4().to_string(),
            title: new.title.clone(),
            body: new.body.clone(),
            kind: new.kind,
            active: new.active,
            start_at: new.start_at,
            end_at: new.end_at,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r"
            INSERT INTO announcements (id, title, body, kind, active, start_at, end_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&announcement.id)
        .bind(&announcement.title)
        .bind(&announcement.body)
        .bind(announcement.kind.as_str())
        .bind(announcement.active)
        .bind(announcement.start_at.map(encode_timestamp))
        .bind(announcement.end_at.map(encode_timestamp))
        .bind(encode_timestamp(now))
        .bind(encode_timestamp(now))
        .execute(&self.pool)
        .await?;

        Ok(announcement)
    }

    /// Get an announcement by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_announcement(&self, id: &str) -> AppResult<Option<Announcement>> {
        let row = sqlx::query(&format!(
            "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_announcement).transpose()
    }

    /// List announcements, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_announcements(
        &self,
        filter: AnnouncementFilter,
    ) -> AppResult<Vec<Announcement>> {
        let rows = match filter {
            AnnouncementFilter::All => {
                sqlx::query(&format!(
                    "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements ORDER BY created_at DESC, rowid DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
            AnnouncementFilter::PublishedAt(now) => {
                sqlx::query(&format!(
                    r"
                    SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements
                    WHERE active = 1
                      AND (start_at IS NULL OR start_at <= ?1)
                      AND (end_at IS NULL OR end_at >= ?1)
                    ORDER BY created_at DESC, rowid DESC
                    "
                ))
                .bind(encode_timestamp(now))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(row_to_announcement).collect()
    }

    /// Apply a partial update
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn update_announcement(
        &self,
        id: &str,
        update: &AnnouncementUpdate,
    ) -> AppResult<Option<Announcement>> {
        let result = sqlx::query(
            r"
            UPDATE announcements SET
                title = COALESCE(?, title),
                body = COALESCE(?, body),
                kind = COALESCE(?, kind),
                active = COALESCE(?, active),
                start_at = CASE WHEN ? THEN ? ELSE start_at END,
                end_at = CASE WHEN ? THEN ? ELSE end_at END,
                updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&update.title)
        .bind(&update.body)
        .bind(update.kind.map(|k| k.as_str()))
        .bind(update.active)
        .bind(update.start_at.is_some())
        .bind(update.start_at.flatten().map(encode_timestamp))
        .bind(update.end_at.is_some())
        .bind(update.end_at.flatten().map(encode_timestamp))
        .bind(encode_timestamp(Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_announcement(id).await
    }

    /// Delete an announcement
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn delete_announcement(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_announcement(row: &SqliteRow) -> AppResult<Announcement> {
    let kind: String = row.try_get("kind")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Announcement {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        kind: AnnouncementKind::parse(&kind).ok_or_else(|| invalid_stored_value("kind", &kind))?,
        active: row.try_get("active")?,
        start_at: decode_optional_timestamp(row.try_get("start_at")?)?,
        end_at: decode_optional_timestamp(row.try_get("end_at")?)?,
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}
