// ABOUTME: Software release catalog database operations
// ABOUTME: Keeps at most one release flagged latest by clearing the flag inside each write
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::{decode_timestamp, encode_timestamp, invalid_stored_value, Database};
use chrono::Utc;
use portal_core::{
    errors::{AppError, AppResult},
    models::{Platform, Release},
};
use sqlx::{sqlite::SqliteRow, Row, Sqlite, Transaction};
use uuid::Uuid;

const RELEASE_COLUMNS: &str =
    "id, version, file_name, platform, platform_label, size, changelog, is_latest, created_at, updated_at";

/// Input for publishing a release
#[derive(Debug, Clone)]
pub struct NewRelease {
    /// Version string
    pub version: String,
    /// Installer file name
    pub file_name: String,
    /// Target platform
    pub platform: Platform,
    /// Display label
    pub platform_label: String,
    /// Human-readable size
    pub size: Option<String>,
    /// Changelog lines
    pub changelog: Vec<String>,
    /// Whether this becomes the latest release
    pub is_latest: bool,
}

/// Partial release update
#[derive(Debug, Clone, Default)]
pub struct ReleaseUpdate {
    /// New version string
    pub version: Option<String>,
    /// New installer file name
    pub file_name: Option<String>,
    /// New platform
    pub platform: Option<Platform>,
    /// New display label
    pub platform_label: Option<String>,
    /// New size; `Some(None)` clears it
    pub size: Option<Option<String>>,
    /// Replacement changelog
    pub changelog: Option<Vec<String>>,
    /// `Some(true)` moves the latest flag to this release
    pub is_latest: Option<bool>,
}

/// Filters for the public release list
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseFilter {
    /// Releases for this platform or for every platform
    pub platform: Option<Platform>,
    /// Only the latest release
    pub latest_only: bool,
}

impl Database {
    /// Create the releases table
    pub(super) async fn migrate_releases(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS releases (
                id TEXT PRIMARY KEY,
                version TEXT NOT NULL,
                file_name TEXT NOT NULL,
                platform TEXT NOT NULL CHECK (platform IN ('windows', 'macos', 'linux', 'mobile', 'all')),
                platform_label TEXT NOT NULL,
                size TEXT,
                changelog TEXT NOT NULL DEFAULT '[]',
                is_latest INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_releases_version ON releases(version)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Publish a release
    ///
    /// # Errors
    ///
    /// Returns an error if the insert or the latest-flag swap fails
    pub async fn create_release(&self, new: &NewRelease) -> AppResult<Release> {
        let now = Utc::now();
        let release = Release {
            id: Uuid::new_v4().to_string(),
            version: new.version.clone(),
            file_name: new.file_name.clone(),
            platform: new.platform,
            platform_label: new.platform_label.clone(),
            size: new.size.clone(),
            changelog: new.changelog.clone(),
            is_latest: new.is_latest,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;
        if release.is_latest {
            clear_latest(&mut tx, &release.id).await?;
        }

        sqlx::query(
            r"
            INSERT INTO releases (id, version, file_name, platform, platform_label, size, changelog, is_latest, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&release.id)
        .bind(&release.version)
        .bind(&release.file_name)
        .bind(release.platform.as_str())
        .bind(&release.platform_label)
        .bind(&release.size)
        .bind(encode_changelog(&release.changelog)?)
        .bind(release.is_latest)
        .bind(encode_timestamp(now))
        .bind(encode_timestamp(now))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(release)
    }

    /// Get a release by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_release(&self, id: &str) -> AppResult<Option<Release>> {
        let row = sqlx::query(&format!("SELECT {RELEASE_COLUMNS} FROM releases WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_release).transpose()
    }

    /// Most recent release carrying a version string
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_release_by_version(&self, version: &str) -> AppResult<Option<Release>> {
        let row = sqlx::query(&format!(
            "SELECT {RELEASE_COLUMNS} FROM releases WHERE version = ? ORDER BY created_at DESC, rowid DESC LIMIT 1"
        ))
        .bind(version)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_release).transpose()
    }

    /// The release flagged latest, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_latest_release(&self) -> AppResult<Option<Release>> {
        let row = sqlx::query(&format!(
            "SELECT {RELEASE_COLUMNS} FROM releases WHERE is_latest = 1 LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_release).transpose()
    }

    /// List releases, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_releases(&self, filter: ReleaseFilter) -> AppResult<Vec<Release>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {RELEASE_COLUMNS} FROM releases
            WHERE (?1 IS NULL OR platform = ?1 OR platform = 'all')
              AND (?2 = 0 OR is_latest = 1)
            ORDER BY created_at DESC, rowid DESC
            "
        ))
        .bind(filter.platform.map(|p| p.as_str()))
        .bind(filter.latest_only)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_release).collect()
    }

    /// Apply a partial update
    ///
    /// # Errors
    ///
    /// Returns an error if the update or the latest-flag swap fails
    pub async fn update_release(
        &self,
        id: &str,
        update: &ReleaseUpdate,
    ) -> AppResult<Option<Release>> {
        let changelog = update
            .changelog
            .as_deref()
            .map(encode_changelog)
            .transpose()?;

        let mut tx = self.pool.begin().await?;
        if update.is_latest == Some(true) {
            clear_latest(&mut tx, id).await?;
        }

        let result = sqlx::query(
            r"
            UPDATE releases SET
                version = COALESCE(?, version),
                file_name = COALESCE(?, file_name),
                platform = COALESCE(?, platform),
                platform_label = COALESCE(?, platform_label),
                size = CASE WHEN ? THEN ? ELSE size END,
                changelog = COALESCE(?, changelog),
                is_latest = COALESCE(?, is_latest),
                updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&update.version)
        .bind(&update.file_name)
        .bind(update.platform.map(|p| p.as_str()))
        .bind(&update.platform_label)
        .bind(update.size.is_some())
        .bind(update.size.clone().flatten())
        .bind(changelog)
        .bind(update.is_latest)
        .bind(encode_timestamp(Utc::now()))
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the cleared flag
            return Ok(None);
        }
        tx.commit().await?;
        self.get_release(id).await
    }

    /// Delete a release
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn delete_release(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM releases WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn clear_latest(tx: &mut Transaction<'_, Sqlite>, keep_id: &str) -> AppResult<()> {
    sqlx::query("UPDATE releases SET is_latest = 0 WHERE is_latest = 1 AND id != ?")
        .bind(keep_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn encode_changelog(lines: &[String]) -> AppResult<String> {
    serde_json::to_string(lines)
        .map_err(|e| AppError::internal(format!("Failed to encode changelog: {e}")))
}

fn row_to_release(row: &SqliteRow) -> AppResult<Release> {
    let platform: String = row.try_get("platform")?;
    let changelog: String = row.try_get("changelog")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Release {
        id: row.try_get("id")?,
        version: row.try_get("version")?,
        file_name: row.try_get("file_name")?,
        platform: Platform::parse(&platform)
            .ok_or_else(|| invalid_stored_value("platform", &platform))?,
        platform_label: row.try_get("platform_label")?,
        size: row.try_get("size")?,
        changelog: serde_json::from_str(&changelog)
            .map_err(|_| invalid_stored_value("changelog", &changelog))?,
        is_latest: row.try_get("is_latest")?,
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}
