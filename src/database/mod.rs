// ABOUTME: SQLite storage for accounts, devices, releases, tickets and content
// ABOUTME: Owns the connection pool, schema migrations and shared row helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

//! # Database Management
//!
//! One `Database` value wraps the pool; each entity module adds an `impl Database`
//! block with its migration and CRUD operations. Every operation is a single
//! statement except setting the latest release, which clears the previous flag
//! in the same transaction.

mod analytics;
mod announcements;
mod devices;
mod releases;
mod resources;
mod settings;
mod tickets;
mod users;

pub use analytics::{PortalAnalytics, TicketAnalytics, UserAnalytics};
pub use announcements::{AnnouncementFilter, AnnouncementUpdate, NewAnnouncement};
pub use devices::{DeviceFilter, DeviceUpdate, NewDevice};
pub use releases::{NewRelease, ReleaseFilter, ReleaseUpdate};
pub use resources::{LearningResourceUpdate, NewLearningResource};
pub use settings::SettingUpdate;
pub use tickets::{NewTicket, TicketReply, TicketUpdate};
pub use users::{AccountUpdate, AccountWithCreator, CreatorSummary, NewAccount};

use crate::config::DatabaseUrl;
use crate::credentials::AccountLookup;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use portal_core::{
    errors::{AppError, AppResult},
    models::Account,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;

/// Connections kept open for file databases
const MAX_CONNECTIONS: u32 = 8;

/// Database manager for all portal records
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) and migrate a database
    ///
    /// In-memory databases use a single connection so every query sees the
    /// same data.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails
    pub async fn new(url: &DatabaseUrl) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&url.to_connection_string())
            .context("Invalid database URL")?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = match url {
            DatabaseUrl::Memory => SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
            DatabaseUrl::SQLite { .. } => SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS),
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.migrate().await.context("Failed to run migrations")?;
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any `CREATE TABLE` fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_devices().await?;
        self.migrate_releases().await?;
        self.migrate_tickets().await?;
        self.migrate_announcements().await?;
        self.migrate_resources().await?;
        self.migrate_settings().await?;
        Ok(())
    }
}

#[async_trait]
impl AccountLookup for Database {
    async fn find_account_by_username(&self, username: &str) -> AppResult<Option<Account>> {
        self.get_account_by_username(username).await
    }
}

/// Fixed-width RFC 3339 text so stored timestamps sort lexically
pub(crate) fn encode_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub(crate) fn decode_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid stored timestamp '{raw}': {e}")))
}

/// Parse an optional stored timestamp
pub(crate) fn decode_optional_timestamp(raw: Option<String>) -> AppResult<Option<DateTime<Utc>>> {
    raw.as_deref().map(decode_timestamp).transpose()
}

/// Map an unknown stored enum value to a database error
pub(crate) fn invalid_stored_value(column: &str, value: &str) -> AppError {
    AppError::database(format!("Unknown {column} value '{value}' in database"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_are_fixed_width() {
        let a = DateTime::parse_from_rfc3339("2025-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let b = DateTime::parse_from_rfc3339("2025-03-01T10:00:00.5Z")
            .unwrap()
            .with_timezone(&Utc);

        let (ea, eb) = (encode_timestamp(a), encode_timestamp(b));
        assert_eq!(ea.len(), eb.len());
        assert!(ea < eb);
        assert_eq!(decode_timestamp(&eb).unwrap(), b);
    }

    #[tokio::test]
    async fn test_memory_database_migrates_twice() {
        let db = Database::new(&DatabaseUrl::Memory).await.unwrap();
        db.migrate().await.unwrap();
    }
}
