// ABOUTME: Aggregate counts for the admin dashboard
// ABOUTME: Users, tickets by status and priority, releases, content and devices
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::{encode_timestamp, Database};
use chrono::{DateTime, Utc};
use portal_core::{
    errors::{AppError, AppResult},
    models::{TicketPriority, TicketStatus},
};
use serde::Serialize;
use sqlx::Row;
use std::collections::BTreeMap;
use tracing::error;

/// Account counts
#[derive(Debug, Clone, Serialize)]
pub struct UserAnalytics {
    /// All accounts
    pub total: u64,
    /// Accounts allowed to log in
    pub active: u64,
}

/// Ticket counts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketAnalytics {
    /// All tickets
    pub total: u64,
    /// Tickets still open
    pub open: u64,
    /// Count per status, every status present
    pub by_status: BTreeMap<&'static str, u64>,
    /// Count per priority, every priority present
    pub by_priority: BTreeMap<&'static str, u64>,
}

/// Dashboard summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalAnalytics {
    /// Account counts
    pub users: UserAnalytics,
    /// Ticket counts
    pub tickets: TicketAnalytics,
    /// Published releases
    pub releases: u64,
    /// All announcements
    pub announcements: u64,
    /// Announcements currently shown to users
    pub active_announcements: u64,
    /// Registered devices
    pub devices: u64,
    /// Resources visible to users
    pub visible_resources: u64,
}

impl Database {
    /// Gather dashboard counts as of `now`
    ///
    /// # Errors
    ///
    /// Returns an error if any count query fails
    pub async fn portal_analytics(&self, now: DateTime<Utc>) -> AppResult<PortalAnalytics> {
        let users = UserAnalytics {
            total: self.count("SELECT COUNT(*) FROM accounts").await?,
            active: self
                .count("SELECT COUNT(*) FROM accounts WHERE is_active = 1")
                .await?,
        };

        let mut by_status: BTreeMap<&'static str, u64> =
            TicketStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        for row in sqlx::query("SELECT status, COUNT(*) AS n FROM tickets GROUP BY status")
            .fetch_all(&self.pool)
            .await?
        {
            let status: String = row.try_get("status")?;
            if let Some(status) = TicketStatus::parse(&status) {
                by_status.insert(status.as_str(), non_negative(row.try_get("n")?, "tickets"));
            }
        }

        let mut by_priority: BTreeMap<&'static str, u64> =
            TicketPriority::ALL.iter().map(|p| (p.as_str(), 0)).collect();
        for row in sqlx::query("SELECT priority, COUNT(*) AS n FROM tickets GROUP BY priority")
            .fetch_all(&self.pool)
            .await?
        {
            let priority: String = row.try_get("priority")?;
            if let Some(priority) = TicketPriority::parse(&priority) {
                by_priority.insert(priority.as_str(), non_negative(row.try_get("n")?, "tickets"));
            }
        }

        let tickets = TicketAnalytics {
            total: by_status.values().sum(),
            open: by_status
                .get(TicketStatus::Open.as_str())
                .copied()
                .unwrap_or_default(),
            by_status,
            by_priority,
        };

        let active_announcements: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM announcements
            WHERE active = 1
              AND (start_at IS NULL OR start_at <= ?1)
              AND (end_at IS NULL OR end_at >= ?1)
            ",
        )
        .bind(encode_timestamp(now))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count active announcements: {e}")))?;

        Ok(PortalAnalytics {
            users,
            tickets,
            releases: self.count("SELECT COUNT(*) FROM releases").await?,
            announcements: self.count("SELECT COUNT(*) FROM announcements").await?,
            active_announcements: non_negative(active_announcements, "announcements"),
            devices: self.count("SELECT COUNT(*) FROM devices").await?,
            visible_resources: self
                .count("SELECT COUNT(*) FROM learning_resources WHERE visible = 1")
                .await?,
        })
    }

    async fn count(&self, sql: &'static str) -> AppResult<u64> {
        let n: i64 = sqlx::query_scalar(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Count query failed: {e}")))?;
        Ok(non_negative(n, sql))
    }
}

fn non_negative(n: i64, source: &str) -> u64 {
    u64::try_from(n).unwrap_or_else(|e| {
        error!(count = n, error = %e, source, "Negative row count from database, using 0");
        0
    })
}
