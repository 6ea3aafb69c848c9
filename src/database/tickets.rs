// ABOUTME: Support ticket database operations
// ABOUTME: Tickets and their ordered message threads, with reply-and-triage updates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::{decode_timestamp, encode_timestamp, invalid_stored_value, Database};
use chrono::Utc;
use portal_core::{
    errors::{AppError, AppResult},
    models::{Ticket, TicketMessage, TicketPriority, TicketStatus},
};
use sqlx::{sqlite::SqliteRow, Row};
use std::collections::HashMap;
use uuid::Uuid;

/// Ticket rows with owner and assignee handles; filter and order on `t.`
const TICKET_SELECT: &str = r"
    SELECT t.id, t.user_id, t.subject, t.status, t.priority, t.assigned_to,
           t.created_at, t.updated_at,
           owner.username AS username,
           assignee.username AS assigned_to_username
    FROM tickets t
    LEFT JOIN accounts owner ON owner.id = t.user_id
    LEFT JOIN accounts assignee ON assignee.id = t.assigned_to
";

/// Thread messages with author handles; filter and order on `m.`
const MESSAGE_SELECT: &str = r"
    SELECT m.ticket_id, m.body, m.from_user, m.is_staff, m.created_at,
           author.username AS from_username
    FROM ticket_messages m
    LEFT JOIN accounts author ON author.id = m.from_user
";

/// Input for opening a ticket
#[derive(Debug, Clone)]
pub struct NewTicket {
    /// Owning account
    pub user_id: String,
    /// Subject line
    pub subject: String,
    /// First message body
    pub message: String,
    /// Whether the opener is staff
    pub is_staff: bool,
    /// Initial priority
    pub priority: TicketPriority,
}

/// A reply appended to a ticket thread
#[derive(Debug, Clone)]
pub struct TicketReply {
    /// Author account id
    pub from_user: String,
    /// Whether the author is staff
    pub is_staff: bool,
    /// Message text
    pub body: String,
}

/// Reply and triage changes applied together
///
/// Callers strip the triage fields for non-admin principals before calling
/// [`Database::update_ticket`].
#[derive(Debug, Clone, Default)]
pub struct TicketUpdate {
    /// Reply appended to the thread
    pub message: Option<TicketReply>,
    /// New status
    pub status: Option<TicketStatus>,
    /// New priority
    pub priority: Option<TicketPriority>,
    /// New assignee; `Some(None)` clears it
    pub assigned_to: Option<Option<String>>,
}

impl Database {
    /// Create the ticket and message tables
    pub(super) async fn migrate_tickets(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                subject TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'open' CHECK (status IN ('open', 'in-progress', 'resolved', 'closed')),
                priority TEXT NOT NULL DEFAULT 'medium' CHECK (priority IN ('low', 'medium', 'high')),
                assigned_to TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS ticket_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticket_id TEXT NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
                body TEXT NOT NULL,
                from_user TEXT NOT NULL,
                is_staff INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tickets_user_id ON tickets(user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_ticket_messages_ticket_id ON ticket_messages(ticket_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Open a ticket with its first message
    ///
    /// # Errors
    ///
    /// Returns an error if either insert fails
    pub async fn create_ticket(&self, new: &NewTicket) -> AppResult<Ticket> {
        let id = Uuid::new_v4().to_string();
        let now = encode_timestamp(Utc::now());

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r"
            INSERT INTO tickets (id, user_id, subject, status, priority, assigned_to, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, NULL, ?, ?)
            ",
        )
        .bind(&id)
        .bind(&new.user_id)
        .bind(&new.subject)
        .bind(TicketStatus::Open.as_str())
        .bind(new.priority.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO ticket_messages (ticket_id, body, from_user, is_staff, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&new.message)
        .bind(&new.user_id)
        .bind(new.is_staff)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_ticket(&id)
            .await?
            .ok_or_else(|| AppError::internal(format!("Ticket '{id}' missing after insert")))
    }

    /// Get a ticket and its thread
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_ticket(&self, id: &str) -> AppResult<Option<Ticket>> {
        let row = sqlx::query(&format!("{TICKET_SELECT} WHERE t.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let message_rows = sqlx::query(&format!(
            "{MESSAGE_SELECT} WHERE m.ticket_id = ? ORDER BY m.id ASC"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let messages = message_rows
            .iter()
            .map(row_to_message)
            .collect::<AppResult<Vec<_>>>()?;
        row_to_ticket(&row, messages).map(Some)
    }

    /// List tickets, newest first
    ///
    /// `owner` restricts the list to one account's tickets.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_tickets(
        &self,
        owner: Option<&str>,
        status: Option<TicketStatus>,
    ) -> AppResult<Vec<Ticket>> {
        let rows = sqlx::query(&format!(
            r"
            {TICKET_SELECT}
            WHERE (?1 IS NULL OR t.user_id = ?1)
              AND (?2 IS NULL OR t.status = ?2)
            ORDER BY t.created_at DESC, t.rowid DESC
            "
        ))
        .bind(owner)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        let message_rows = sqlx::query(&format!(
            r"
            {MESSAGE_SELECT}
            JOIN tickets t ON t.id = m.ticket_id
            WHERE (?1 IS NULL OR t.user_id = ?1)
              AND (?2 IS NULL OR t.status = ?2)
            ORDER BY m.id ASC
            "
        ))
        .bind(owner)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        let mut threads: HashMap<String, Vec<TicketMessage>> = HashMap::new();
        for row in &message_rows {
            let ticket_id: String = row.try_get("ticket_id")?;
            threads
                .entry(ticket_id)
                .or_default()
                .push(row_to_message(row)?);
        }

        rows.iter()
            .map(|row| -> AppResult<Ticket> {
                let id: String = row.try_get("id")?;
                let messages = threads.remove(&id).unwrap_or_default();
                row_to_ticket(row, messages)
            })
            .collect()
    }

    /// Append a reply and apply triage changes in one transaction
    ///
    /// Returns `None` when no ticket has the id.
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails
    pub async fn update_ticket(&self, id: &str, update: &TicketUpdate) -> AppResult<Option<Ticket>> {
        let now = encode_timestamp(Utc::now());
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE tickets SET
                status = COALESCE(?, status),
                priority = COALESCE(?, priority),
                assigned_to = CASE WHEN ? THEN ? ELSE assigned_to END,
                updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.priority.map(|p| p.as_str()))
        .bind(update.assigned_to.is_some())
        .bind(update.assigned_to.clone().flatten())
        .bind(&now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        if let Some(reply) = &update.message {
            sqlx::query(
                "INSERT INTO ticket_messages (ticket_id, body, from_user, is_staff, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(&reply.body)
            .bind(&reply.from_user)
            .bind(reply.is_staff)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.get_ticket(id).await
    }

    /// Delete a ticket and its thread
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn delete_ticket(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_message(row: &SqliteRow) -> AppResult<TicketMessage> {
    let created_at: String = row.try_get("created_at")?;
    Ok(TicketMessage {
        body: row.try_get("body")?,
        from_user: row.try_get("from_user")?,
        from_username: row.try_get("from_username")?,
        is_staff: row.try_get("is_staff")?,
        created_at: decode_timestamp(&created_at)?,
    })
}

fn row_to_ticket(row: &SqliteRow, messages: Vec<TicketMessage>) -> AppResult<Ticket> {
    let status: String = row.try_get("status")?;
    let priority: String = row.try_get("priority")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Ticket {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        subject: row.try_get("subject")?,
        messages,
        status: TicketStatus::parse(&status).ok_or_else(|| invalid_stored_value("status", &status))?,
        priority: TicketPriority::parse(&priority)
            .ok_or_else(|| invalid_stored_value("priority", &priority))?,
        assigned_to: row.try_get("assigned_to")?,
        assigned_to_username: row.try_get("assigned_to_username")?,
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}
