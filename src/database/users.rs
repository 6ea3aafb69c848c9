// ABOUTME: Account management database operations
// ABOUTME: Handles account creation, lookup by handle, admin updates, activation and deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::{decode_timestamp, encode_timestamp, invalid_stored_value, Database};
use chrono::Utc;
use portal_core::{
    errors::{AppError, AppResult, ErrorCode},
    models::{Account, Role},
};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

/// Columns selected for an account row
const ACCOUNT_COLUMNS: &str =
    "id, name, username, password_hash, role, is_active, created_by, created_at, updated_at";

/// Input for creating an account; the handle must already be normalized
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Display name
    pub name: String,
    /// Normalized handle
    pub username: String,
    /// bcrypt hash
    pub password_hash: String,
    /// Role
    pub role: Role,
    /// Whether the account may log in
    pub is_active: bool,
    /// Creating admin
    pub created_by: Option<String>,
}

/// Partial account update; `None` leaves a column unchanged
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    /// New display name
    pub name: Option<String>,
    /// New normalized handle
    pub username: Option<String>,
    /// New bcrypt hash
    pub password_hash: Option<String>,
    /// New role
    pub role: Option<Role>,
    /// New active flag
    pub is_active: Option<bool>,
}

/// Public identity of the admin who created an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatorSummary {
    /// Account id
    pub id: String,
    /// Display name
    pub name: String,
    /// Handle
    pub username: String,
}

/// Account joined with its creator
#[derive(Debug, Clone)]
pub struct AccountWithCreator {
    /// The account
    pub account: Account,
    /// Creating admin, if still present
    pub creator: Option<CreatorSummary>,
}

impl Database {
    /// Create the accounts table
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'standard' CHECK (role IN ('admin', 'standard')),
                is_active INTEGER NOT NULL DEFAULT 0,
                created_by TEXT REFERENCES accounts(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_accounts_created_at ON accounts(created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create an account
    ///
    /// # Errors
    ///
    /// Returns a conflict error if the handle is taken
    pub async fn create_account(&self, new: &NewAccount) -> AppResult<Account> {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4().to_string(),
            name: new.name.clone(),
            username: new.username.clone(),
            password_hash: new.password_hash.clone(),
            role: new.role,
            is_active: new.is_active,
            created_by: new.created_by.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r"
            INSERT INTO accounts (id, name, username, password_hash, role, is_active, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&account.id)
        .bind(&account.name)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.is_active)
        .bind(&account.created_by)
        .bind(encode_timestamp(now))
        .bind(encode_timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(username_conflict)?;

        Ok(account)
    }

    /// Get an account by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_account(&self, id: &str) -> AppResult<Option<Account>> {
        let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Get an account by normalized handle
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_account_by_username(&self, username: &str) -> AppResult<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// List all accounts, newest first, with their creators
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_accounts(&self) -> AppResult<Vec<AccountWithCreator>> {
        let rows = sqlx::query(
            r"
            SELECT a.id, a.name, a.username, a.password_hash, a.role, a.is_active,
                   a.created_by, a.created_at, a.updated_at,
                   c.name AS creator_name, c.username AS creator_username
            FROM accounts a
            LEFT JOIN accounts c ON c.id = a.created_by
            ORDER BY a.created_at DESC, a.rowid DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> AppResult<AccountWithCreator> {
                let account = row_to_account(row)?;
                let creator_name: Option<String> = row.try_get("creator_name")?;
                let creator_username: Option<String> = row.try_get("creator_username")?;
                let creator = match (&account.created_by, creator_name, creator_username) {
                    (Some(id), Some(name), Some(username)) => Some(CreatorSummary {
                        id: id.clone(),
                        name,
                        username,
                    }),
                    _ => None,
                };
                Ok(AccountWithCreator { account, creator })
            })
            .collect()
    }

    /// Apply a partial update
    ///
    /// Returns `None` when no account has the id.
    ///
    /// # Errors
    ///
    /// Returns a conflict error if the new handle is taken
    pub async fn update_account(
        &self,
        id: &str,
        update: &AccountUpdate,
    ) -> AppResult<Option<Account>> {
        let result = sqlx::query(
            r"
            UPDATE accounts SET
                name = COALESCE(?, name),
                username = COALESCE(?, username),
                password_hash = COALESCE(?, password_hash),
                role = COALESCE(?, role),
                is_active = COALESCE(?, is_active),
                updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&update.name)
        .bind(&update.username)
        .bind(&update.password_hash)
        .bind(update.role.map(|r| r.as_str()))
        .bind(update.is_active)
        .bind(encode_timestamp(Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(username_conflict)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_account(id).await
    }

    /// Set the active flag, or toggle it when `is_active` is `None`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn set_account_active(
        &self,
        id: &str,
        is_active: Option<bool>,
    ) -> AppResult<Option<Account>> {
        let result = sqlx::query(
            "UPDATE accounts SET is_active = COALESCE(?, NOT is_active), updated_at = ? WHERE id = ?",
        )
        .bind(is_active)
        .bind(encode_timestamp(Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_account(id).await
    }

    /// Delete an account
    ///
    /// Returns `false` when no account has the id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn delete_account(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether any admin account exists
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn admin_exists(&self) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}

fn username_conflict(error: sqlx::Error) -> AppError {
    let error = AppError::from(error);
    if error.code == ErrorCode::ResourceAlreadyExists {
        AppError::conflict("Username already exists")
    } else {
        error
    }
}

fn row_to_account(row: &SqliteRow) -> AppResult<Account> {
    let role: String = row.try_get("role")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Account {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role: Role::parse(&role).ok_or_else(|| invalid_stored_value("role", &role))?,
        is_active: row.try_get("is_active")?,
        created_by: row.try_get("created_by")?,
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}
