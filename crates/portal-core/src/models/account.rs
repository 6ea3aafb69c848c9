// ABOUTME: Account identity model and role definitions
// ABOUTME: Handles normalization and validation rules for usernames and passwords
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use crate::constants::limits::{
    MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH, MIN_USERNAME_LENGTH,
};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Regular portal user
    #[default]
    #[serde(alias = "user")]
    Standard,
}

impl Role {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Standard => "standard",
        }
    }

    /// Parse from database or request string representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "standard" | "user" => Some(Self::Standard),
            _ => None,
        }
    }

    /// Check for admin role
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Stored account record
#[derive(Debug, Clone)]
pub struct Account {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Unique, lowercase handle
    pub username: String,
    /// Salted bcrypt hash
    pub password_hash: String,
    /// Account role
    pub role: Role,
    /// Whether the account may log in
    pub is_active: bool,
    /// Admin who created the account
    pub created_by: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Normalize a handle for lookup and storage
#[must_use]
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Validate an already normalized handle
///
/// # Errors
///
/// Returns a validation error when the handle is too short, too long, or contains
/// anything other than lowercase letters, digits and underscores.
pub fn validate_username(username: &str) -> AppResult<()> {
    let length = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&length) {
        return Err(AppError::invalid_input(format!(
            "Username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"
        )));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(AppError::invalid_input(
            "Username can only contain lowercase letters, numbers, and underscores",
        ));
    }

    Ok(())
}

/// Validate a new password
///
/// # Errors
///
/// Returns a validation error when the password is shorter than the minimum length.
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::invalid_input(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
