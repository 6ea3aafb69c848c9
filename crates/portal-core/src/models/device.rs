// ABOUTME: Device record model owned by an optional account
// ABOUTME: Serial-numbered hardware units with lifecycle status
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Device lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// In service
    #[default]
    Active,
    /// Registered but not in use
    Inactive,
    /// Barred from service
    Blocked,
}

impl DeviceStatus {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Blocked => "blocked",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }
}

/// A registered hardware unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Unique identifier
    pub id: String,
    /// Unique hardware serial
    pub serial_number: String,
    /// Owning account, if assigned
    pub user_id: Option<String>,
    /// Hardware model name
    pub model: String,
    /// Installed firmware version
    pub firmware_version: String,
    /// Lifecycle status
    pub status: DeviceStatus,
    /// Last time the device reported in
    pub last_seen: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}
