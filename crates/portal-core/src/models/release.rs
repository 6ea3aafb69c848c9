// ABOUTME: Software release model for the download center
// ABOUTME: Installer metadata per platform with the single latest-release flag
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Target platform of an installer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Windows desktop
    Windows,
    /// macOS desktop
    Macos,
    /// Linux desktop
    Linux,
    /// Mobile companion app
    Mobile,
    /// Universal package
    All,
}

impl Platform {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Macos => "macos",
            Self::Linux => "linux",
            Self::Mobile => "mobile",
            Self::All => "all",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "windows" => Some(Self::Windows),
            "macos" => Some(Self::Macos),
            "linux" => Some(Self::Linux),
            "mobile" => Some(Self::Mobile),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// A published software release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    /// Unique identifier
    pub id: String,
    /// Version string, e.g. `2.1.0`
    pub version: String,
    /// Installer file name in object storage
    pub file_name: String,
    /// Target platform
    pub platform: Platform,
    /// Human readable platform label
    pub platform_label: String,
    /// Display size, e.g. `84 MB`
    pub size: Option<String>,
    /// Changelog entries
    pub changelog: Vec<String>,
    /// Whether this is the current release
    pub is_latest: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}
