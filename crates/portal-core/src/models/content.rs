// ABOUTME: Global content models: announcements, learning resources and settings
// ABOUTME: Unowned records whose visibility depends on flags and publication windows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Announcement category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementKind {
    /// General information
    Info,
    /// Something users should act on
    Warning,
    /// Planned downtime
    Maintenance,
    /// Product news
    #[default]
    News,
}

impl AnnouncementKind {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Maintenance => "maintenance",
            Self::News => "news",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "maintenance" => Some(Self::Maintenance),
            "news" => Some(Self::News),
            _ => None,
        }
    }
}

/// A broadcast message shown on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    /// Unique identifier
    pub id: String,
    /// Headline
    pub title: String,
    /// Message body
    pub body: String,
    /// Category
    #[serde(rename = "type")]
    pub kind: AnnouncementKind,
    /// Master switch
    pub active: bool,
    /// Start of the publication window
    pub start_at: Option<DateTime<Utc>>,
    /// End of the publication window
    pub end_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Announcement {
    /// Whether a non-admin sees this announcement at `now`
    ///
    /// A missing bound leaves that side of the window open.
    #[must_use]
    pub fn is_published_at(&self, now: DateTime<Utc>) -> bool {
        self.active
            && self.start_at.is_none_or(|start| start <= now)
            && self.end_at.is_none_or(|end| now <= end)
    }
}

/// Learning resource media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Video tutorial
    Video,
    /// PDF document
    Pdf,
    /// External link
    Link,
}

impl ResourceKind {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Pdf => "pdf",
            Self::Link => "link",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "video" => Some(Self::Video),
            "pdf" => Some(Self::Pdf),
            "link" => Some(Self::Link),
            _ => None,
        }
    }
}

/// Intended audience level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    /// New users
    Beginner,
    /// Comfortable users
    Intermediate,
    /// Power users
    Advanced,
}

impl SkillLevel {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Beginner" => Some(Self::Beginner),
            "Intermediate" => Some(Self::Intermediate),
            "Advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

/// An item in the learning center
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningResource {
    /// Unique identifier
    pub id: String,
    /// Title
    pub title: String,
    /// Optional description
    pub description: Option<String>,
    /// Media type
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    /// Public URL, for links and hosted media
    pub url: Option<String>,
    /// Object-store key, for downloadable media
    pub storage_key: Option<String>,
    /// Display duration, e.g. `12:30`
    pub duration: Option<String>,
    /// Display size, e.g. `2.4 MB`
    pub size: Option<String>,
    /// Audience level
    pub level: Option<SkillLevel>,
    /// Sort position, ascending
    pub order: i64,
    /// Whether non-admins can see the item
    pub visible: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// A keyed configuration value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    /// Unique key
    pub key: String,
    /// Arbitrary JSON value
    pub value: serde_json::Value,
    /// Optional description
    pub description: Option<String>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}
