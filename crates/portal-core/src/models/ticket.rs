// ABOUTME: Support ticket model with its message thread
// ABOUTME: Status and priority enums plus the staff/user message record
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ticket workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    /// Awaiting staff
    #[default]
    Open,
    /// Being worked on
    InProgress,
    /// Answered
    Resolved,
    /// Archived
    Closed,
}

impl TicketStatus {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "in-progress" => Some(Self::InProgress),
            "resolved" => Some(Self::Resolved),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    /// All statuses, in workflow order
    pub const ALL: [Self; 4] = [Self::Open, Self::InProgress, Self::Resolved, Self::Closed];
}

/// Ticket priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    /// Low
    Low,
    /// Medium
    #[default]
    Medium,
    /// High
    High,
}

impl TicketPriority {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// All priorities, lowest first
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];
}

/// One message in a ticket thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketMessage {
    /// Message text
    pub body: String,
    /// Author account id
    pub from_user: String,
    /// Author handle; `None` once the author account is gone
    pub from_username: Option<String>,
    /// Whether the author was an admin
    pub is_staff: bool,
    /// When the message was posted
    pub created_at: DateTime<Utc>,
}

/// A support ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Unique identifier
    pub id: String,
    /// Owning account
    pub user_id: String,
    /// Owner handle
    pub username: Option<String>,
    /// Short summary
    pub subject: String,
    /// Message thread, oldest first
    pub messages: Vec<TicketMessage>,
    /// Workflow status
    pub status: TicketStatus,
    /// Priority
    pub priority: TicketPriority,
    /// Staff account handling the ticket
    pub assigned_to: Option<String>,
    /// Assignee handle
    pub assigned_to_username: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}
