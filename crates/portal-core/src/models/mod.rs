// ABOUTME: Core data models for the device portal
// ABOUTME: Re-exports account, device, release, ticket and content records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

//! # Data Models
//!
//! Owned resources (devices, tickets) carry an owner reference to an account.
//! Global resources (releases, announcements, learning resources, settings) are
//! governed purely by role.

mod account;
mod content;
mod device;
mod release;
mod ticket;

pub use account::{normalize_username, validate_password, validate_username, Account, Role};
pub use content::{
    Announcement, AnnouncementKind, LearningResource, ResourceKind, Setting, SkillLevel,
};
pub use device::{Device, DeviceStatus};
pub use release::{Platform, Release};
pub use ticket::{Ticket, TicketMessage, TicketPriority, TicketStatus};
