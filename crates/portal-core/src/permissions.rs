// ABOUTME: Access policies and the capability table for every portal endpoint
// ABOUTME: Pure evaluation of (principal, policy, resource owner) into allow or deny
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

//! # Access Policies
//!
//! Each endpoint declares a [`Capability`]. The capability maps to exactly one
//! [`AccessPolicy`] through [`Capability::policy`], and [`evaluate`] decides the
//! outcome from the principal, the policy and the resource owner alone.

use crate::errors::AppError;
use crate::models::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verified identity derived from an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Account id
    pub id: String,
    /// Account handle
    pub username: String,
    /// Account role
    pub role: Role,
}

impl Principal {
    /// Check for admin role
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether this principal owns a resource with the given owner reference
    #[must_use]
    pub fn owns(&self, owner_id: Option<&str>) -> bool {
        owner_id == Some(self.id.as_str())
    }
}

/// Authorization requirement for a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPolicy {
    /// Always passes, principal optional
    Public,
    /// Requires a verified principal
    AnyAuthenticated,
    /// Requires the admin role
    AdminOnly,
    /// Requires the admin role or ownership of the resource
    OwnerOrAdmin,
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Public => "public",
            Self::AnyAuthenticated => "any_authenticated",
            Self::AdminOnly => "admin_only",
            Self::OwnerOrAdmin => "owner_or_admin",
        };
        f.write_str(name)
    }
}

/// Reason a policy rejected a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// No principal where one is required
    Unauthenticated,
    /// Principal present but lacks rights
    Forbidden,
}

impl From<AccessDenied> for AppError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::Unauthenticated => Self::auth_required(),
            AccessDenied::Forbidden => Self::forbidden("Insufficient permissions"),
        }
    }
}

/// Evaluate a policy
///
/// `resource_owner` is only consulted for [`AccessPolicy::OwnerOrAdmin`]; a
/// resource without an owner can only be reached by an admin.
///
/// # Errors
///
/// Returns [`AccessDenied::Unauthenticated`] when a principal is required but
/// missing, and [`AccessDenied::Forbidden`] when the principal lacks rights.
pub fn evaluate(
    principal: Option<&Principal>,
    policy: AccessPolicy,
    resource_owner: Option<&str>,
) -> Result<(), AccessDenied> {
    if policy == AccessPolicy::Public {
        return Ok(());
    }

    let principal = principal.ok_or(AccessDenied::Unauthenticated)?;

    let allowed = match policy {
        AccessPolicy::Public | AccessPolicy::AnyAuthenticated => true,
        AccessPolicy::AdminOnly => principal.is_admin(),
        AccessPolicy::OwnerOrAdmin => principal.is_admin() || principal.owns(resource_owner),
    };

    if allowed {
        Ok(())
    } else {
        Err(AccessDenied::Forbidden)
    }
}

/// Every operation exposed by the portal API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Read own profile
    ReadOwnProfile,
    /// Update own name or password
    UpdateOwnProfile,
    /// List, create, update, delete accounts
    ManageAccounts,
    /// Activate or deactivate an account
    SetAccountActive,

    /// Read releases, announcements, learning resources or one setting
    BrowseCatalog,
    /// Create, update, delete releases, announcements, learning resources
    ManageCatalog,
    /// List every setting
    ListSettings,
    /// Create, update, delete settings
    ManageSettings,

    /// List every device
    ListAllDevices,
    /// Read devices assigned to the caller
    ListOwnDevices,
    /// Read one device
    ReadDevice,
    /// Create, update, delete devices
    ManageDevices,

    /// Open a ticket
    CreateTicket,
    /// List tickets visible to the caller
    ListTickets,
    /// Read one ticket
    ReadTicket,
    /// Post a message on a ticket
    ReplyTicket,
    /// Change ticket status, priority or assignment
    TriageTicket,
    /// Delete a ticket
    DeleteTicket,

    /// Obtain a download link
    RequestDownload,
    /// View the admin dashboard counters
    ViewAnalytics,
}

impl Capability {
    /// The policy the capability requires
    #[must_use]
    pub const fn policy(self) -> AccessPolicy {
        match self {
            Self::BrowseCatalog => AccessPolicy::Public,

            Self::ReadOwnProfile
            | Self::UpdateOwnProfile
            | Self::ListOwnDevices
            | Self::CreateTicket
            | Self::ListTickets
            | Self::RequestDownload => AccessPolicy::AnyAuthenticated,

            Self::ReadDevice | Self::ReadTicket | Self::ReplyTicket => AccessPolicy::OwnerOrAdmin,

            Self::ManageAccounts
            | Self::SetAccountActive
            | Self::ManageCatalog
            | Self::ListSettings
            | Self::ManageSettings
            | Self::ListAllDevices
            | Self::ManageDevices
            | Self::TriageTicket
            | Self::DeleteTicket
            | Self::ViewAnalytics => AccessPolicy::AdminOnly,
        }
    }

    /// Evaluate this capability for a principal and resource owner
    ///
    /// # Errors
    ///
    /// Returns the denial produced by [`evaluate`].
    pub fn check(
        self,
        principal: Option<&Principal>,
        resource_owner: Option<&str>,
    ) -> Result<(), AccessDenied> {
        evaluate(principal, self.policy(), resource_owner)
    }
}
