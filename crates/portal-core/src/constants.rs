// ABOUTME: Application-wide constants for the portal
// ABOUTME: Field limits, entity defaults and token settings grouped by concern
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

/// Input validation limits
pub mod limits {
    /// Minimum handle length
    pub const MIN_USERNAME_LENGTH: usize = 3;
    /// Maximum handle length
    pub const MAX_USERNAME_LENGTH: usize = 30;
    /// Minimum password length
    pub const MIN_PASSWORD_LENGTH: usize = 6;
    /// Lowest bcrypt cost accepted by the hashing primitive
    pub const MIN_BCRYPT_COST: u32 = 4;
    /// Highest bcrypt cost accepted by the hashing primitive
    pub const MAX_BCRYPT_COST: u32 = 31;
}

/// Defaults applied when a field is omitted
pub mod defaults {
    /// Device model recorded when none is given
    pub const DEVICE_MODEL: &str = "Aura Pro v2.1";
    /// Firmware version recorded when none is given
    pub const DEVICE_FIRMWARE_VERSION: &str = "2.1.0";
    /// Access token validity window in days
    pub const TOKEN_EXPIRY_DAYS: i64 = 30;
    /// Download link validity in seconds
    pub const DOWNLOAD_LINK_TTL_SECS: u64 = 3600;
    /// Object-store prefix for installer files
    pub const SOFTWARE_KEY_PREFIX: &str = "software";
}
