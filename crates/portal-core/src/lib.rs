// ABOUTME: Core types for the Aura device portal
// ABOUTME: Foundation crate with error handling, domain models, and access policies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

#![deny(unsafe_code)]

//! # Portal Core
//!
//! Shared types for the portal server. This crate has no I/O and changes
//! infrequently.
//!
//! ## Modules
//!
//! - **errors**: `AppError`, `ErrorCode` and the HTTP status mapping
//! - **constants**: limits and defaults
//! - **models**: account, device, release, ticket and content records
//! - **permissions**: principals, access policies and the capability table

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by concern
pub mod constants;

/// Core data models
pub mod models;

/// Access policies and the capability table
pub mod permissions;
