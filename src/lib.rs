// ABOUTME: Main library entry point for the Aura device portal server
// ABOUTME: REST API over accounts, releases, devices, tickets and content with role-checked access
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

#![deny(unsafe_code)]

//! # Portal Server
//!
//! A closed portal for device owners. Users sign in with a username and
//! password, receive a bearer token, and use it to reach the download center,
//! their devices, support tickets, announcements and learning resources.
//! Administrators manage accounts and every catalog from the same API.
//!
//! ## Architecture
//!
//! - **credentials**: the credential verifier behind `POST /api/auth/login`
//! - **middleware**: the access gate every handler consults before storage
//! - **routes**: one route group per entity
//! - **database**: `SQLite` storage, one module per entity
//! - **downloads**: signed, time-limited installer links
//!
//! Error codes, domain models and the capability table live in `portal_core`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use portal_server::config::ServerConfig;
//! use portal_server::database::Database;
//! use portal_server::resources::ServerResources;
//! use portal_server::server::{shutdown_signal, PortalServer};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(ServerConfig::from_env()?);
//!     let database = Database::new(&config.database.url).await?;
//!     let resources = Arc::new(ServerResources::new(database, config)?);
//!
//!     PortalServer::new(resources).run(shutdown_signal()).await
//! }
//! ```

/// Bearer token issuing and validation
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// Username/password verification and password hashing
pub mod credentials;

/// `SQLite` storage for every portal record
pub mod database;

/// Signed download links for installer files
pub mod downloads;

/// Structured logging setup
pub mod logging;

/// Access gate, CORS and request tracing
pub mod middleware;

/// Shared handler state
pub mod resources;

/// REST route groups
pub mod routes;

/// Router assembly and the serve loop
pub mod server;
