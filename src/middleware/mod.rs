// ABOUTME: HTTP middleware for request tracing, authentication, and CORS
// ABOUTME: Hosts the access gate that every route consults before touching storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

/// Access gate: bearer token verification and capability checks
pub mod auth;
/// CORS layer configuration
pub mod cors;
/// Request id and span creation
pub mod tracing;

pub use auth::AccessGate;
pub use cors::setup_cors;
pub use tracing::{create_request_span, REQUEST_ID_HEADER};
