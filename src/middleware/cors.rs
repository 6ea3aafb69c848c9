// ABOUTME: CORS middleware configuration for the portal REST API
// ABOUTME: Builds the tower-http CorsLayer from the configured origin list
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use crate::config::ServerConfig;
use http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Configure CORS settings for the portal
///
/// `CORS_ALLOWED_ORIGINS` of `*` (or empty) allows any origin; otherwise a
/// comma-separated list of exact origins is allowed.
pub fn setup_cors(config: &ServerConfig) -> CorsLayer {
    let allow_origin = parse_origins(&config.cors.allowed_origins)
        .map_or_else(AllowOrigin::any, AllowOrigin::list);

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .expose_headers([header::HeaderName::from_static("x-request-id")])
}

/// Parse a comma-separated origin list; `None` means any origin
fn parse_origins(raw: &str) -> Option<Vec<HeaderValue>> {
    if raw.trim().is_empty() || raw.trim() == "*" {
        return None;
    }

    let origins: Vec<HeaderValue> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();

    if origins.is_empty() {
        None
    } else {
        Some(origins)
    }
}
