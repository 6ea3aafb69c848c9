// ABOUTME: Configuration module for the portal server
// ABOUTME: Environment-driven settings for networking, storage, tokens and downloads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

/// Environment variable parsing into `ServerConfig`
pub mod environment;

pub use environment::{
    AuthConfig, CorsConfig, DatabaseConfig, DatabaseUrl, DownloadConfig, Environment, ServerConfig,
};
