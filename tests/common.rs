// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Builds in-memory server resources, seeds accounts and mints tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `portal_server`

use axum::Router;
use portal_core::models::{Account, Role};
use portal_server::{
    config::ServerConfig,
    credentials::hash_password,
    database::{Database, NewAccount},
    resources::ServerResources,
    server::PortalServer,
};
use std::collections::HashMap;
use std::sync::{Arc, Once};

/// Password given to every seeded account
pub const TEST_PASSWORD: &str = "password123";

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Configuration for an in-memory database, cheap hashing and signed downloads
pub fn test_config() -> ServerConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("DATABASE_URL", "sqlite::memory:"),
        ("JWT_SECRET", "integration-test-secret"),
        ("BCRYPT_COST", "4"),
        ("DOWNLOAD_BASE_URL", "https://files.example.com/portal"),
        ("DOWNLOAD_LINK_TTL_SECS", "600"),
    ]);
    ServerConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_owned()))
        .expect("test config should load")
}

/// Fresh resources over an in-memory database
pub async fn create_test_resources() -> Arc<ServerResources> {
    init_test_logging();
    let config = test_config();
    let database = Database::new(&config.database.url)
        .await
        .expect("in-memory database should open");
    Arc::new(ServerResources::new(database, Arc::new(config)).expect("resources should build"))
}

/// The complete router, middleware included
pub fn test_app(resources: &Arc<ServerResources>) -> Router {
    PortalServer::new(resources.clone()).router()
}

/// Insert an account with [`TEST_PASSWORD`]
pub async fn create_account(
    resources: &ServerResources,
    username: &str,
    role: Role,
    is_active: bool,
) -> Account {
    resources
        .database
        .create_account(&NewAccount {
            name: format!("{username} name"),
            username: username.to_owned(),
            password_hash: hash_password(TEST_PASSWORD, 4).await.unwrap(),
            role,
            is_active,
            created_by: None,
        })
        .await
        .unwrap()
}

/// Sign a token for an account without going through login
pub fn token_for(resources: &ServerResources, account: &Account) -> String {
    resources
        .auth_manager
        .generate_token(account)
        .unwrap()
        .token
}

/// Seed an active admin and return it with a token
pub async fn admin(resources: &ServerResources) -> (Account, String) {
    let account = create_account(resources, "admin", Role::Admin, true).await;
    let token = token_for(resources, &account);
    (account, token)
}

/// Seed an active standard user and return it with a token
pub async fn standard_user(resources: &ServerResources, username: &str) -> (Account, String) {
    let account = create_account(resources, username, Role::Standard, true).await;
    let token = token_for(resources, &account);
    (account, token)
}
