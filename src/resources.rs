// ABOUTME: Centralized resource container shared by every route handler
// ABOUTME: Holds the database, token manager, access gate, credential verifier and link issuer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

//! # Server Resources
//!
//! Built once at startup and passed to each route group as axum state, so no
//! request creates its own database handle or token manager.

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::credentials::{AccountLookup, CredentialVerifier};
use crate::database::Database;
use crate::downloads::{DownloadLinkIssuer, SignedUrlIssuer};
use crate::middleware::AccessGate;
use anyhow::Result;
use std::sync::Arc;

/// Shared server resources
#[derive(Clone)]
pub struct ServerResources {
    /// Storage
    pub database: Arc<Database>,
    /// Token signing and verification
    pub auth_manager: Arc<AuthManager>,
    /// Per-request access checks
    pub gate: AccessGate,
    /// Login credential checks
    pub verifier: CredentialVerifier,
    /// Configuration snapshot
    pub config: Arc<ServerConfig>,
    /// Download link issuer; `None` when downloads are not configured
    pub link_issuer: Option<Arc<dyn DownloadLinkIssuer>>,
}

impl ServerResources {
    /// Wire resources from an opened database and loaded configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the download base URL is invalid
    pub fn new(database: Database, config: Arc<ServerConfig>) -> Result<Self> {
        let link_issuer = SignedUrlIssuer::from_config(&config.downloads)?
            .map(|issuer| Arc::new(issuer) as Arc<dyn DownloadLinkIssuer>);
        Ok(Self::with_link_issuer(database, config, link_issuer))
    }

    /// Wire resources with an explicit download link issuer
    #[must_use]
    pub fn with_link_issuer(
        database: Database,
        config: Arc<ServerConfig>,
        link_issuer: Option<Arc<dyn DownloadLinkIssuer>>,
    ) -> Self {
        let database = Arc::new(database);
        let auth_manager = Arc::new(AuthManager::new(
            config.auth.jwt_secret.as_bytes(),
            config.auth.token_expiry,
        ));
        let verifier = CredentialVerifier::new(
            database.clone() as Arc<dyn AccountLookup>,
            auth_manager.clone(),
        );

        Self {
            gate: AccessGate::new(auth_manager.clone()),
            database,
            auth_manager,
            verifier,
            config,
            link_issuer,
        }
    }

    /// bcrypt cost for new hashes
    #[must_use]
    pub fn bcrypt_cost(&self) -> u32 {
        self.config.auth.bcrypt_cost
    }
}
