// ABOUTME: Credential verification and password hashing for portal accounts
// ABOUTME: Checks handle/secret pairs against bcrypt hashes and issues access tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

//! # Credential Verifier
//!
//! `authenticate(handle, secret)` looks the account up by normalized handle,
//! compares the secret with the stored bcrypt hash, refuses inactive accounts,
//! and signs an access token. Nothing is persisted.

use crate::auth::{AuthManager, IssuedToken};
use async_trait::async_trait;
use portal_core::{
    errors::{AppError, AppResult},
    models::{normalize_username, Account},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Account lookup needed to verify credentials
#[async_trait]
pub trait AccountLookup: Send + Sync {
    /// Find an account by its normalized handle
    async fn find_account_by_username(&self, username: &str) -> AppResult<Option<Account>>;
}

/// Outcome of a successful login
#[derive(Debug, Clone)]
pub struct Authenticated {
    /// The verified account
    pub account: Account,
    /// The issued access token
    pub token: IssuedToken,
}

/// Verifies handle/secret pairs and issues tokens
#[derive(Clone)]
pub struct CredentialVerifier {
    accounts: Arc<dyn AccountLookup>,
    auth_manager: Arc<AuthManager>,
}

impl CredentialVerifier {
    /// Create a verifier over an account source and token manager
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountLookup>, auth_manager: Arc<AuthManager>) -> Self {
        Self {
            accounts,
            auth_manager,
        }
    }

    /// Verify credentials and issue an access token
    ///
    /// # Errors
    ///
    /// - `MissingRequiredField` when either input is empty
    /// - `InvalidCredentials` for an unknown handle or a wrong secret
    /// - `AccountInactive` when the secret matches but the account is disabled
    #[tracing::instrument(skip_all, fields(username = %handle.trim(), account_id = tracing::field::Empty))]
    pub async fn authenticate(&self, handle: &str, secret: &str) -> AppResult<Authenticated> {
        let username = normalize_username(handle);
        if username.is_empty() || secret.is_empty() {
            return Err(AppError::missing_field("Username and password"));
        }

        let Some(account) = self.accounts.find_account_by_username(&username).await? else {
            warn!("Login failed: unknown username");
            return Err(AppError::invalid_credentials());
        };
        tracing::Span::current().record("account_id", account.id.as_str());

        if !verify_password(secret, &account.password_hash).await? {
            warn!("Login failed: password mismatch");
            return Err(AppError::invalid_credentials());
        }

        if !account.is_active {
            warn!("Login refused: account inactive");
            return Err(AppError::account_inactive());
        }

        let token = self.auth_manager.generate_token(&account)?;
        info!("Login succeeded");

        Ok(Authenticated { account, token })
    }
}

/// Hash a password with bcrypt off the async executor
///
/// # Errors
///
/// Returns an internal error if hashing fails
pub async fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Password hashing error: {e}")))
}

/// Compare a password with a bcrypt hash off the async executor
///
/// An unparseable stored hash counts as a mismatch.
///
/// # Errors
///
/// Returns an internal error if the blocking task fails
pub async fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use portal_core::{errors::ErrorCode, models::Role};
    use std::collections::HashMap;

    struct InMemoryAccounts(HashMap<String, Account>);

    #[async_trait]
    impl AccountLookup for InMemoryAccounts {
        async fn find_account_by_username(&self, username: &str) -> AppResult<Option<Account>> {
            Ok(self.0.get(username).cloned())
        }
    }

    async fn verifier_with(accounts: &[(&str, &str, bool)]) -> (CredentialVerifier, Arc<AuthManager>) {
        let mut map = HashMap::new();
        for (username, password, is_active) in accounts {
            let now = Utc::now();
            map.insert(
                (*username).to_owned(),
                Account {
                    id: format!("id-{username}"),
                    name: (*username).to_owned(),
                    username: (*username).to_owned(),
                    password_hash: hash_password(password, 4).await.unwrap(),
                    role: Role::Standard,
                    is_active: *is_active,
                    created_by: None,
                    created_at: now,
                    updated_at: now,
                },
            );
        }
        let auth_manager = Arc::new(AuthManager::new(b"secret", Duration::days(30)));
        (
            CredentialVerifier::new(Arc::new(InMemoryAccounts(map)), auth_manager.clone()),
            auth_manager,
        )
    }

    #[tokio::test]
    async fn test_valid_credentials_issue_matching_token() {
        let (verifier, auth_manager) = verifier_with(&[("alice", "hunter22", true)]).await;

        let result = verifier.authenticate("  Alice ", "hunter22").await.unwrap();
        let claims = auth_manager
            .validate_token_detailed(&result.token.token)
            .unwrap();
        assert_eq!(claims.sub, "id-alice");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::Standard);
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let (verifier, _) = verifier_with(&[("alice", "hunter22", true)]).await;
        let err = verifier.authenticate("alice", "wrong").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_unknown_user_is_invalid_credentials() {
        let (verifier, _) = verifier_with(&[]).await;
        let err = verifier.authenticate("nobody", "hunter22").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_inactive_account_refused_with_correct_password() {
        let (verifier, _) = verifier_with(&[("bob", "hunter22", false)]).await;
        let err = verifier.authenticate("bob", "hunter22").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AccountInactive);
    }

    #[tokio::test]
    async fn test_empty_inputs_are_validation_errors() {
        let (verifier, _) = verifier_with(&[]).await;
        let err = verifier.authenticate("  ", "x").await.unwrap_err();
        assert_eq!(err.http_status(), 400);
        let err = verifier.authenticate("alice", "").await.unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[tokio::test]
    async fn test_corrupt_hash_is_mismatch() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash").await.unwrap());
    }
}
