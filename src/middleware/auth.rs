// ABOUTME: Access gate applied by every portal route before touching storage
// ABOUTME: Extracts the bearer token, verifies it, and enforces the route's capability policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

//! # Access Gate
//!
//! Resolves a [`Principal`] from `Authorization: Bearer <token>` without a
//! database round-trip, then applies the policy of the requested [`Capability`].
//! Failures are typed [`AppError`]s: `AUTH_*` (401) or `PERMISSION_DENIED` (403).

use crate::auth::AuthManager;
use axum::http::HeaderMap;
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use portal_core::{
    errors::{AppError, AppResult},
    permissions::{Capability, Principal},
};
use std::sync::Arc;
use tracing::{debug, field::Empty, Span};

/// Per-request authentication and authorization checkpoint
#[derive(Clone, Debug)]
pub struct AccessGate {
    auth_manager: Arc<AuthManager>,
}

impl AccessGate {
    /// Create a gate backed by a token manager
    #[must_use]
    pub const fn new(auth_manager: Arc<AuthManager>) -> Self {
        Self { auth_manager }
    }

    /// Extract the bearer token from request headers
    fn bearer_token(headers: &HeaderMap) -> Option<String> {
        headers
            .typed_get::<Authorization<Bearer>>()
            .map(|auth| auth.token().to_owned())
    }

    /// Require a valid token and resolve its principal
    ///
    /// # Errors
    ///
    /// Returns `AUTH_REQUIRED` when the header is absent or malformed, and
    /// `AUTH_INVALID` or `AUTH_EXPIRED` when verification fails
    #[tracing::instrument(skip_all, fields(account_id = Empty, success = Empty))]
    pub fn authenticate(&self, headers: &HeaderMap) -> AppResult<Principal> {
        let Some(token) = Self::bearer_token(headers) else {
            Span::current().record("success", false);
            return Err(AppError::auth_required());
        };

        match self.auth_manager.validate_token(&token) {
            Ok(principal) => {
                let span = Span::current();
                span.record("account_id", principal.id.as_str());
                span.record("success", true);
                Ok(principal)
            }
            Err(e) => {
                Span::current().record("success", false);
                debug!(error = %e, "Token rejected");
                Err(e)
            }
        }
    }

    /// Resolve a principal if the request carries a valid token
    ///
    /// Used by public routes, where an invalid token is the same as none.
    #[must_use]
    pub fn identify(&self, headers: &HeaderMap) -> Option<Principal> {
        let token = Self::bearer_token(headers)?;
        self.auth_manager.validate_token(&token).ok()
    }

    /// Authenticate and check a capability that needs no resource owner
    ///
    /// Public capabilities should use [`AccessGate::identify`] instead; this
    /// method always requires a principal.
    ///
    /// # Errors
    ///
    /// Returns the authentication error, or `PERMISSION_DENIED` when the
    /// principal's role does not satisfy the capability
    pub fn authorize(&self, headers: &HeaderMap, capability: Capability) -> AppResult<Principal> {
        let principal = self.authenticate(headers)?;
        Self::permit(&principal, capability, None)?;
        Ok(principal)
    }

    /// Check a capability for an already authenticated principal
    ///
    /// # Errors
    ///
    /// Returns `PERMISSION_DENIED` when the policy rejects the principal
    pub fn permit(
        principal: &Principal,
        capability: Capability,
        resource_owner: Option<&str>,
    ) -> AppResult<()> {
        capability
            .check(Some(principal), resource_owner)
            .map_err(|denied| {
                debug!(
                    account_id = %principal.id,
                    ?capability,
                    policy = %capability.policy(),
                    "Access denied"
                );
                AppError::from(denied)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};
    use portal_core::{
        errors::ErrorCode,
        models::{Account, Role},
    };

    fn gate() -> (AccessGate, Arc<AuthManager>) {
        let manager = Arc::new(AuthManager::new(b"gate-secret", Duration::days(30)));
        (AccessGate::new(manager.clone()), manager)
    }

    fn headers_for(manager: &AuthManager, role: Role) -> HeaderMap {
        let now = Utc::now();
        let account = Account {
            id: "acc-7".into(),
            name: "Grace".into(),
            username: "grace".into(),
            password_hash: String::new(),
            role,
            is_active: true,
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        let token = manager.generate_token(&account).unwrap().token;
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_missing_header_is_auth_required() {
        let (gate, _) = gate();
        let err = gate.authenticate(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthRequired);
    }

    #[test]
    fn test_non_bearer_scheme_is_auth_required() {
        let (gate, _) = gate();
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        let err = gate.authenticate(&headers).unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthRequired);
    }

    #[test]
    fn test_valid_token_resolves_principal() {
        let (gate, manager) = gate();
        let principal = gate
            .authenticate(&headers_for(&manager, Role::Standard))
            .unwrap();
        assert_eq!(principal.id, "acc-7");
        assert_eq!(principal.username, "grace");
        assert_eq!(principal.role, Role::Standard);
    }

    #[test]
    fn test_authorize_admin_capability() {
        let (gate, manager) = gate();
        let err = gate
            .authorize(&headers_for(&manager, Role::Standard), Capability::ListAllDevices)
            .unwrap_err();
        assert_eq!(err.http_status(), 403);

        assert!(gate
            .authorize(&headers_for(&manager, Role::Admin), Capability::ListAllDevices)
            .is_ok());
    }

    #[test]
    fn test_identify_ignores_bad_tokens() {
        let (gate, _) = gate();
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer garbage"));
        assert!(gate.identify(&headers).is_none());
        assert!(gate.identify(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_permit_owner() {
        let principal = Principal {
            id: "u1".into(),
            username: "u1".into(),
            role: Role::Standard,
        };
        assert!(AccessGate::permit(&principal, Capability::ReadTicket, Some("u1")).is_ok());
        assert_eq!(
            AccessGate::permit(&principal, Capability::ReadTicket, Some("u2"))
                .unwrap_err()
                .http_status(),
            403
        );
    }
}
