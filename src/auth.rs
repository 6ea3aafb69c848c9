// ABOUTME: JWT access token issuance and verification for portal accounts
// ABOUTME: HS256 tokens carrying account id, handle and role with a fixed validity window
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

//! # Access Tokens
//!
//! Tokens are stateless. Nothing is stored server-side, so a token stays valid
//! until its expiry timestamp or until the signing secret is rotated.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use portal_core::{
    errors::{AppError, AppResult},
    models::{Account, Role},
    permissions::Principal,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `JWT` validation error with detailed information
#[derive(Debug, Clone)]
pub enum JwtValidationError {
    /// Token has expired
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
        /// Current time for reference
        current_time: DateTime<Utc>,
    },
    /// Token signature is invalid
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is malformed (not proper `JWT` format)
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
}

impl fmt::Display for JwtValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenExpired {
                expired_at,
                current_time,
            } => {
                let ago = current_time.signed_duration_since(*expired_at);
                if ago.num_hours() < 1 {
                    write!(f, "JWT token expired {} minutes ago", ago.num_minutes())
                } else if ago.num_days() < 1 {
                    write!(f, "JWT token expired {} hours ago", ago.num_hours())
                } else {
                    write!(f, "JWT token expired {} days ago", ago.num_days())
                }
            }
            Self::TokenInvalid { reason } => write!(f, "JWT token signature is invalid: {reason}"),
            Self::TokenMalformed { details } => write!(f, "JWT token is malformed: {details}"),
        }
    }
}

impl std::error::Error for JwtValidationError {}

impl From<JwtValidationError> for AppError {
    fn from(error: JwtValidationError) -> Self {
        match error {
            JwtValidationError::TokenExpired { .. } => Self::auth_expired(),
            JwtValidationError::TokenInvalid { .. } | JwtValidationError::TokenMalformed { .. } => {
                Self::auth_invalid("Invalid or expired token")
            }
        }
    }
}

/// `JWT` claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account `ID`
    pub sub: String,
    /// Account handle
    pub username: String,
    /// Account role at issuance
    pub role: Role,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Encoded `JWT`
    pub token: String,
    /// Expiry timestamp embedded in the token
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies access tokens
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry: Duration,
}

impl fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthManager")
            .field("token_expiry", &self.token_expiry)
            .finish_non_exhaustive()
    }
}

impl AuthManager {
    /// Create a manager for an HS256 secret and validity window
    #[must_use]
    pub fn new(secret: &[u8], token_expiry: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_expiry,
        }
    }

    /// Validity window applied to new tokens
    #[must_use]
    pub const fn token_expiry(&self) -> Duration {
        self.token_expiry
    }

    /// Issue a token for an account
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails
    pub fn generate_token(&self, account: &Account) -> AppResult<IssuedToken> {
        self.generate_token_at(account, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails
    pub fn generate_token_at(&self, account: &Account, now: DateTime<Utc>) -> AppResult<IssuedToken> {
        let expires_at = now + self.token_expiry;
        let claims = Claims {
            sub: account.id.clone(),
            username: account.username.clone(),
            role: account.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate a token with detailed error information
    ///
    /// Expiry is checked against the current time without leeway.
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] if the signature is invalid, the token
    /// is malformed, or the token has expired
    pub fn validate_token_detailed(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| Self::convert_jwt_error(&e))?
            .claims;

        let current_time = Utc::now();
        if claims.exp <= current_time.timestamp() {
            let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or(current_time);
            tracing::debug!(account_id = %claims.sub, %expired_at, "Rejected expired token");
            return Err(JwtValidationError::TokenExpired {
                expired_at,
                current_time,
            });
        }

        Ok(claims)
    }

    /// Validate a token and resolve its principal
    ///
    /// # Errors
    ///
    /// Returns an unauthenticated [`AppError`] for any invalid token
    pub fn validate_token(&self, token: &str) -> AppResult<Principal> {
        Ok(self.validate_token_detailed(token)?.into())
    }

    fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> JwtValidationError {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::InvalidSignature => JwtValidationError::TokenInvalid {
                reason: "Token signature verification failed".into(),
            },
            ErrorKind::InvalidToken => JwtValidationError::TokenMalformed {
                details: "Token format is invalid".into(),
            },
            ErrorKind::Base64(base64_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid base64: {base64_err}"),
            },
            ErrorKind::Json(json_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid JSON: {json_err}"),
            },
            ErrorKind::Utf8(utf8_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid UTF-8: {utf8_err}"),
            },
            _ => JwtValidationError::TokenInvalid {
                reason: format!("Token validation failed: {e}"),
            },
        }
    }
}

/// Generate a random hex-encoded `JWT` secret
///
/// # Errors
///
/// Returns an error if the system RNG fails
pub fn generate_jwt_secret() -> Result<String> {
    use ring::rand::{SecureRandom, SystemRandom};

    let rng = SystemRandom::new();
    let mut secret = [0u8; 64];
    rng.fill(&mut secret)
        .map_err(|_| anyhow!("System RNG failure - cannot generate secure JWT secret"))?;

    Ok(hex::encode(secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::errors::ErrorCode;

    fn account(role: Role) -> Account {
        let now = Utc::now();
        Account {
            id: "acc-1".into(),
            name: "Ada".into(),
            username: "ada".into(),
            password_hash: String::new(),
            role,
            is_active: true,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn manager() -> AuthManager {
        AuthManager::new(b"test-secret", Duration::days(30))
    }

    #[test]
    fn test_token_round_trip_preserves_identity() {
        let manager = manager();
        let issued = manager.generate_token(&account(Role::Admin)).unwrap();
        let claims = manager.validate_token_detailed(&issued.token).unwrap();

        assert_eq!(claims.sub, "acc-1");
        assert_eq!(claims.username, "ada");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert_eq!(claims.exp - claims.iat, Duration::days(30).num_seconds());
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = manager();
        let issued = manager
            .generate_token_at(&account(Role::Standard), Utc::now() - Duration::days(31))
            .unwrap();

        let err = manager.validate_token_detailed(&issued.token).unwrap_err();
        assert!(matches!(err, JwtValidationError::TokenExpired { .. }));

        let app_err = manager.validate_token(&issued.token).unwrap_err();
        assert_eq!(app_err.code, ErrorCode::AuthExpired);
        assert_eq!(app_err.http_status(), 401);
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let other = AuthManager::new(b"other-secret", Duration::days(30));
        let issued = other.generate_token(&account(Role::Admin)).unwrap();

        let err = manager().validate_token_detailed(&issued.token).unwrap_err();
        assert!(matches!(err, JwtValidationError::TokenInvalid { .. }));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let err = manager().validate_token("not-a-token").unwrap_err();
        assert_eq!(err.http_status(), 401);
    }

    #[test]
    fn test_generate_jwt_secret_is_random() {
        let a = generate_jwt_secret().unwrap();
        let b = generate_jwt_secret().unwrap();
        assert_eq!(a.len(), 128);
        assert_ne!(a, b);
    }
}
