// ABOUTME: Environment-based server configuration for the portal
// ABOUTME: Parses ports, database URL, token window, hashing cost, download and CORS settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

//! Environment-based configuration

use crate::auth::generate_jwt_secret;
use anyhow::{bail, Context, Result};
use chrono::Duration;
use portal_core::constants::{
    defaults::{DOWNLOAD_LINK_TTL_SECS, TOKEN_EXPIRY_DAYS},
    limits::{MAX_BCRYPT_COST, MIN_BCRYPT_COST},
};
use std::env;
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

/// Default HTTP port
const DEFAULT_HTTP_PORT: u16 = 8081;
/// Default database location
const DEFAULT_DATABASE_URL: &str = "sqlite:./data/portal.db";

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Testing => "testing",
        })
    }
}

/// Database location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// File path
        path: PathBuf,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string
    ///
    /// # Errors
    ///
    /// Returns an error for non-SQLite URLs
    pub fn parse_url(s: &str) -> Result<Self> {
        if let Some(path_str) = s.strip_prefix("sqlite:") {
            let path_str = path_str.trim_start_matches("//");
            if path_str == ":memory:" {
                Ok(Self::Memory)
            } else {
                Ok(Self::SQLite {
                    path: PathBuf::from(path_str),
                })
            }
        } else if s.contains("://") {
            bail!("Unsupported database URL scheme: {s}")
        } else {
            Ok(Self::SQLite {
                path: PathBuf::from(s),
            })
        }
    }

    /// Connection string understood by sqlx
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".into(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database location
    pub url: DatabaseUrl,
}

/// Token and password configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    /// Access token validity window
    pub token_expiry: Duration,
    /// bcrypt cost for new password hashes
    pub bcrypt_cost: u32,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_expiry", &self.token_expiry)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

/// Download link configuration
#[derive(Clone)]
pub struct DownloadConfig {
    /// Object-store base URL; downloads are unavailable when unset
    pub base_url: Option<String>,
    /// HMAC key for link signatures
    pub signing_secret: String,
    /// Link lifetime in seconds
    pub link_ttl_secs: u64,
}

impl fmt::Debug for DownloadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadConfig")
            .field("base_url", &self.base_url)
            .field("signing_secret", &"[REDACTED]")
            .field("link_ttl_secs", &self.link_ttl_secs)
            .finish()
    }
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Comma-separated origins, or `*`
    pub allowed_origins: String,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen port
    pub http_port: u16,
    /// Bind address
    pub host: String,
    /// Deployment environment
    pub environment: Environment,
    /// Database settings
    pub database: DatabaseConfig,
    /// Token and password settings
    pub auth: AuthConfig,
    /// Download link settings
    pub downloads: DownloadConfig,
    /// CORS settings
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Load configuration from process environment variables
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is present but invalid, or when
    /// `JWT_SECRET` is missing in production
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .map(|v| Environment::from_str_or_default(&v))
            .unwrap_or_default();

        let http_port = var("HTTP_PORT")
            .map(|v| v.parse::<u16>().context("HTTP_PORT must be a valid port"))
            .transpose()?
            .unwrap_or(DEFAULT_HTTP_PORT);

        let url = DatabaseUrl::parse_url(
            &var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
        )
        .context("Invalid DATABASE_URL")?;

        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None if environment.is_production() => {
                bail!("JWT_SECRET must be set in production")
            }
            None => {
                warn!("JWT_SECRET not set, using an ephemeral secret; tokens will not survive a restart");
                generate_jwt_secret()?
            }
        };

        let token_expiry = var("JWT_EXPIRES_IN")
            .map(|v| parse_duration(&v).context("Invalid JWT_EXPIRES_IN"))
            .transpose()?
            .unwrap_or_else(|| Duration::days(TOKEN_EXPIRY_DAYS));

        let bcrypt_cost = var("BCRYPT_COST")
            .map(|v| parse_bcrypt_cost(&v))
            .transpose()?
            .unwrap_or(bcrypt::DEFAULT_COST);

        let link_ttl_secs = var("DOWNLOAD_LINK_TTL_SECS")
            .map(|v| {
                v.parse::<u64>()
                    .context("DOWNLOAD_LINK_TTL_SECS must be a positive integer")
            })
            .transpose()?
            .unwrap_or(DOWNLOAD_LINK_TTL_SECS);

        Ok(Self {
            http_port,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            environment,
            database: DatabaseConfig { url },
            downloads: DownloadConfig {
                base_url: var("DOWNLOAD_BASE_URL"),
                signing_secret: var("DOWNLOAD_SIGNING_SECRET")
                    .unwrap_or_else(|| jwt_secret.clone()),
                link_ttl_secs,
            },
            auth: AuthConfig {
                jwt_secret,
                token_expiry,
                bcrypt_cost,
            },
            cors: CorsConfig {
                allowed_origins: var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| "*".into()),
            },
        })
    }

    /// One-line-per-setting summary without secrets
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Portal Server Configuration:\n\
             - Environment: {}\n\
             - Listen: {}:{}\n\
             - Database: {}\n\
             - Token Expiry: {} hours\n\
             - bcrypt Cost: {}\n\
             - Downloads: {}\n\
             - CORS Origins: {}",
            self.environment,
            self.host,
            self.http_port,
            self.database.url.to_connection_string(),
            self.auth.token_expiry.num_hours(),
            self.auth.bcrypt_cost,
            self.downloads
                .base_url
                .as_deref()
                .unwrap_or("disabled"),
            self.cors.allowed_origins,
        )
    }
}

/// Parse a duration such as `30d`, `12h`, `15m`, `90s` or a bare number of seconds
///
/// # Errors
///
/// Returns an error for an unknown unit, a non-numeric amount or a zero duration
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (amount, unit) = raw.split_at(split);
    let amount: i64 = amount
        .parse()
        .with_context(|| format!("'{raw}' does not start with a number"))?;

    if amount <= 0 {
        bail!("Duration must be positive");
    }

    match unit.trim() {
        "d" => Ok(Duration::days(amount)),
        "h" => Ok(Duration::hours(amount)),
        "m" => Ok(Duration::minutes(amount)),
        "s" | "" => Ok(Duration::seconds(amount)),
        other => bail!("Unknown duration unit '{other}'"),
    }
}

fn parse_bcrypt_cost(raw: &str) -> Result<u32> {
    let cost: u32 = raw.parse().context("BCRYPT_COST must be an integer")?;
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        bail!("BCRYPT_COST must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}");
    }
    Ok(cost)
}
