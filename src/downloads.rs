// ABOUTME: Time-limited download links for installer files
// ABOUTME: Issuer trait plus an HMAC-SHA256 signed URL implementation over a storage base URL
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

//! # Download Links
//!
//! Installer files live in object storage under `software/<file name>`. The
//! portal never streams them itself; it hands out a link that expires after
//! the configured lifetime. [`SignedUrlIssuer`] produces
//! `<base>/<key>?expires=<unix>&signature=<hex>` where the signature is an
//! HMAC-SHA256 over `"<key>\n<expires>"`.

use crate::config::DownloadConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use portal_core::{
    constants::defaults::SOFTWARE_KEY_PREFIX,
    errors::{AppError, AppResult},
};
use ring::hmac;
use url::Url;

/// A link handed to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    /// Absolute URL
    pub url: String,
    /// Seconds until the link stops working
    pub expires_in: u64,
}

/// Issues time-limited links for storage keys
#[async_trait]
pub trait DownloadLinkIssuer: Send + Sync {
    /// Issue a link for `key` valid from `now`
    async fn issue(&self, key: &str, now: DateTime<Utc>) -> AppResult<DownloadLink>;
}

/// Storage key for an installer file name
///
/// # Errors
///
/// Returns an invalid-input error for empty names or names that escape the
/// software prefix
pub fn software_key(file_name: &str) -> AppResult<String> {
    let file_name = file_name.trim();
    if file_name.is_empty() {
        return Err(AppError::missing_field("fileName"));
    }
    if file_name.contains(['/', '\\']) || file_name == "." || file_name == ".." {
        return Err(AppError::invalid_input("Invalid file name"));
    }
    Ok(format!("{SOFTWARE_KEY_PREFIX}/{file_name}"))
}

/// Issues HMAC-signed links against a base URL
pub struct SignedUrlIssuer {
    base_url: Url,
    key: hmac::Key,
    ttl_secs: u64,
}

impl SignedUrlIssuer {
    /// Create an issuer
    ///
    /// # Errors
    ///
    /// Returns a config error if the base URL does not parse or cannot carry a path
    pub fn new(base_url: &str, signing_secret: &[u8], ttl_secs: u64) -> AppResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::config(format!("Invalid DOWNLOAD_BASE_URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::config("DOWNLOAD_BASE_URL cannot carry a path"));
        }
        Ok(Self {
            base_url,
            key: hmac::Key::new(hmac::HMAC_SHA256, signing_secret),
            ttl_secs,
        })
    }

    /// Build an issuer from configuration; `None` when no base URL is set
    ///
    /// # Errors
    ///
    /// Returns a config error if the base URL is invalid
    pub fn from_config(config: &DownloadConfig) -> AppResult<Option<Self>> {
        config
            .base_url
            .as_deref()
            .map(|base| Self::new(base, config.signing_secret.as_bytes(), config.link_ttl_secs))
            .transpose()
    }

    /// Check a signature produced by this issuer
    #[must_use]
    pub fn verify(&self, key: &str, expires: i64, signature: &str, now: DateTime<Utc>) -> bool {
        if now.timestamp() > expires {
            return false;
        }
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };
        hmac::verify(&self.key, signing_input(key, expires).as_bytes(), &signature).is_ok()
    }

    fn sign(&self, key: &str, expires: i64) -> String {
        let tag = hmac::sign(&self.key, signing_input(key, expires).as_bytes());
        hex::encode(tag.as_ref())
    }
}

#[async_trait]
impl DownloadLinkIssuer for SignedUrlIssuer {
    async fn issue(&self, key: &str, now: DateTime<Utc>) -> AppResult<DownloadLink> {
        let ttl = i64::try_from(self.ttl_secs)
            .map_err(|_| AppError::config("DOWNLOAD_LINK_TTL_SECS is too large"))?;
        let expires = now.timestamp().saturating_add(ttl);

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AppError::config("DOWNLOAD_BASE_URL cannot carry a path"))?
            .pop_if_empty()
            .extend(key.split('/'));
        url.query_pairs_mut()
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &self.sign(key, expires));

        Ok(DownloadLink {
            url: url.into(),
            expires_in: self.ttl_secs,
        })
    }
}

fn signing_input(key: &str, expires: i64) -> String {
    format!("{key}\n{expires}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> SignedUrlIssuer {
        SignedUrlIssuer::new("https://files.example.com/portal/", b"test-secret", 3600).unwrap()
    }

    #[test]
    fn test_software_key() {
        assert_eq!(
            software_key("AuraSetup-x64-2.1.0.exe").unwrap(),
            "software/AuraSetup-x64-2.1.0.exe"
        );
        assert!(software_key("../etc/passwd").is_err());
        assert!(software_key("  ").is_err());
    }

    #[tokio::test]
    async fn test_issued_link_shape() {
        let now = Utc::now();
        let link = issuer()
            .issue("software/AuraSetup.exe", now)
            .await
            .unwrap();

        assert_eq!(link.expires_in, 3600);
        let url = Url::parse(&link.url).unwrap();
        assert_eq!(url.path(), "/portal/software/AuraSetup.exe");

        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["expires"], (now.timestamp() + 3600).to_string());
        assert_eq!(pairs["signature"].len(), 64);
    }

    #[tokio::test]
    async fn test_signature_verifies_until_expiry() {
        let issuer = issuer();
        let now = Utc::now();
        let link = issuer.issue("software/AuraSetup.exe", now).await.unwrap();
        let url = Url::parse(&link.url).unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        let expires: i64 = pairs["expires"].parse().unwrap();

        assert!(issuer.verify("software/AuraSetup.exe", expires, &pairs["signature"], now));
        assert!(!issuer.verify("software/Other.exe", expires, &pairs["signature"], now));
        assert!(!issuer.verify(
            "software/AuraSetup.exe",
            expires,
            &pairs["signature"],
            now + chrono::Duration::seconds(3601)
        ));
    }

    #[test]
    fn test_from_config_without_base_url() {
        let config = DownloadConfig {
            base_url: None,
            signing_secret: "s".into(),
            link_ttl_secs: 60,
        };
        assert!(SignedUrlIssuer::from_config(&config).unwrap().is_none());
    }
}
