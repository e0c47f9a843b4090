//! Token validation cache with moka
//!
//! Scrapers repeat the same token every few seconds, so decisions are cached
//! for the configured TTL.
//!
//! - **Cached**: valid tokens and tokens Keystone rejected
//! - **Never cached**: `Unavailable`, so an outage does not outlive itself
//!
//! An accepted token stays accepted for the whole TTL, whatever its
//! `expires_at`. Revocation or expiry inside that window is noticed on the
//! first scrape after the entry lapses, so `cache_ttl_secs` bounds how long
//! a dead token can keep scraping.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use virtstat_domain::{AuthenticationConfig, KeystoneConfig, Result};

use super::{AuthError, KeystoneClient, TokenValidator};

/// Max number of distinct tokens remembered at once
const MAX_CACHED_TOKENS: u64 = 10_000;

/// Keystone-backed [`TokenValidator`].
pub struct KeystoneValidator {
    client: KeystoneClient,
    decisions: Cache<String, bool>,
}

impl KeystoneValidator {
    pub fn new(client: KeystoneClient, ttl: Duration) -> Self {
        let decisions = Cache::builder().max_capacity(MAX_CACHED_TOKENS).time_to_live(ttl).build();
        Self { client, decisions }
    }

    /// Build the client and cache from configuration.
    ///
    /// # Errors
    /// Returns `VirtstatError::Config` if the HTTP client cannot be built.
    pub fn from_config(
        keystone: &KeystoneConfig,
        credentials: AuthenticationConfig,
    ) -> Result<Self> {
        let client = KeystoneClient::new(keystone, credentials)?;
        tracing::info!(
            auth_url = %keystone.auth_url,
            cache_ttl_secs = keystone.cache_ttl_secs,
            "Keystone token validation enabled"
        );
        Ok(Self::new(client, Duration::from_secs(keystone.cache_ttl_secs)))
    }
}

#[async_trait]
impl TokenValidator for KeystoneValidator {
    async fn validate(&self, token: &str) -> std::result::Result<(), AuthError> {
        if let Some(valid) = self.decisions.get(token).await {
            return if valid { Ok(()) } else { Err(AuthError::InvalidToken) };
        }

        match self.client.check_token(token).await {
            Ok(()) => {
                self.decisions.insert(token.to_string(), true).await;
                Ok(())
            }
            Err(AuthError::InvalidToken) => {
                self.decisions.insert(token.to_string(), false).await;
                Err(AuthError::InvalidToken)
            }
            Err(err) => Err(err),
        }
    }
}
