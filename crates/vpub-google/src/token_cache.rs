//! Token caching for Google API authentication.
//!
//! Provides an async-aware token cache with:
//! - Refresh margin to avoid token expiry during long uploads
//! - Single-flight refresh behind a write lock
//! - Fallback to the existing token when a refresh fails but it is still usable

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::auth::{AccessToken, CredentialProvider};
use crate::error::{GoogleError, GoogleResult};

/// Refresh tokens this long before they expire.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Caches one account's access token for a fixed scope set.
pub struct TokenCache {
    provider: Arc<dyn CredentialProvider>,
    scopes: Vec<String>,
    cache: RwLock<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new(provider: Arc<dyn CredentialProvider>, scopes: &[&str]) -> Self {
        Self {
            provider,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            cache: RwLock::new(None),
        }
    }

    /// Drop the cached token, forcing a refresh on next use.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_token(&self) -> GoogleResult<String> {
        let margin = ChronoDuration::seconds(TOKEN_REFRESH_MARGIN_SECS);

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_fresh(margin) {
                    return Ok(cached.token.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;

        // Another caller may have refreshed while we waited for the lock.
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(margin) {
                return Ok(cached.token.clone());
            }
        }

        let scopes: Vec<&str> = self.scopes.iter().map(String::as_str).collect();
        match self.provider.access_token(&scopes).await {
            Ok(token) => {
                debug!("Refreshed Google access token, expires at {}", token.expires_at);
                let value = token.token.clone();
                *cache = Some(token);
                Ok(value)
            }
            Err(e) => {
                if let Some(cached) = cache.as_ref() {
                    if cached.expires_at > Utc::now() {
                        warn!("Token refresh failed, using existing token: {}", e);
                        return Ok(cached.token.clone());
                    }
                }
                Err(GoogleError::auth_error(format!("Failed to obtain auth token: {}", e)))
            }
        }
    }
}
