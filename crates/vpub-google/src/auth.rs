//! Credential providers.
//!
//! Two on-disk formats are accepted:
//! - OAuth *authorized user* token files (`client_id`, `client_secret`,
//!   `refresh_token`, optionally a cached `token` + `expiry`), refreshed
//!   against the Google token endpoint
//! - Service account keys, delegated to `gcp_auth`
//!
//! Running the interactive consent flow that produces a token file is not
//! handled here.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{GoogleError, GoogleResult};

/// Scopes requested for every account: move files in Drive, upload to
/// YouTube, append to Sheets.
pub const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/youtube.upload",
    "https://www.googleapis.com/auth/spreadsheets",
];

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// A bearer token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Whether the token outlives `margin` from now.
    pub fn is_fresh(&self, margin: ChronoDuration) -> bool {
        Utc::now() + margin < self.expires_at
    }
}

/// Source of access tokens for one Google account.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self, scopes: &[&str]) -> GoogleResult<AccessToken>;
}

// =============================================================================
// Authorized user (OAuth refresh token)
// =============================================================================

#[derive(Debug, Deserialize)]
struct AuthorizedUserFile {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    expiry: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth user credentials refreshed with a long-lived refresh token.
pub struct AuthorizedUserCredentials {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    token_uri: String,
    stored: Option<AccessToken>,
    http: Client,
}

impl AuthorizedUserCredentials {
    /// Parse an authorized-user JSON document.
    pub fn from_json(raw: &str) -> GoogleResult<Self> {
        let file: AuthorizedUserFile = serde_json::from_str(raw)?;

        // A still-valid token saved by the consent flow saves one refresh.
        let stored = match (file.token, file.expiry.as_deref().and_then(parse_expiry)) {
            (Some(token), Some(expires_at)) => Some(AccessToken { token, expires_at }),
            _ => None,
        };

        Ok(Self {
            client_id: file.client_id,
            client_secret: file.client_secret,
            refresh_token: file.refresh_token,
            token_uri: file.token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            stored,
            http: Client::new(),
        })
    }

    async fn refresh(&self) -> GoogleResult<AccessToken> {
        let response = self
            .http
            .post(&self.token_uri)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<OAuthErrorResponse>(&body)
                .map(|e| match e.error_description {
                    Some(desc) => format!("{}: {}", e.error, desc),
                    None => e.error,
                })
                .unwrap_or(body);
            return Err(GoogleError::auth_error(format!(
                "token refresh returned {}: {}",
                status, detail
            )));
        }

        let refreshed: RefreshResponse = response.json().await?;
        let ttl = refreshed.expires_in.unwrap_or(3600);
        debug!("Refreshed OAuth user token, valid for {}s", ttl);

        Ok(AccessToken {
            token: refreshed.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(ttl),
        })
    }
}

#[async_trait]
impl CredentialProvider for AuthorizedUserCredentials {
    async fn access_token(&self, _scopes: &[&str]) -> GoogleResult<AccessToken> {
        if let Some(stored) = &self.stored {
            if stored.is_fresh(ChronoDuration::seconds(60)) {
                return Ok(stored.clone());
            }
        }
        self.refresh().await
    }
}

fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    // Python clients write naive UTC timestamps without an offset.
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

// =============================================================================
// Service account
// =============================================================================

/// Service account key credentials via `gcp_auth`.
pub struct ServiceAccountCredentials {
    inner: CustomServiceAccount,
}

impl ServiceAccountCredentials {
    pub fn from_json(raw: &str) -> GoogleResult<Self> {
        let inner = CustomServiceAccount::from_json(raw)
            .map_err(|e| GoogleError::auth_error(format!("Failed to load service account: {}", e)))?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl CredentialProvider for ServiceAccountCredentials {
    async fn access_token(&self, scopes: &[&str]) -> GoogleResult<AccessToken> {
        let token = self
            .inner
            .token(scopes)
            .await
            .map_err(|e| GoogleError::auth_error(format!("Failed to obtain auth token: {}", e)))?;

        Ok(AccessToken {
            token: token.as_str().to_string(),
            expires_at: token.expires_at(),
        })
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Load credentials for one account.
///
/// The token file is preferred; the credentials file is the fallback. Either
/// may hold an authorized-user token or a service account key. A bare OAuth
/// client secrets file is rejected because it needs interactive consent.
pub fn load_credentials(
    token_file: &Path,
    credentials_file: &Path,
) -> GoogleResult<Arc<dyn CredentialProvider>> {
    let path = [token_file, credentials_file]
        .into_iter()
        .find(|p| p.exists())
        .ok_or_else(|| GoogleError::MissingCredentials(credentials_file.to_path_buf()))?;

    let raw = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;

    let kind = value.get("type").and_then(|t| t.as_str());
    if kind == Some("service_account") {
        info!("Using service account credentials from {}", path.display());
        return Ok(Arc::new(ServiceAccountCredentials::from_json(&raw)?));
    }

    if value.get("refresh_token").is_some() {
        info!("Using OAuth user credentials from {}", path.display());
        return Ok(Arc::new(AuthorizedUserCredentials::from_json(&raw)?));
    }

    if value.get("installed").is_some() || value.get("web").is_some() {
        return Err(GoogleError::auth_error(format!(
            "{} is an OAuth client secrets file; complete the consent flow and provide the resulting token file",
            path.display()
        )));
    }

    Err(GoogleError::auth_error(format!(
        "{} is not a recognized credentials file",
        path.display()
    )))
}

/// Fixed-token provider for tests.
#[cfg(test)]
pub(crate) struct StaticCredentials(pub &'static str);

#[cfg(test)]
#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn access_token(&self, _scopes: &[&str]) -> GoogleResult<AccessToken> {
        Ok(AccessToken {
            token: self.0.to_string(),
            expires_at: Utc::now() + ChronoDuration::hours(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_expiry_formats() {
        assert!(parse_expiry("2030-01-01T00:00:00Z").is_some());
        assert!(parse_expiry("2030-01-01T00:00:00.123456").is_some());
        assert!(parse_expiry("not a date").is_none());
    }

    #[test]
    fn test_load_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_credentials(&dir.path().join("token.json"), &dir.path().join("credentials.json"));
        assert!(matches!(result, Err(GoogleError::MissingCredentials(_))));
    }

    #[test]
    fn test_load_rejects_client_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let creds = dir.path().join("credentials.json");
        std::fs::write(&creds, r#"{"installed":{"client_id":"x","client_secret":"y"}}"#).unwrap();

        let result = load_credentials(&dir.path().join("token.json"), &creds);
        assert!(matches!(result, Err(GoogleError::AuthError(msg)) if msg.contains("consent")));
    }

    #[tokio::test]
    async fn test_stored_token_used_while_fresh() {
        let raw = r#"{
            "client_id": "id", "client_secret": "secret", "refresh_token": "r",
            "token": "cached-token", "expiry": "2999-01-01T00:00:00Z"
        }"#;
        let creds = AuthorizedUserCredentials::from_json(raw).unwrap();
        let token = creds.access_token(GOOGLE_SCOPES).await.unwrap();
        assert_eq!(token.token, "cached-token");
    }

    #[tokio::test]
    async fn test_refresh_against_token_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh-token",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let raw = serde_json::json!({
            "client_id": "id",
            "client_secret": "secret",
            "refresh_token": "r",
            "token": "stale",
            "expiry": "2000-01-01T00:00:00Z",
            "token_uri": format!("{}/token", server.uri()),
        })
        .to_string();

        let creds = AuthorizedUserCredentials::from_json(&raw).unwrap();
        let token = creds.access_token(GOOGLE_SCOPES).await.unwrap();
        assert_eq!(token.token, "fresh-token");
        assert!(token.is_fresh(ChronoDuration::seconds(60)));
    }

    #[tokio::test]
    async fn test_refresh_error_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            })))
            .mount(&server)
            .await;

        let raw = serde_json::json!({
            "client_id": "id",
            "client_secret": "secret",
            "refresh_token": "r",
            "token_uri": format!("{}/token", server.uri()),
        })
        .to_string();

        let creds = AuthorizedUserCredentials::from_json(&raw).unwrap();
        let err = creds.access_token(GOOGLE_SCOPES).await.unwrap_err();
        assert!(matches!(err, GoogleError::AuthError(msg) if msg.contains("invalid_grant")));
    }
}
