//! Authorized HTTP client shared by the Drive, Sheets and YouTube clients.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::debug;

use crate::auth::CredentialProvider;
use crate::error::{GoogleError, GoogleResult};
use crate::token_cache::TokenCache;

/// HTTP client bound to one Google account.
#[derive(Clone)]
pub struct GoogleApiClient {
    http: Client,
    token_cache: Arc<TokenCache>,
}

impl GoogleApiClient {
    /// Create a client for the account behind `provider`.
    ///
    /// No overall request timeout is set: video transfers can run for many
    /// minutes. Connection setup is still bounded.
    pub fn new(provider: Arc<dyn CredentialProvider>, scopes: &[&str]) -> GoogleResult<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("vpub-google/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GoogleError::Network)?;

        Ok(Self {
            http,
            token_cache: Arc::new(TokenCache::new(provider, scopes)),
        })
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Current access token.
    pub async fn token(&self) -> GoogleResult<String> {
        self.token_cache.get_token().await
    }

    /// Send a rebuildable request with a bearer token.
    ///
    /// A 401 invalidates the cached token and the request is sent once more.
    /// Non-success statuses are turned into errors.
    pub async fn send<F>(&self, operation: &str, build: F) -> GoogleResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let token = self.token().await?;
        let mut response = build(&self.http).bearer_auth(&token).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(operation = %operation, "Access token rejected, refreshing");
            self.token_cache.invalidate().await;
            let token = self.token().await?;
            response = build(&self.http).bearer_auth(&token).send().await?;
        }

        check_status(operation, response).await
    }
}

/// Pass through successful responses, convert the rest into errors.
pub async fn check_status(operation: &str, response: Response) -> GoogleResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after_ms = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|secs| secs * 1000);

    let body = response.text().await.unwrap_or_default();
    Err(
        GoogleError::from_http_status(status.as_u16(), format!("{} failed: {}", operation, body))
            .with_retry_after(retry_after_ms),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticCredentials;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_attaches_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .mount(&server)
            .await;

        let client = GoogleApiClient::new(Arc::new(StaticCredentials("test-token")), &["scope"]).unwrap();
        let url = format!("{}/ping", server.uri());
        let response = client.send("ping", |http| http.get(&url)).await.unwrap();
        assert_eq!(response.text().await.unwrap(), "pong");
    }

    #[tokio::test]
    async fn test_rate_limit_carries_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let client = GoogleApiClient::new(Arc::new(StaticCredentials("t")), &["scope"]).unwrap();
        let url = server.uri();
        let err = client.send("list", |http| http.get(&url)).await.unwrap_err();
        assert_eq!(err.retry_after_ms(), Some(7000));
    }

    #[tokio::test]
    async fn test_unauthorized_is_resent_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let client = GoogleApiClient::new(Arc::new(StaticCredentials("t")), &["scope"]).unwrap();
        let url = server.uri();
        let err = client.send("get", |http| http.get(&url)).await.unwrap_err();
        assert!(matches!(err, GoogleError::AuthError(_)));
    }
}
