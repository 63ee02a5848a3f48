//! API client for communicating with the Modcandy REST API.
//!
//! This module provides the `ApiClient` struct for the credential exchange
//! and for authenticated requests that fetch incidents, messages, player
//! statistics and account settings.

use std::time::Duration;

use reqwest::{header, Client, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::auth::{AuthError, Credentials};
use crate::config::{Config, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::models::{AuthResponse, CreatedApiKey, IncidentFilter, Page, RegisterResponse};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path of the account API (login, registration, keys, credit) under the base URL
const ACCOUNT_PATH: &str = "/account/api";

/// Path of the analyzer API (incidents, messages, stats) under the base URL
const ANALYZER_PATH: &str = "/api/analyzer";

/// Scheme word the backend expects in the Authorization header
const AUTH_SCHEME: &str = "token";

/// Maximum number of retries for rate-limited (429) requests.
/// Applies to data requests only; login and registration are sent once.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Endpoint URLs derived from a base URL.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: String,
    account: String,
    analyzer: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            base: base.to_string(),
            account: format!("{}{}", base, ACCOUNT_PATH),
            analyzer: format!("{}{}", base, ANALYZER_PATH),
        }
    }

    pub fn login(&self) -> String {
        format!("{}/auth/login", self.account)
    }

    pub fn register(&self) -> String {
        format!("{}/auth/register", self.account)
    }

    pub fn api_key(&self) -> String {
        format!("{}/key", self.account)
    }

    pub fn credit(&self) -> String {
        format!("{}/credit", self.account)
    }

    pub fn incidents(&self) -> String {
        format!("{}/list/incidents", self.analyzer)
    }

    pub fn recent_messages(&self) -> String {
        format!("{}/messages/recent", self.analyzer)
    }

    pub fn session_messages(&self, session_id: &str) -> String {
        format!("{}/messages/session/{}", self.analyzer, session_id)
    }

    pub fn player_stats(&self) -> String {
        format!("{}/stats/players", self.analyzer)
    }

    pub fn player_incidents(&self, player_id: &str) -> String {
        format!("{}/stats/players/{}/incidents", self.analyzer, player_id)
    }

    /// Resolve a pagination link returned by the server. Relative links are
    /// joined onto the base URL; absolute links must share its origin so the
    /// token is never sent to another host.
    pub fn resolve_link(&self, link: &str) -> Result<String, ApiError> {
        let base = Url::parse(&format!("{}/", self.base))
            .map_err(|e| ApiError::InvalidResponse(format!("Invalid base URL {}: {}", self.base, e)))?;
        let url = base
            .join(link)
            .map_err(|e| ApiError::InvalidResponse(format!("Invalid page link {}: {}", link, e)))?;

        if url.origin() != base.origin() {
            return Err(ApiError::InvalidResponse(format!(
                "Page link {} points outside {}",
                link, self.base
            )));
        }
        Ok(url.into())
    }
}

/// API client for Modcandy.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoints: Endpoints,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client against `base_url` with the default timeout
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoints: Endpoints::new(base_url),
            token: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::with_timeout(
            &config.api_base_url(),
            Duration::from_secs(config.request_timeout_secs()),
        )
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Set the token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            endpoints: self.endpoints.clone(),
            token: Some(token),
        }
    }

    // ===== Credential Exchange =====

    /// Exchange credentials for a session token. Sent exactly once.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, AuthError> {
        let body = json!({
            "username": credentials.identifier,
            "password": credentials.secret,
        });

        let response = self.send_exchange(&self.endpoints.login(), &body).await?;
        if !response.status().is_success() {
            debug!(status = %response.status(), "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("Failed to parse login response: {}", e)))
    }

    /// Create an account and receive its first session token. Sent exactly once.
    pub async fn register(&self, credentials: &Credentials) -> Result<RegisterResponse, AuthError> {
        let body = json!({
            "email": credentials.identifier,
            "password": credentials.secret,
        });

        let response = self.send_exchange(&self.endpoints.register(), &body).await?;
        if !response.status().is_success() {
            debug!(status = %response.status(), "Registration rejected");
            return Err(AuthError::RegistrationFailed);
        }

        response.json().await.map_err(|e| {
            AuthError::InvalidResponse(format!("Failed to parse registration response: {}", e))
        })
    }

    async fn send_exchange(&self, url: &str, body: &Value) -> Result<Response, AuthError> {
        debug!(url = url, "Sending credential exchange");
        Ok(self.client.post(url).json(body).send().await?)
    }

    // ===== Request Plumbing =====

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::NotAuthenticated)?;
        let mut headers = header::HeaderMap::new();
        let value = header::HeaderValue::from_str(&format!("{} {}", AUTH_SCHEME, token))
            .map_err(|_| ApiError::InvalidResponse("Token is not a valid header value".to_string()))?;
        headers.insert(header::AUTHORIZATION, value);
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            Err(Self::error_from(response).await)
        }
    }

    async fn error_from(response: Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        ApiError::from_status(status, &body)
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    async fn get<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        url: &str,
        query: &Q,
    ) -> Result<T, ApiError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            debug!(url = url, "GET");
            let response = self
                .client
                .get(url)
                .headers(self.auth_headers()?)
                .query(query)
                .send()
                .await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Self::parse_json(response, url).await,
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    // ===== Analyzer =====

    /// Fetch one page of incidents matching `filter`
    pub async fn fetch_incidents(&self, filter: &IncidentFilter) -> Result<Page<Value>, ApiError> {
        self.get(&self.endpoints.incidents(), &filter.query_pairs()).await
    }

    /// Follow a `next`/`previous` link from an earlier page
    pub async fn fetch_incidents_page(&self, link: &str) -> Result<Page<Value>, ApiError> {
        let url = self.endpoints.resolve_link(link)?;
        self.get(&url, &[] as &[(&str, &str)]).await
    }

    pub async fn fetch_recent_messages(&self) -> Result<Value, ApiError> {
        self.get(&self.endpoints.recent_messages(), &[] as &[(&str, &str)]).await
    }

    pub async fn fetch_session_messages(&self, session_id: &str) -> Result<Value, ApiError> {
        self.get(&self.endpoints.session_messages(session_id), &[] as &[(&str, &str)])
            .await
    }

    pub async fn fetch_player_stats(&self) -> Result<Value, ApiError> {
        self.get(&self.endpoints.player_stats(), &[] as &[(&str, &str)]).await
    }

    pub async fn fetch_player_incidents(&self, player_id: &str) -> Result<Value, ApiError> {
        self.get(&self.endpoints.player_incidents(player_id), &[] as &[(&str, &str)])
            .await
    }

    // ===== Account Settings =====

    pub async fn fetch_credit(&self) -> Result<Value, ApiError> {
        self.get(&self.endpoints.credit(), &[] as &[(&str, &str)]).await
    }

    /// Current API key details, or `None` when no key has been created
    pub async fn fetch_api_key(&self) -> Result<Option<Value>, ApiError> {
        match self.get(&self.endpoints.api_key(), &[] as &[(&str, &str)]).await {
            Ok(key) => Ok(Some(key)),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create_api_key(&self, name: &str) -> Result<CreatedApiKey, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidResponse("API key name must not be empty".to_string()));
        }
        let url = self.endpoints.api_key();
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(&json!({ "keyname": name }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Self::parse_json(response, &url).await
    }

    pub async fn delete_api_key(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.endpoints.api_key())
            .headers(self.auth_headers()?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_from_base() {
        let endpoints = Endpoints::new("https://api.example.com/");
        assert_eq!(endpoints.login(), "https://api.example.com/account/api/auth/login");
        assert_eq!(endpoints.register(), "https://api.example.com/account/api/auth/register");
        assert_eq!(endpoints.api_key(), "https://api.example.com/account/api/key");
        assert_eq!(endpoints.credit(), "https://api.example.com/account/api/credit");
        assert_eq!(
            endpoints.incidents(),
            "https://api.example.com/api/analyzer/list/incidents"
        );
        assert_eq!(
            endpoints.session_messages("s1"),
            "https://api.example.com/api/analyzer/messages/session/s1"
        );
        assert_eq!(
            endpoints.player_incidents("p9"),
            "https://api.example.com/api/analyzer/stats/players/p9/incidents"
        );
    }

    #[test]
    fn test_resolve_link_same_origin() {
        let endpoints = Endpoints::new("https://api.example.com");
        assert_eq!(
            endpoints
                .resolve_link("https://api.example.com/api/analyzer/list/incidents?page=2")
                .unwrap(),
            "https://api.example.com/api/analyzer/list/incidents?page=2"
        );
        assert_eq!(
            endpoints.resolve_link("/api/analyzer/list/incidents?page=3").unwrap(),
            "https://api.example.com/api/analyzer/list/incidents?page=3"
        );
    }

    #[test]
    fn test_resolve_link_rejects_other_origins() {
        let endpoints = Endpoints::new("https://api.example.com");
        for link in [
            "https://evil.example.net/api/analyzer/list/incidents?page=2",
            "http://api.example.com/api/analyzer/list/incidents?page=2",
            "https://api.example.com:8443/api/analyzer/list/incidents",
            "//evil.example.net/steal",
        ] {
            assert!(
                matches!(endpoints.resolve_link(link), Err(ApiError::InvalidResponse(_))),
                "accepted {link}"
            );
        }
    }

    #[test]
    fn test_auth_headers_require_token() {
        let client = ApiClient::new("http://localhost").unwrap();
        assert!(matches!(client.auth_headers(), Err(ApiError::NotAuthenticated)));
    }

    #[test]
    fn test_auth_headers_use_token_scheme() {
        let client = ApiClient::new("http://localhost")
            .unwrap()
            .with_token("abc123".to_string());
        let headers = client.auth_headers().unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "token abc123");
    }

    #[test]
    fn test_auth_headers_reject_unprintable_token() {
        let client = ApiClient::new("http://localhost")
            .unwrap()
            .with_token("bad\ntoken".to_string());
        assert!(matches!(client.auth_headers(), Err(ApiError::InvalidResponse(_))));
    }
}
