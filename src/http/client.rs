//! Authenticated HTTP client for the Recharge API
//!
//! Handles:
//! - Access-token and API-version headers on every call
//! - One-time token verification, cached for the client's lifetime
//! - Automatic retries with exponential backoff
//! - Client-side rate limiting and the 429 leaky-bucket penalty
//! - Translation of error responses into the typed taxonomy

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::types::BackoffType;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Production API host
pub const BASE_URL: &str = "https://api.rechargeapps.com";

/// API revision sent on every call unless a stream pins an older one
pub const API_VERSION: &str = "2021-11";

/// Pinned revision for the legacy `products` endpoint
pub const LEGACY_API_VERSION: &str = "2021-01";

/// Extra re-issues of an identical call whose 200 body failed to parse
pub const MAX_PARSE_RETRIES: u32 = 2;

const ACCESS_TOKEN_HEADER: &str = "X-Recharge-Access-Token";
const API_VERSION_HEADER: &str = "X-Recharge-Version";

/// Substring of a 401 message that indicates a dead or revoked token
const AUTH_FAILURE_MARKER: &str = "authentication";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: String,
    /// Access token attached to every call
    pub access_token: String,
    /// Optional user agent string
    pub user_agent: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Fixed extra sleep applied to every 429 before the backoff delay
    pub rate_limit_penalty: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            access_token: String::new(),
            user_agent: None,
            timeout: Duration::from_secs(600),
            // 4 retries after the first attempt: 5 attempts total
            max_retries: 4,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            rate_limit: Some(RateLimiterConfig::default()),
            rate_limit_penalty: Duration::from_secs(5),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the access token
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.access_token = token.into();
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(agent.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Set the fixed 429 penalty sleep
    pub fn rate_limit_penalty(mut self, penalty: Duration) -> Self {
        self.config.rate_limit_penalty = penalty;
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// API version override (e.g. the legacy products pin)
    pub api_version: Option<String>,
    /// Request body (JSON)
    pub body: Option<Value>,
    /// Logical endpoint name for call metrics
    pub endpoint: Option<String>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add several query parameters
    #[must_use]
    pub fn queries(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(params);
        self
    }

    /// Override the API version header
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the logical endpoint name for metrics
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// Authenticated Recharge API client with retry and rate limiting
pub struct RechargeClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
    verified: AtomicBool,
}

impl RechargeClient {
    /// Create a new client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to build HTTP client");

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Self {
            client,
            config,
            rate_limiter,
            verified: AtomicBool::new(false),
        }
    }

    /// Create a client from tap configuration
    pub fn from_config(config: &TapConfig) -> Self {
        let mut builder = HttpClientConfig::builder()
            .access_token(&config.access_token)
            .timeout(config.request_timeout());
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent);
        }
        Self::with_config(builder.build())
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Make a GET request
    pub async fn get(&self, path: &str, config: RequestConfig) -> Result<Value> {
        self.request(Method::GET, path, config).await
    }

    /// Make a POST request
    pub async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.request(Method::POST, path, RequestConfig::new().json(body))
            .await
    }

    /// Make a generic request, verifying the access token first if that has
    /// not already succeeded for this client.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        config: RequestConfig,
    ) -> Result<Value> {
        self.ensure_verified().await?;
        self.execute(method, path, &config).await
    }

    /// Verify the access token against the API root.
    ///
    /// The root endpoint returns a single record carrying the organization
    /// URN, which makes it a cheap credentials probe.
    pub async fn check_access_token(&self) -> Result<()> {
        if self.config.access_token.is_empty() {
            return Err(Error::missing_field("access_token"));
        }
        self.execute(
            Method::GET,
            "",
            &RequestConfig::new().endpoint("verify_token"),
        )
        .await
        .map(|_| ())
    }

    async fn ensure_verified(&self) -> Result<()> {
        if self.verified.load(Ordering::Acquire) {
            return Ok(());
        }
        self.check_access_token().await?;
        self.verified.store(true, Ordering::Release);
        Ok(())
    }

    /// The retry loop shared by real requests and token verification
    async fn execute(&self, method: Method, path: &str, config: &RequestConfig) -> Result<Value> {
        let url = self.build_url(path);
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| path.to_string());
        let max_retries = self.config.max_retries;

        let mut attempt: u32 = 0;
        let mut parse_retries: u32 = 0;

        loop {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let mut req = self
                .client
                .request(method.clone(), &url)
                .timeout(self.config.timeout)
                .header(ACCESS_TOKEN_HEADER, &self.config.access_token)
                .header(ACCEPT, "application/json")
                .header(
                    API_VERSION_HEADER,
                    config.api_version.as_deref().unwrap_or(API_VERSION),
                );

            if let Some(agent) = &self.config.user_agent {
                req = req.header(USER_AGENT, agent);
            }
            if !config.query.is_empty() {
                req = req.query(&config.query);
            }
            if let Some(body) = &config.body {
                req = req.json(body);
            }

            let started = Instant::now();
            match req.send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!(
                        endpoint = %endpoint,
                        status = status.as_u16(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "http_request"
                    );

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let body = read_json_body(response).await;
                        // Leaky bucket: drain before the backoff schedule resumes
                        tokio::time::sleep(self.config.rate_limit_penalty).await;
                        if attempt < max_retries {
                            let delay = self.calculate_backoff(attempt);
                            warn!(
                                "Rate limited (429), attempt {}/{}, retrying in {:?}",
                                attempt + 1,
                                max_retries + 1,
                                delay
                            );
                            tokio::time::sleep(delay).await;
                            attempt += 1;
                            continue;
                        }
                        return Err(self.translate_error(429, body.as_ref()));
                    }

                    if status.is_server_error() {
                        let body = read_json_body(response).await;
                        if attempt < max_retries {
                            let delay = self.calculate_backoff(attempt);
                            warn!(
                                "Request failed with {}, attempt {}/{}, retrying in {:?}",
                                status.as_u16(),
                                attempt + 1,
                                max_retries + 1,
                                delay
                            );
                            tokio::time::sleep(delay).await;
                            attempt += 1;
                            continue;
                        }
                        return Err(self.translate_error(status.as_u16(), body.as_ref()));
                    }

                    if !status.is_success() {
                        let body = read_json_body(response).await;
                        return Err(self.translate_error(status.as_u16(), body.as_ref()));
                    }

                    let text = response.text().await.map_err(Error::Http)?;
                    match serde_json::from_str::<Value>(&text) {
                        Ok(value) => return Ok(value),
                        Err(e) if parse_retries < MAX_PARSE_RETRIES => {
                            parse_retries += 1;
                            warn!(
                                endpoint = %endpoint,
                                "Response body was not valid JSON ({e}), re-issuing call \
                                 ({parse_retries}/{MAX_PARSE_RETRIES})"
                            );
                            continue;
                        }
                        Err(e) => {
                            return Err(Error::decode(format!(
                                "Response from '{endpoint}' was not valid JSON: {e}"
                            )));
                        }
                    }
                }
                Err(e) if e.is_timeout() => {
                    if attempt < max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "Request timeout, attempt {}/{}, retrying in {:?}",
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(Error::Timeout {
                        timeout_ms: self.config.timeout.as_millis() as u64,
                    });
                }
                Err(e) if e.is_connect() => {
                    if attempt < max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "Connection error, attempt {}/{}, retrying in {:?}",
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(Error::Http(e));
                }
                Err(e) => return Err(Error::Http(e)),
            }
        }
    }

    /// Map an error response to the typed taxonomy, surfacing the
    /// re-authentication notice for dead tokens.
    fn translate_error(&self, status: u16, body: Option<&Value>) -> Error {
        let err = Error::api(status, body);
        if status == 401 {
            if let Error::Api { message, .. } = &err {
                if message.to_lowercase().contains(AUTH_FAILURE_MARKER) {
                    error!(
                        "Your API Token has been deleted or the token is invalid.\n Please \
                         re-authenticate your connection to generate a new token and resume \
                         extraction."
                    );
                }
            }
        }
        err
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.config.backoff_type {
            BackoffType::Constant => self.config.initial_backoff,
            BackoffType::Linear => self.config.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.config.initial_backoff * factor
            }
        };

        std::cmp::min(delay, self.config.max_backoff)
    }
}

impl std::fmt::Debug for RechargeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RechargeClient")
            .field("base_url", &self.config.base_url)
            .field("verified", &self.verified.load(Ordering::Relaxed))
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Read the response body as JSON, if there is one
async fn read_json_body(response: reqwest::Response) -> Option<Value> {
    response.json().await.ok()
}
