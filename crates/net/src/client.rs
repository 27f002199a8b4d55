//! HTTP client construction

use otaup_errors::{ConfigError, Error, NetworkError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Sent only when `headers` does not already carry a User-Agent
    pub user_agent: String,
    pub headers: HashMap<String, String>,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(30),
            user_agent: format!("otaup/{}", env!("CARGO_PKG_VERSION")),
            headers: HashMap::new(),
        }
    }
}

/// HTTP client wrapper
#[derive(Clone)]
pub struct NetClient {
    client: Client,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if a configured header is not a valid HTTP header or
    /// the underlying reqwest client fails to initialize.
    pub fn new(config: &NetConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name: HeaderName = name.parse().map_err(|_| ConfigError::Invalid {
                message: format!("invalid HTTP header name: {name}"),
            })?;
            let value: HeaderValue = value.parse().map_err(|_| ConfigError::Invalid {
                message: format!("invalid HTTP header value for {name}"),
            })?;
            headers.insert(name, value);
        }
        if !headers.contains_key(USER_AGENT) {
            let value: HeaderValue =
                config.user_agent.parse().map_err(|_| ConfigError::Invalid {
                    message: format!("invalid user agent: {}", config.user_agent),
                })?;
            headers.insert(USER_AGENT, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;

        Ok(Self { client })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default
    /// settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(&NetConfig::default())
    }

    /// Execute a single GET request
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or times out. A non-2xx
    /// status is not an error here; callers decide how to treat it.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout {
                    url: url.to_string(),
                }
                .into()
            } else if e.is_builder() {
                NetworkError::InvalidUrl(url.to_string()).into()
            } else {
                NetworkError::DownloadFailed(e.to_string()).into()
            }
        })
    }
}
