//! HTTP client with connection pooling and retry logic

use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use wheelhouse_errors::{Error, NetworkError};

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    /// Extra attempts after a connection failure or timeout
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 4,
            retry_count: 2,
            retry_delay: Duration::from_millis(500),
            user_agent: format!("wheelhouse/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl NetConfig {
    /// Build from the `[network]` section of the configuration file
    #[must_use]
    pub fn from_settings(settings: &wheelhouse_config::NetworkConfig) -> Self {
        Self {
            timeout: Duration::from_secs(settings.timeout),
            connect_timeout: Duration::from_secs(settings.connect_timeout),
            ..Self::default()
        }
    }
}

/// HTTP client wrapper with retry logic
#[derive(Debug, Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// GET with HTTP basic authentication and retries
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retry attempts. The
    /// response status is not checked.
    pub async fn get_with_basic_auth(
        &self,
        url: &str,
        username: &str,
        password: &str,
    ) -> Result<Response, Error> {
        self.retry_request(|| self.client.get(url).basic_auth(username, Some(password)))
            .await
    }

    /// Send a request, rebuilding it for each attempt
    async fn retry_request<F>(&self, build: F) -> Result<Response, Error>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.retry_count {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_delay * attempt).await;
            }

            match build().send().await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    let retry = Self::should_retry(&e);
                    tracing::debug!(attempt, error = %e, retry, "request failed");
                    last_error = Some(e);
                    if !retry {
                        break;
                    }
                }
            }
        }

        Err(match last_error {
            Some(e) if e.is_timeout() => NetworkError::Timeout {
                url: e
                    .url()
                    .map(std::string::ToString::to_string)
                    .unwrap_or_default(),
            }
            .into(),
            Some(e) if e.is_connect() => NetworkError::ConnectionRefused(e.to_string()).into(),
            Some(e) => NetworkError::RequestFailed(e.to_string()).into(),
            None => NetworkError::RequestFailed("no attempt was made".to_string()).into(),
        })
    }

    /// Retry on timeouts and connection errors only
    fn should_retry(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect()
    }

    /// Get the underlying reqwest client for advanced usage
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings() {
        let settings = wheelhouse_config::NetworkConfig {
            timeout: 5,
            connect_timeout: 2,
        };
        let config = NetConfig::from_settings(&settings);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert!(config.user_agent.starts_with("wheelhouse/"));
    }
}
