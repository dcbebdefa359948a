//! Shared request path for every provider: lazy option parsing, rate
//! limiting, retries and status classification.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use fotd_core::{CommunicationError, FlavorError, ProviderConfig, ProviderConfigError, ProviderId};

use crate::rate_limit::RateLimiter;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Some chains serve bot walls to non-browser agents.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

pub const DEFAULT_MIN_REQUEST_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_MAX_ATTEMPTS: u64 = 3;
pub const DEFAULT_RETRY_BACKOFF_BASE_MS: u64 = 1000;
pub const DEFAULT_RATE_LIMIT_FALLBACK_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Builds the process-wide HTTP client that providers borrow.
///
/// # Errors
///
/// Returns [`reqwest::Error`] if the client cannot be constructed (e.g.,
/// invalid TLS config).
pub fn build_shared_client(
    user_agent: &str,
    timeout_secs: u64,
    connect_timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .user_agent(user_agent)
        .build()
}

/// Provider options after validation.
#[derive(Debug)]
struct SessionState {
    base_url: String,
    limiter: RateLimiter,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl SessionState {
    fn from_config(
        config: &ProviderConfig,
        default_base_url: &str,
    ) -> Result<Self, ProviderConfigError> {
        let base_url = match config.get_str("base_url")? {
            Some(url) => {
                reqwest::Url::parse(url).map_err(|e| ProviderConfigError::Invalid {
                    key: "base_url".to_string(),
                    reason: e.to_string(),
                })?;
                url.trim_end_matches('/').to_string()
            }
            None => default_base_url.to_string(),
        };

        let u64_or = |key: &str, default: u64| -> Result<u64, ProviderConfigError> {
            Ok(config.get_u64(key)?.unwrap_or(default))
        };

        let min_interval = u64_or("min_request_interval_ms", DEFAULT_MIN_REQUEST_INTERVAL_MS)?;

        let max_attempts = u64_or("max_attempts", DEFAULT_MAX_ATTEMPTS)?;
        let max_attempts = u32::try_from(max_attempts)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| ProviderConfigError::Invalid {
                key: "max_attempts".to_string(),
                reason: format!("{max_attempts} is not a valid attempt count (minimum 1)"),
            })?;

        let backoff_base = u64_or("retry_backoff_base_ms", DEFAULT_RETRY_BACKOFF_BASE_MS)?;
        let fallback = u64_or("rate_limit_fallback_secs", DEFAULT_RATE_LIMIT_FALLBACK_SECS)?;

        let timeout = u64_or("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        if timeout == 0 {
            return Err(ProviderConfigError::Invalid {
                key: "request_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            base_url,
            limiter: RateLimiter::new(Duration::from_millis(min_interval)),
            retry: RetryPolicy {
                max_attempts,
                backoff_base: Duration::from_millis(backoff_base),
                rate_limit_fallback: Duration::from_secs(fallback),
            },
            request_timeout: Duration::from_secs(timeout),
        })
    }
}

/// One provider's view of the network.
///
/// The client is borrowed from the host; the limiter and retry policy
/// belong to this session alone. Options are validated on first use, so a
/// bad option surfaces as [`FlavorError::Config`] from the first call rather
/// than at construction.
pub struct HttpSession {
    provider: ProviderId,
    client: Client,
    config: ProviderConfig,
    default_base_url: &'static str,
    user_agent: Option<&'static str>,
    state: OnceLock<Result<SessionState, ProviderConfigError>>,
}

impl HttpSession {
    #[must_use]
    pub fn new(
        provider: ProviderId,
        client: Client,
        config: ProviderConfig,
        default_base_url: &'static str,
    ) -> Self {
        Self {
            provider,
            client,
            config,
            default_base_url,
            user_agent: None,
            state: OnceLock::new(),
        }
    }

    /// Sends `agent` instead of the shared client's user agent.
    #[must_use]
    pub fn with_user_agent(mut self, agent: &'static str) -> Self {
        self.user_agent = Some(agent);
        self
    }

    fn state(&self) -> Result<&SessionState, FlavorError> {
        self.state
            .get_or_init(|| SessionState::from_config(&self.config, self.default_base_url))
            .as_ref()
            .map_err(|e| FlavorError::Config(e.clone()))
    }

    /// Upstream root, from the `base_url` option or the chain's default.
    ///
    /// # Errors
    ///
    /// [`FlavorError::Config`] when the provider options are invalid.
    pub fn base_url(&self) -> Result<&str, FlavorError> {
        Ok(self.state()?.base_url.as_str())
    }

    /// GETs `path` (relative to the base URL) and returns the body text.
    ///
    /// # Errors
    ///
    /// Communication errors per the status table, after retries.
    pub async fn get_text(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<String, FlavorError> {
        let state = self.state()?;
        let url = format!("{}{path}", state.base_url);

        retry_with_backoff(&state.retry, || self.send_once(state, &url, query, None)).await
    }

    /// GETs `path` and decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Communication errors per the status table; `Malformed` when the body
    /// does not decode into `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FlavorError> {
        let state = self.state()?;
        let url = format!("{}{path}", state.base_url);

        let body = retry_with_backoff(&state.retry, || {
            self.send_once(state, &url, query, Some("application/json"))
        })
        .await?;

        serde_json::from_str(&body).map_err(|e| FlavorError::malformed(&url, e.to_string()))
    }

    async fn send_once(
        &self,
        state: &SessionState,
        url: &str,
        query: &[(&str, &str)],
        accept: Option<&str>,
    ) -> Result<String, FlavorError> {
        state.limiter.acquire().await;
        tracing::debug!(provider = %self.provider, url, "upstream request");

        let mut request = self.client.get(url).timeout(state.request_timeout);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(agent) = self.user_agent {
            request = request.header(reqwest::header::USER_AGENT, agent);
        }
        if let Some(accept) = accept {
            request = request.header(reqwest::header::ACCEPT, accept);
        }

        let response = request.send().await.map_err(|e| transport_error(url, &e))?;
        let status = response.status();

        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            return Err(status_error(status, url, retry_after_secs));
        }

        response.text().await.map_err(|e| transport_error(url, &e))
    }
}

impl std::fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSession")
            .field("provider", &self.provider)
            .field("default_base_url", &self.default_base_url)
            .field("initialized", &self.state.get().is_some())
            .finish_non_exhaustive()
    }
}

fn transport_error(url: &str, err: &reqwest::Error) -> FlavorError {
    let err = if err.is_timeout() {
        CommunicationError::Timeout {
            url: url.to_string(),
        }
    } else {
        CommunicationError::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    };
    FlavorError::Communication(err)
}

/// Maps a non-2xx status. 404 stays `UnexpectedStatus`; callers that know
/// the URL embeds a store id rewrite it with
/// [`FlavorError::not_found_as_location`].
fn status_error(status: StatusCode, url: &str, retry_after_secs: Option<u64>) -> FlavorError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            FlavorError::Communication(CommunicationError::RateLimited {
                url: url.to_string(),
                retry_after_secs,
            })
        }
        StatusCode::UNAUTHORIZED => {
            FlavorError::Authentication(format!("{url} rejected the request (HTTP 401)"))
        }
        _ => FlavorError::Communication(CommunicationError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        }),
    }
}
