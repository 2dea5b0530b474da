use std::time::Duration;

use magicbox_domain::MagicBoxError;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::{BackendErrorBody, InfraError};

/// HTTP client with built-in retry and timeout support.
///
/// Only idempotent methods are retried. A `POST` that reached the server may
/// have taken effect, so it is attempted once.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, MagicBoxError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder with retry semantics.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, MagicBoxError> {
        let request = builder.build().map_err(|err| MagicBoxError::from(InfraError::from(err)))?;
        let attempts = if is_idempotent(request.method()) { self.max_attempts.max(1) } else { 1 };
        let method = request.method().clone();
        let url = request.url().clone();

        for attempt in 0..attempts {
            let attempt_request = request.try_clone().ok_or_else(|| {
                MagicBoxError::Internal(
                    "request body cannot be cloned; buffer the body to enable retries".into(),
                )
            })?;

            debug!(attempt = attempt + 1, %method, %url, "sending HTTP request");

            match self.client.execute(attempt_request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = attempt + 1, %method, %url, %status, "received HTTP response");

                    if status.is_server_error() && attempt + 1 < attempts {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(err) => {
                    debug!(attempt = attempt + 1, %method, %url, error = %err, "HTTP request failed");

                    if attempt + 1 < attempts && should_retry_error(&err) {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Err(InfraError::from(err).into());
                }
            }
        }

        Err(MagicBoxError::Internal("http client exhausted retries without producing a result".into()))
    }

    /// Send and decode a JSON body, mapping unsuccessful statuses through
    /// [`BackendErrorBody`].
    pub async fn send_json<T>(&self, builder: RequestBuilder) -> Result<T, MagicBoxError>
    where
        T: DeserializeOwned,
    {
        let response = ensure_success(self.send(builder).await?).await?;
        let bytes = response.bytes().await.map_err(|err| MagicBoxError::from(InfraError::from(err)))?;
        serde_json::from_slice(&bytes).map_err(|err| InfraError::from(err).into())
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = u32::try_from(retry_number.saturating_sub(1).min(8)).unwrap_or(8);
        self.base_backoff.saturating_mul(1u32 << shift)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Pass successful responses through; turn the rest into domain errors.
pub async fn ensure_success(response: Response) -> Result<Response, MagicBoxError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(BackendErrorBody::parse(&body).into_error(status))
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
    default_headers: HeaderMap,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            user_agent: None,
            default_headers: HeaderMap::new(),
        }
    }
}

impl HttpClientBuilder {
    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Delay before the first retry; doubles on each attempt
    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    /// `User-Agent` sent with every request
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Headers sent with every request
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers.extend(headers);
        self
    }

    /// Send the backend's publishable key as `apikey` on every request.
    pub fn api_key(mut self, key: &str) -> Result<Self, MagicBoxError> {
        let value = HeaderValue::from_str(key)
            .map_err(|_| MagicBoxError::Config("backend key is not a valid header value".into()))?;
        self.default_headers.insert("apikey", value);
        Ok(self)
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns `MagicBoxError::Network` if the underlying client cannot be built.
    pub fn build(self) -> Result<HttpClient, MagicBoxError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if !self.default_headers.is_empty() {
            builder = builder.default_headers(self.default_headers);
        }

        let client = builder.build().map_err(|err| MagicBoxError::from(InfraError::from(err)))?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        })
    }
}

fn is_idempotent(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS)
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_request() || err.is_connect()
}
