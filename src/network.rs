use std::time::Duration;
use tokio::time::timeout;

use crate::backoff::ExponentialBackoff;
use crate::config::Config;

/// HTTP client for loading catalog pages and product images
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout_duration: Duration,
    user_agent: String,
    max_content_size: usize,
    max_retries: u32,
    backoff: ExponentialBackoff,
}

impl HttpClient {
    /// Create a new HTTP client with the default content size limit
    pub fn new(user_agent: String, timeout_secs: u64) -> Result<Self, FetchError> {
        Self::with_content_limit(user_agent, timeout_secs, Config::MAX_CONTENT_SIZE)
    }

    /// Create a new HTTP client with custom content size limit
    pub fn with_content_limit(
        user_agent: String,
        timeout_secs: u64,
        max_content_size: usize,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(Config::CONNECT_TIMEOUT_SECS))
            // One site, sequential requests: a small pool is plenty
            .pool_max_idle_per_host(Config::POOL_IDLE_PER_HOST)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_duration: Duration::from_secs(timeout_secs),
            user_agent,
            max_content_size,
            max_retries: Config::MAX_RETRIES,
            backoff: ExponentialBackoff::new(Config::RETRY_BACKOFF_MS, Config::RETRY_BACKOFF_MAX_MS),
        })
    }

    /// Override the retry budget (total attempts = retries + 1)
    pub fn with_retries(mut self, max_retries: u32, backoff: ExponentialBackoff) -> Self {
        self.max_retries = max_retries;
        self.backoff = backoff;
        self
    }

    /// Get the user agent string used by this client
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Fetch a URL and return the response body as a string.
    /// Transient errors are retried with exponential backoff.
    pub async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.backoff.delay(attempt);
                    tracing::debug!(url, attempt, error = %e, "retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetch raw bytes (images). Same retry policy as `fetch`.
    pub async fn fetch_bytes(&self, url: &str) -> Result<(Vec<u8>, Option<String>), FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_bytes_once(url).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    tokio::time::sleep(self.backoff.delay(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send(&self, url: &str, accept: &str) -> Result<reqwest::Response, FetchError> {
        let response = timeout(
            self.timeout_duration,
            self.client
                .get(url)
                .header("Accept", accept)
                .header("Accept-Language", "de-DE,de;q=0.9,en;q=0.8")
                .send(),
        )
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(Self::classify_error)?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        if let Some(length) = response.content_length() {
            if length as usize > self.max_content_size {
                return Err(FetchError::ContentTooLarge(length as usize, self.max_content_size));
            }
        }

        Ok(response)
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchResult, FetchError> {
        let response = self
            .send(
                url,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .await?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = content_type_of(&response);

        let content = timeout(self.timeout_duration, response.text())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(|e| FetchError::BodyError(e.to_string()))?;

        if content.len() > self.max_content_size {
            return Err(FetchError::ContentTooLarge(
                content.len(),
                self.max_content_size,
            ));
        }

        Ok(FetchResult {
            content,
            status_code,
            content_type,
            final_url,
        })
    }

    async fn fetch_bytes_once(&self, url: &str) -> Result<(Vec<u8>, Option<String>), FetchError> {
        let response = self.send(url, "image/*,*/*;q=0.8").await?;
        let content_type = content_type_of(&response);

        let bytes = timeout(self.timeout_duration, response.bytes())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(|e| FetchError::BodyError(e.to_string()))?;

        if bytes.len() > self.max_content_size {
            return Err(FetchError::ContentTooLarge(bytes.len(), self.max_content_size));
        }

        Ok((bytes.to_vec(), content_type))
    }

    /// Classify reqwest errors into our FetchError types
    fn classify_error(error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            return FetchError::Timeout;
        }

        let error_msg = error.to_string().to_lowercase();

        if error_msg.contains("connection refused") {
            return FetchError::ConnectionRefused;
        }

        if error_msg.contains("dns") || error_msg.contains("name resolution") {
            return FetchError::DnsError;
        }

        if error_msg.contains("ssl") || error_msg.contains("tls") || error_msg.contains("certificate") {
            return FetchError::SslError;
        }

        FetchError::NetworkError(error.to_string())
    }
}

fn content_type_of(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

/// Result of a successful HTTP fetch
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub content: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    /// URL after redirects
    pub final_url: String,
}

/// Errors that can occur during HTTP fetching
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection refused - server not accepting connections")]
    ConnectionRefused,

    #[error("DNS resolution failed")]
    DnsError,

    #[error("SSL/TLS error - certificate or encryption issue")]
    SslError,

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("Failed to read response body: {0}")]
    BodyError(String),

    #[error("Content too large: {0} bytes (max: {1} bytes)")]
    ContentTooLarge(usize, usize),
}

impl FetchError {
    /// Check if this error is retryable (transient) or permanent
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout => true,
            FetchError::HttpStatus(code) => *code == 429 || *code >= 500,
            FetchError::NetworkError(msg) => {
                let msg_lower = msg.to_lowercase();
                msg_lower.contains("timeout")
                    || msg_lower.contains("broken pipe")
                    || msg_lower.contains("connection reset")
                    || msg_lower.contains("temporary")
            }
            FetchError::ConnectionRefused
            | FetchError::DnsError
            | FetchError::SslError
            | FetchError::BodyError(_)
            | FetchError::ContentTooLarge(_, _) => false,
        }
    }
}
