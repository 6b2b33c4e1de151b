//! HTTP client adapter for the StatusCake API.
//!
//! One [`ApiClient`] is constructed per provider process and shared across
//! every resource operation. It enforces a global requests-per-second
//! ceiling with a token bucket and retries transient failures with
//! exponential backoff and jitter. From the caller's perspective a request
//! either eventually succeeds or returns a terminal error once the retry
//! budget is exhausted.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{ApiError, ProviderError};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.statuscake.com/v1";

/// Maximum length of an error body to log.
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Settings for constructing an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Bearer token used to authenticate every request.
    pub api_token: String,
    /// Requests-per-second ceiling shared across all operations.
    pub rps: u32,
    /// Maximum number of retries after a failed request.
    pub retries: u32,
    /// Minimum backoff period between retries.
    pub min_backoff: Duration,
    /// Maximum backoff period between retries.
    pub max_backoff: Duration,
    /// API base URL.
    pub base_url: String,
}

impl ClientOptions {
    /// Create options with the given token and the default limits.
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            rps: 4,
            retries: 3,
            min_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set the requests-per-second ceiling.
    pub fn with_rps(mut self, rps: u32) -> Self {
        self.rps = rps;
        self
    }

    /// Set the maximum number of retries.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the backoff bounds.
    pub fn with_backoff(mut self, min: Duration, max: Duration) -> Self {
        self.min_backoff = min;
        self.max_backoff = max;
        self
    }

    /// Point the client at a custom endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Shared HTTP client for the StatusCake API.
///
/// Safe for concurrent use; the host may run operations for different
/// resource instances in parallel against the same client.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    options: ClientOptions,
    limiter: TokenBucket,
}

impl ApiClient {
    /// Build a client from the given options.
    pub fn new(options: ClientOptions) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(
                "hemmer-provider-statuscake/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            http,
            limiter: TokenBucket::new(options.rps),
            options,
        })
    }

    /// POST a create payload and return the new resource identifier.
    pub async fn create(&self, path: &str, body: &Value) -> Result<String, ProviderError> {
        let response = self
            .request(Method::POST, path, Some(body), &[])
            .await?;

        #[derive(Deserialize)]
        struct CreateResponse {
            data: CreateData,
        }
        #[derive(Deserialize)]
        struct CreateData {
            new_id: String,
        }

        let parsed: CreateResponse = serde_json::from_value(response)?;
        Ok(parsed.data.new_id)
    }

    /// GET a resource detail payload (the `data` member of the response).
    pub async fn get(&self, path: &str) -> Result<Value, ProviderError> {
        self.get_with_query(path, &[]).await
    }

    /// GET with query parameters, returning the `data` member.
    pub async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, ProviderError> {
        let response = self.request(Method::GET, path, None, query).await?;

        #[derive(Deserialize)]
        struct DataResponse {
            data: Value,
        }

        let parsed: DataResponse = serde_json::from_value(response)?;
        Ok(parsed.data)
    }

    /// PUT an update payload.
    pub async fn update(&self, path: &str, body: &Value) -> Result<(), ProviderError> {
        self.request(Method::PUT, path, Some(body), &[]).await?;
        Ok(())
    }

    /// DELETE a resource.
    pub async fn delete(&self, path: &str) -> Result<(), ProviderError> {
        self.request(Method::DELETE, path, None, &[]).await?;
        Ok(())
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(&str, &str)],
    ) -> Result<Value, ProviderError> {
        let url = format!(
            "{}/{}",
            self.options.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        let mut attempt: u32 = 0;
        loop {
            self.limiter.acquire().await;
            debug!(%method, %url, attempt, "sending API request");

            match self.execute(method.clone(), &url, body, query).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.options.retries && is_retryable(&err) => {
                    let delay = self.backoff_delay(attempt);
                    warn!(%method, %url, error = %err, delay_ms = delay.as_millis() as u64, "retrying API request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
                Err(err) => return Err(err),
            }
        }
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        query: &[(&str, &str)],
    ) -> Result<Value, ProviderError> {
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(&self.options.api_token);

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), body = %sanitize_for_log(&text), "API request failed");
            return Err(parse_error_body(status, &text).into());
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Exponential backoff with multiplicative jitter, capped at the
    /// configured maximum.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.options.min_backoff.as_secs_f64() * 2f64.powi(attempt as i32);
        let capped = base.min(self.options.max_backoff.as_secs_f64());
        let jittered = capped * (1.0 + 0.2 * (2.0 * fastrand::f64() - 1.0));
        Duration::from_secs_f64(jittered.clamp(0.0, self.options.max_backoff.as_secs_f64()))
    }
}

fn is_retryable(err: &ProviderError) -> bool {
    match err {
        ProviderError::Transport(_) => true,
        ProviderError::Api(api) => api.is_transient(),
        _ => false,
    }
}

/// Parse an API error body of the form
/// `{"message": "...", "errors": {"field": ["violation"]}}`.
fn parse_error_body(status: StatusCode, body: &str) -> ApiError {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        message: String,
        #[serde(default)]
        errors: BTreeMap<String, Vec<String>>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.message.is_empty() || !parsed.errors.is_empty() => ApiError {
            status: status.as_u16(),
            message: if parsed.message.is_empty() {
                status.to_string()
            } else {
                parsed.message
            },
            errors: parsed.errors,
        },
        _ => ApiError::new(status.as_u16(), status.to_string()),
    }
}

fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..MAX_LOG_BODY_LENGTH],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect()
}

/// Token bucket enforcing the global requests-per-second ceiling.
///
/// `acquire` blocks until a token is available and never drops work.
#[derive(Debug)]
struct TokenBucket {
    state: Mutex<BucketState>,
    rate: f64,
    burst: f64,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last: Instant,
}

impl TokenBucket {
    fn new(rps: u32) -> Self {
        let rate = f64::from(rps.max(1));
        Self {
            state: Mutex::new(BucketState {
                tokens: 1.0,
                last: Instant::now(),
            }),
            rate,
            burst: 1.0,
        }
    }

    async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.last).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.rate).min(self.burst);
                state.last = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    Some(Duration::from_secs_f64((1.0 - state.tokens) / self.rate))
                }
            };

            match wait {
                None => return,
                Some(delay) => tokio::time::sleep(delay).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_error_body_with_violations() {
        let body = json!({
            "message": "The request could not be processed",
            "errors": {
                "check_rate": ["is not a valid check rate"],
                "website_url": ["is required"]
            }
        })
        .to_string();

        let err = parse_error_body(StatusCode::BAD_REQUEST, &body);
        assert_eq!(err.status, 400);
        assert_eq!(err.message, "The request could not be processed");
        assert_eq!(err.errors.len(), 2);
        assert_eq!(err.errors["check_rate"], vec!["is not a valid check rate"]);
    }

    #[test]
    fn test_parse_error_body_malformed() {
        let err = parse_error_body(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert_eq!(err.status, 500);
        assert!(err.errors.is_empty());
        assert!(err.is_transient());
    }

    #[test]
    fn test_parse_error_body_not_found() {
        let body = json!({"message": "No results found"}).to_string();
        let err = parse_error_body(StatusCode::NOT_FOUND, &body);
        assert!(err.is_not_found());
        assert_eq!(err.message, "No results found");
    }

    #[test]
    fn test_backoff_delay_bounds() {
        let client = ApiClient::new(
            ClientOptions::new("0123456789abcdefghij")
                .with_backoff(Duration::from_secs(1), Duration::from_secs(30)),
        )
        .unwrap();

        for attempt in 0..8 {
            let delay = client.backoff_delay(attempt);
            let base = (1u64 << attempt.min(5)) as f64;
            let expected = base.min(30.0);
            // Jitter stays within +/- 20% of the capped exponential delay.
            assert!(delay.as_secs_f64() <= expected * 1.2 + f64::EPSILON);
            assert!(delay.as_secs_f64() >= (expected * 0.8).min(30.0) - f64::EPSILON);
            assert!(delay.as_secs_f64() <= 30.0);
        }
    }

    #[test]
    fn test_sanitize_for_log_truncates() {
        let long = "x".repeat(500);
        let sanitized = sanitize_for_log(&long);
        assert!(sanitized.contains("truncated"));
        assert!(sanitized.len() < 300);
    }

    #[tokio::test]
    async fn test_token_bucket_allows_burst_then_throttles() {
        let bucket = TokenBucket::new(1000);

        let start = Instant::now();
        bucket.acquire().await;
        bucket.acquire().await;
        bucket.acquire().await;
        // At 1000 rps three acquisitions complete almost immediately.
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(&ProviderError::Api(ApiError::new(500, "boom"))));
        assert!(is_retryable(&ProviderError::Api(ApiError::new(429, "slow"))));
        assert!(!is_retryable(&ProviderError::Api(ApiError::new(404, "gone"))));
        assert!(!is_retryable(&ProviderError::Validation("bad".to_string())));
    }
}
