//! Shared request plumbing: pacing, retry with backoff, strict JSON decoding.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::SourceError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest error body kept in a [`SourceError::Status`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(300),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// No sleeping between attempts. Used by tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            multiplier: 1,
        }
    }
}

/// Minimum-interval pacing for one upstream. Callers are serialised on the mutex.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let since = previous.elapsed();
            if since < self.min_interval {
                tokio::time::sleep(self.min_interval - since).await;
            }
        }
        *last = Some(Instant::now());
    }
}

pub fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!("Failed to build HTTP client with timeout, using defaults: {}", e);
            Client::new()
        })
}

/// Scheme, host and path only. Keeps api keys in query strings out of logs and errors.
pub fn display_url(url: &Url) -> String {
    let mut shown = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        shown.push_str(&format!(":{}", port));
    }
    shown.push_str(url.path());
    shown
}

struct Failure {
    error: SourceError,
    retry_after: Option<Duration>,
}

impl From<SourceError> for Failure {
    fn from(error: SourceError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

async fn attempt<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, Failure> {
    let (client, request) = builder.build_split();
    let request = request.map_err(|e| SourceError::InvalidUrl(e.to_string()))?;
    let url = display_url(request.url());

    let response = client
        .execute(request)
        .await
        .map_err(|e| SourceError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        let retry_after = if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
        } else {
            None
        };
        let body = response.text().await.unwrap_or_default();
        let body: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
        return Err(Failure {
            error: SourceError::Status {
                url,
                status: status.as_u16(),
                body,
            },
            retry_after,
        });
    }

    let body = response.text().await.map_err(|e| SourceError::Transport {
        url: url.clone(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&body).map_err(|e| {
        Failure::from(SourceError::Decode {
            url,
            message: e.to_string(),
        })
    })
}

/// Sends one request with no retry, decoding the JSON body.
pub async fn fetch_once<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, SourceError> {
    attempt(builder).await.map_err(|failure| failure.error)
}

/// GET with pacing, retries and strict decoding.
///
/// `build` is invoked once per attempt so auth headers can be refreshed. An
/// error returned by `build` counts as a failed attempt when it is retryable.
pub async fn get_json<T, F, Fut>(
    label: &str,
    policy: &RetryPolicy,
    limiter: &RateLimiter,
    mut build: F,
) -> Result<T, SourceError>
where
    T: DeserializeOwned,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<RequestBuilder, SourceError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut backoff = policy.initial_backoff;

    for n in 1..=attempts {
        let outcome = match build().await {
            Ok(builder) => {
                limiter.wait().await;
                attempt(builder).await
            }
            Err(error) => Err(Failure::from(error)),
        };

        let failure = match outcome {
            Ok(value) => return Ok(value),
            Err(failure) => failure,
        };

        if !failure.error.is_retryable() || n == attempts {
            return Err(failure.error);
        }

        let delay = failure.retry_after.unwrap_or(backoff);
        warn!(
            "[{}] attempt {}/{} failed, retrying in {:?}: {}",
            label, n, attempts, delay, failure.error
        );
        tokio::time::sleep(delay).await;
        backoff *= policy.multiplier;
    }

    debug!("[{}] retry loop exhausted without a response", label);
    Err(SourceError::Transport {
        url: label.to_string(),
        message: "no attempts made".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        ok: bool,
    }

    async fn get(server: &MockServer, route: &str, policy: RetryPolicy) -> Result<Payload, SourceError> {
        let client = Client::new();
        let limiter = RateLimiter::new(Duration::ZERO);
        let url = format!("{}{}", server.uri(), route);
        get_json("test", &policy, &limiter, || {
            let builder = client.get(&url);
            async move { Ok(builder) }
        })
        .await
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let payload = get(&server, "/flaky", RetryPolicy::immediate(3)).await.unwrap();
        assert_eq!(payload, Payload { ok: true });
    }

    #[tokio::test]
    async fn test_client_errors_fail_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let err = get(&server, "/missing", RetryPolicy::immediate(3)).await.unwrap_err();
        match err {
            SourceError::Status { status, body, .. } => {
                assert_eq!(status, 404);
                assert_eq!(body, "nope");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_decode_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/garbled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .expect(1)
            .mount(&server)
            .await;

        let err = get(&server, "/garbled", RetryPolicy::immediate(3)).await.unwrap_err();
        assert!(matches!(err, SourceError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .expect(3)
            .mount(&server)
            .await;

        let err = get(&server, "/busy", RetryPolicy::immediate(3)).await.unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_builder_errors_count_as_attempts() {
        let limiter = RateLimiter::new(Duration::ZERO);
        let mut calls = 0;
        let result: Result<Payload, SourceError> =
            get_json("test", &RetryPolicy::immediate(3), &limiter, || {
                calls += 1;
                async {
                    Err(SourceError::Transport {
                        url: "login".to_string(),
                        message: "refused".to_string(),
                    })
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_calls() {
        let limiter = RateLimiter::new(Duration::from_millis(30));
        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn test_display_url_drops_query() {
        let url = Url::parse("https://api.themoviedb.org/3/movie/1?api_key=secret").unwrap();
        assert_eq!(display_url(&url), "https://api.themoviedb.org/3/movie/1");
    }
}
