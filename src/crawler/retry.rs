//! Retry logic with exponential backoff
//!
//! Wraps [`fetch_url`] for callers that want transient failures retried.
//! Timeouts, refused connections, HTTP 429 and 5xx responses are retried;
//! everything else is returned as-is on the first attempt.

use crate::config::RetryConfig;
use crate::crawler::fetcher::{fetch_url, FetchResult};
use crate::TransportError;
use rand::Rng;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Classifies an outcome as worth another attempt
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for TransportError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

impl IsRetryable for FetchResult {
    fn is_retryable(&self) -> bool {
        self.status_code == 429 || (500..600).contains(&self.status_code)
    }
}

impl<T: IsRetryable, E: IsRetryable> IsRetryable for Result<T, E> {
    fn is_retryable(&self) -> bool {
        match self {
            Ok(value) => value.is_retryable(),
            Err(error) => error.is_retryable(),
        }
    }
}

/// Fetches `url`, retrying transient failures per `config`
///
/// Returns the last outcome once it is not retryable, the attempts are used
/// up, or `cancel` fires during a backoff pause.
pub async fn fetch_with_retry(
    client: &Client,
    url: &str,
    encoding: &str,
    config: &RetryConfig,
    cancel: &CancellationToken,
) -> Result<FetchResult, TransportError> {
    let mut attempt = 0;
    let mut delay = config.initial_delay();

    loop {
        let outcome = fetch_url(client, url, encoding).await;

        if !outcome.is_retryable() || attempt >= config.max_attempts || cancel.is_cancelled() {
            if attempt > 0 && outcome.is_retryable() {
                tracing::warn!(%url, attempts = attempt + 1, "Giving up after retries");
            } else if attempt > 0 {
                tracing::info!(%url, attempts = attempt + 1, "Request succeeded after retry");
            }
            return outcome;
        }

        attempt += 1;
        let wait = if config.jitter { add_jitter(delay) } else { delay };

        match &outcome {
            Ok(result) => tracing::warn!(
                %url,
                status = result.status_code,
                attempt,
                max_attempts = config.max_attempts,
                delay_ms = wait.as_millis() as u64,
                "Retryable status, retrying"
            ),
            Err(e) => tracing::warn!(
                %url,
                error = %e,
                attempt,
                max_attempts = config.max_attempts,
                delay_ms = wait.as_millis() as u64,
                "Request failed, retrying"
            ),
        }

        tokio::select! {
            _ = cancel.cancelled() => return outcome,
            _ = tokio::time::sleep(wait) => {}
        }

        delay = next_delay(delay, config);
    }
}

/// Grows `delay` by the backoff multiplier, capped at the configured maximum
///
/// Saturates at the maximum when the product does not fit in a `Duration`.
pub fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
    let max = config.max_delay();
    Duration::try_from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier)
        .unwrap_or(max)
        .min(max)
}

/// Spreads a delay over 50%..150% of its nominal value
fn add_jitter(delay: Duration) -> Duration {
    let factor = rand::rng().random_range(0.5..=1.5);
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[test]
    fn test_next_delay_grows_and_caps() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 100,
            max_delay_ms: 350,
            backoff_multiplier: 2.0,
            jitter: false,
        };

        let d1 = next_delay(config.initial_delay(), &config);
        assert_eq!(d1, Duration::from_millis(200));
        let d2 = next_delay(d1, &config);
        assert_eq!(d2, Duration::from_millis(350));
    }

    #[test]
    fn test_next_delay_saturates_on_overflow() {
        let config = RetryConfig {
            max_attempts: 2,
            initial_delay_ms: 1,
            max_delay_ms: u64::MAX,
            backoff_multiplier: 1e300,
            jitter: false,
        };

        let delay = next_delay(config.initial_delay(), &config);
        assert_eq!(delay, config.max_delay());
        assert_eq!(next_delay(delay, &config), config.max_delay());
    }

    #[test]
    fn test_jitter_saturates_on_overflow() {
        for _ in 0..50 {
            assert!(add_jitter(Duration::MAX) >= Duration::MAX / 2);
        }
    }

    #[test]
    fn test_jitter_bounds() {
        let delay = Duration::from_millis(1000);
        for _ in 0..50 {
            let jittered = add_jitter(delay);
            assert!(jittered >= Duration::from_millis(500));
            assert!(jittered <= Duration::from_millis(1500));
        }
    }

    #[test]
    fn test_status_classification() {
        let result = |status_code| FetchResult {
            status_code,
            body: String::new(),
            url: String::new(),
        };
        assert!(result(503).is_retryable());
        assert!(result(429).is_retryable());
        assert!(!result(404).is_retryable());
        assert!(!result(200).is_retryable());
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = Client::new();
        let result = fetch_with_retry(
            &client,
            &server.uri(),
            "utf-8",
            &fast_retry(3),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(result.status_code, 200);
        assert_eq!(result.body, "ok");
    }

    #[tokio::test]
    async fn test_returns_last_status_when_attempts_run_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let client = Client::new();
        let result = fetch_with_retry(
            &client,
            &server.uri(),
            "utf-8",
            &fast_retry(2),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(result.status_code, 502);
    }

    #[tokio::test]
    async fn test_huge_multiplier_is_capped_between_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let config = RetryConfig {
            backoff_multiplier: 1e300,
            ..fast_retry(2)
        };
        let client = Client::new();
        let result = fetch_with_retry(
            &client,
            &server.uri(),
            "utf-8",
            &config,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(result.status_code, 503);
    }

    #[tokio::test]
    async fn test_retries_timeouts_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("late but fine"))
            .mount(&server)
            .await;

        let client = Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let result = fetch_with_retry(
            &client,
            &server.uri(),
            "utf-8",
            &fast_retry(1),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(result.status_code, 200);
        assert_eq!(result.body, "late but fine");
    }

    #[tokio::test]
    async fn test_timeout_is_returned_when_attempts_run_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let result = fetch_with_retry(
            &client,
            &server.uri(),
            "utf-8",
            &fast_retry(1),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(TransportError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new();
        let result = fetch_with_retry(
            &client,
            &server.uri(),
            "utf-8",
            &fast_retry(4),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(result.status_code, 404);
    }
}
