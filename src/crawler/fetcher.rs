//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the HTTP client from the crawl configuration
//! - Single GET requests with body decoding
//! - Error classification (timeout, connection, other)
//!
//! The fetcher never retries; see [`crate::crawler::retry`] for the policy
//! callers wrap around it.

use crate::config::CrawlConfig;
use crate::TransportError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

/// Result of a request that reached the server
///
/// Non-2xx statuses are ordinary results; the caller decides whether to
/// skip or abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// HTTP status code
    pub status_code: u16,

    /// Decoded response body
    pub body: String,

    /// Final URL after redirects
    pub url: String,
}

impl FetchResult {
    /// Returns true for 2xx responses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Builds an HTTP client from the crawl configuration
///
/// Applies the configured headers as defaults, the per-request timeout
/// (none when the descriptor says 0) and the certificate verification flag.
///
/// # Example
///
/// ```no_run
/// use newsreap::config::load_config;
/// use newsreap::crawler::build_http_client;
/// use std::path::Path;
///
/// let config = load_config(Path::new("scraper_config.json")).unwrap();
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &CrawlConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        // Names and values were checked when the config was validated
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping unusable header"),
        }
    }

    let mut builder = Client::builder()
        .default_headers(headers)
        .danger_accept_invalid_certs(!config.should_verify_certificate)
        .gzip(true)
        .brotli(true);

    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }

    builder.build()
}

/// Sends one GET request and reads the body
///
/// The body is decoded with the charset announced by the server, or with
/// `encoding` when the response does not name one.
///
/// # Returns
///
/// * `Ok(FetchResult)` - The server answered, whatever the status
/// * `Err(TransportError)` - DNS, connection, timeout or body read failure
pub async fn fetch_url(
    client: &Client,
    url: &str,
    encoding: &str,
) -> Result<FetchResult, TransportError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| TransportError::from_reqwest(url, e))?;

    let status_code = response.status().as_u16();
    let final_url = response.url().to_string();

    let body = response
        .text_with_charset(encoding)
        .await
        .map_err(|e| TransportError::from_reqwest(url, e))?;

    tracing::debug!(%url, status = status_code, bytes = body.len(), "Fetched page");

    Ok(FetchResult {
        status_code,
        body,
        url: final_url,
    })
}
