use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Upper bound for `total_articles`
pub const MAX_ARTICLES: u64 = 150;

/// Upper bound for `timeout`, in seconds
pub const MAX_TIMEOUT_SECS: u64 = 60;

/// Validated crawl configuration
///
/// Built once by [`crate::config::validate`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlConfig {
    /// Pages the crawl starts from, in descriptor order
    pub seed_urls: Vec<String>,

    /// Headers sent with every request
    pub headers: BTreeMap<String, String>,

    /// Maximum number of article URLs to discover
    pub total_articles: usize,

    /// Per-request timeout in seconds (0 disables the timeout)
    pub timeout: u64,

    /// Fallback encoding for response bodies without a charset
    pub encoding: String,

    /// Run the browser without a visible window
    pub headless_mode: bool,

    /// Verify TLS certificates
    pub should_verify_certificate: bool,

    /// Selectors and addresses of the crawled site
    pub site: SiteProfile,

    /// Feed expansion pacing
    pub pagination: PaginationConfig,

    /// Retry policy for seed and article requests
    pub retry: RetryConfig,

    /// Number of articles extracted at once
    pub concurrency: usize,
}

impl CrawlConfig {
    /// The page whose feed is expanded for link discovery
    ///
    /// Falls back to the origin of the first seed URL.
    pub fn landing_url(&self) -> Option<String> {
        match &self.site.landing_url {
            Some(url) => Some(url.clone()),
            None => self.seed_origin(),
        }
    }

    /// The origin relative article links are resolved against
    pub fn base_url(&self) -> Option<Url> {
        let base = match &self.site.base_url {
            Some(url) => Some(url.clone()),
            None => self.seed_origin(),
        }?;
        Url::parse(&base).ok()
    }

    /// Per-request timeout, `None` when the descriptor asks for 0 seconds
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }

    fn seed_origin(&self) -> Option<String> {
        let seed = Url::parse(self.seed_urls.first()?).ok()?;
        Some(format!("{}/", seed.origin().ascii_serialization()))
    }
}

/// CSS selectors for the single page template of the crawled site
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteProfile {
    /// Page loaded in the browser session; defaults to the first seed's origin
    pub landing_url: Option<String>,

    /// Origin for relative article links; defaults to the first seed's origin
    pub base_url: Option<String>,

    /// One element per article preview in the feed
    pub preview: String,

    /// The "load more" button
    pub reveal_control: String,

    pub title: String,

    /// Body text blocks, concatenated in document order
    pub body: String,

    pub author: String,

    pub date: String,

    pub topics: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            landing_url: None,
            base_url: None,
            preview: ".col .article-middle__media".to_string(),
            reveal_control: ".i-btn-loadmore".to_string(),
            title: "h1".to_string(),
            body: ".article-body p".to_string(),
            author: ".article-author".to_string(),
            date: ".article-date".to_string(),
            topics: ".article-tags a".to_string(),
        }
    }
}

/// Pacing of the "load more" loop
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    /// Lower bound of the pause after each reveal, in seconds
    pub min_pause_secs: u64,

    /// Upper bound of the pause after each reveal, in seconds
    pub max_pause_secs: u64,

    /// Hard ceiling on reveals for feeds that never run out
    pub max_reveals: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            min_pause_secs: 3,
            max_pause_secs: 10,
            max_reveals: 500,
        }
    }
}

/// Exponential backoff for transient request failures
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 disables retrying)
    pub max_attempts: u32,

    pub initial_delay_ms: u64,

    pub max_delay_ms: u64,

    pub backoff_multiplier: f64,

    /// Randomize each delay to avoid hammering the site in lockstep
    pub jitter: bool,
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}
