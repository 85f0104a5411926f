//! Newsreap: a single-site news crawler and article extractor
//!
//! This crate discovers article URLs on a paginated news feed, fetches each
//! article and turns it into a normalized [`article::ArticleRecord`].

pub mod article;
pub mod config;
pub mod crawler;
pub mod output;
pub mod pipeline;
pub mod state;

use thiserror::Error;

/// Main error type for a crawl run
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crawl cancelled")]
    Cancelled,
}

/// Configuration-specific errors
///
/// Every field of the descriptor has its own variant so callers can tell
/// exactly which value was rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config descriptor: {0}")]
    Format(String),

    #[error("Invalid seed URLs: {0}")]
    InvalidSeedUrl(String),

    #[error("Invalid number of articles: {0}")]
    InvalidArticleCount(String),

    #[error("Number of articles {count} is out of range (0..={max})")]
    ArticleCountRange { count: u64, max: u64 },

    #[error("Invalid headers: {0}")]
    InvalidHeaders(String),

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Invalid flag '{field}': {reason}")]
    InvalidFlag { field: &'static str, reason: String },

    #[error("site.{field} is not a valid CSS selector: '{selector}'")]
    InvalidSelector { field: &'static str, selector: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Format(e.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Format(e.to_string())
    }
}

/// Transport-level failures (the request never produced a status code)
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP error for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// Classifies a reqwest error the same way the fetcher reports it
    pub fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
            }
        } else if e.is_connect() {
            TransportError::Connect {
                url: url.to_string(),
                message: e.to_string(),
            }
        } else {
            TransportError::Http {
                url: url.to_string(),
                source: e,
            }
        }
    }

    /// The URL the failed request was sent to
    pub fn url(&self) -> &str {
        match self {
            TransportError::Timeout { url }
            | TransportError::Connect { url, .. }
            | TransportError::Http { url, .. } => url,
        }
    }

    /// Timeouts and refused connections are worth another attempt
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout { .. } | TransportError::Connect { .. }
        )
    }
}

/// Failure to turn one article URL into a record
#[derive(Debug, Error)]
pub enum ArticleFetchError {
    #[error("Article {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Article {url} is missing its {what}")]
    MissingContent { url: String, what: &'static str },

    #[error("Extraction of {url} was cancelled")]
    Cancelled { url: String },
}

/// Browser session errors raised while expanding the feed
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to launch browser session: {0}")]
    Launch(String),

    #[error("Failed to load {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Reveal control interaction failed: {0}")]
    Interaction(String),

    #[error("Failed to read page markup: {0}")]
    Markup(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use article::{ArticleDate, ArticleRecord};
pub use config::CrawlConfig;
pub use state::{DiscoveredUrlSet, PaginationState};
