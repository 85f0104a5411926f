//! Output sink traits and types
//!
//! This module defines the trait interface for article sinks and the data
//! structures describing a finished run.

use crate::article::ArticleRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for OutputError {
    fn from(e: serde_json::Error) -> Self {
        OutputError::Format(e.to_string())
    }
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Receives finished article records
///
/// Records arrive fully formed, one at a time, in discovery order.
pub trait ArticleSink {
    /// Stores a single record
    ///
    /// # Arguments
    ///
    /// * `record` - The extracted article
    fn store(&mut self, record: &ArticleRecord) -> OutputResult<()>;
}

/// Collects records in memory
impl ArticleSink for Vec<ArticleRecord> {
    fn store(&mut self, record: &ArticleRecord) -> OutputResult<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// An article URL that produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFailure {
    /// The id the article would have had
    pub id: usize,

    /// The URL that failed
    pub url: String,

    /// Error message
    pub message: String,
}

/// Summary of a pipeline run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    // Run metadata
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,

    // Discovery
    pub seeds_total: usize,
    pub seeds_skipped: usize,
    pub article_cap: usize,
    pub urls_discovered: usize,
    pub pagination_outcome: String,
    pub reveals: usize,

    // Extraction
    pub stored_ids: Vec<usize>,
    pub failures: Vec<ArticleFailure>,
}

impl RunSummary {
    /// Creates a new empty run summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records handed to the sink
    pub fn articles_stored(&self) -> usize {
        self.stored_ids.len()
    }

    /// Returns the share of discovered URLs that became records, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.urls_discovered == 0 {
            return 0.0;
        }
        (self.articles_stored() as f64 / self.urls_discovered as f64) * 100.0
    }
}
