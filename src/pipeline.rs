//! End-to-end run: discover article URLs, extract each one, hand records to a sink
//!
//! Discovery is sequential. Extraction runs up to `concurrency` requests at
//! once but yields results in discovery order, so the sink always sees
//! records sorted by `id`.

use crate::article::ArticleExtractor;
use crate::config::CrawlConfig;
use crate::crawler::{Coordinator, SessionLauncher};
use crate::output::{
    generate_markdown_summary, prepare_environment, ArticleFailure, ArticleSink, FileSink,
    RunSummary,
};
use crate::{ArticleFetchError, CrawlError};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// File name of the markdown summary written next to the articles
pub const SUMMARY_FILE_NAME: &str = "crawl_summary.md";

/// One configured crawl run
pub struct Pipeline<L> {
    config: Arc<CrawlConfig>,
    client: Client,
    launcher: L,
    cancel: CancellationToken,
    config_hash: String,
}

impl<L: SessionLauncher> Pipeline<L> {
    /// Creates a pipeline
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawl configuration
    /// * `client` - HTTP client built from `config`
    /// * `launcher` - Opens the session used to expand the feed
    /// * `cancel` - Aborts the run between requests
    pub fn new(
        config: Arc<CrawlConfig>,
        client: Client,
        launcher: L,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            client,
            launcher,
            cancel,
            config_hash: String::new(),
        }
    }

    /// Records the descriptor fingerprint in the run summary
    pub fn with_config_hash(mut self, config_hash: impl Into<String>) -> Self {
        self.config_hash = config_hash.into();
        self
    }

    /// Runs discovery and extraction, storing every record in `sink`
    ///
    /// Article failures are logged and listed in the summary; they do not stop
    /// the run. Sink errors and cancellation do.
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - The run finished (possibly with failed articles)
    /// * `Err(CrawlError)` - Cancelled, or the sink rejected a record
    pub async fn run<S: ArticleSink>(self, sink: &mut S) -> Result<RunSummary, CrawlError> {
        let start_time = Instant::now();
        let mut summary = RunSummary::new();
        summary.started_at = Utc::now().to_rfc3339();
        summary.config_hash = self.config_hash;
        summary.seeds_total = self.config.seed_urls.len();
        summary.article_cap = self.config.total_articles;

        let extractor = ArticleExtractor::new(self.client.clone(), self.config.clone())?;

        let coordinator = Coordinator::new(
            self.config.clone(),
            self.client,
            self.launcher,
            self.cancel.clone(),
        );
        let discovery = coordinator.discover_article_urls().await?;

        summary.seeds_skipped = discovery.seeds_skipped;
        summary.urls_discovered = discovery.urls.len();
        match &discovery.expansion {
            Some(expansion) => {
                summary.pagination_outcome = expansion.final_state().to_string();
                summary.reveals = expansion.reveals;
            }
            None => summary.pagination_outcome = "skipped".to_string(),
        }

        let urls = discovery.urls.into_vec();
        tracing::info!(
            articles = urls.len(),
            concurrency = self.config.concurrency,
            "Extracting articles"
        );

        let cancel = &self.cancel;
        let extractor = &extractor;
        let results = stream::iter(urls.into_iter().enumerate().map(|(index, url)| async move {
            let id = index + 1;
            let result = extractor.extract(&url, id, cancel).await;
            (id, url, result)
        }))
        .buffered(self.config.concurrency.max(1));
        futures::pin_mut!(results);

        while let Some((id, url, result)) = results.next().await {
            match result {
                Ok(record) => {
                    sink.store(&record)?;
                    summary.stored_ids.push(id);
                    tracing::info!(id, %url, "Article stored");
                }
                Err(ArticleFetchError::Cancelled { .. }) => return Err(CrawlError::Cancelled),
                Err(e) => {
                    tracing::warn!(id, %url, error = %e, "Article extraction failed");
                    summary.failures.push(ArticleFailure {
                        id,
                        url,
                        message: e.to_string(),
                    });
                }
            }
        }

        if self.cancel.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }

        summary.finished_at = Some(Utc::now().to_rfc3339());
        summary.duration_seconds = Some(start_time.elapsed().as_secs());
        summary.status = "completed".to_string();

        tracing::info!(
            stored = summary.articles_stored(),
            failed = summary.failures.len(),
            elapsed = ?start_time.elapsed(),
            "Run completed"
        );

        Ok(summary)
    }

    /// Runs into a freshly wiped `output_dir` using the file layout
    ///
    /// Writes `{id}_raw.txt` / `{id}_meta.json` pairs and a
    /// [`SUMMARY_FILE_NAME`] report.
    pub async fn run_to_directory(self, output_dir: &Path) -> Result<RunSummary, CrawlError> {
        prepare_environment(output_dir)?;
        tracing::info!(dir = %output_dir.display(), "Output directory prepared");

        let mut sink = FileSink::new(output_dir);
        let summary = self.run(&mut sink).await?;

        generate_markdown_summary(&summary, &output_dir.join(SUMMARY_FILE_NAME))?;

        Ok(summary)
    }
}
