//! Crawler coordinator - article URL discovery
//!
//! This module runs the discovery loop that turns the configured seeds into
//! a capped, deduplicated list of article URLs:
//! - Expanding the feed once through the pagination driver
//! - Checking each seed page is reachable
//! - Pulling unseen links from the shared feed snapshot until the cap is hit
//!
//! Discovery is best-effort. A seed that fails to load is logged and skipped;
//! only cancellation ends the loop with an error.

use crate::config::CrawlConfig;
use crate::crawler::links::FeedSnapshot;
use crate::crawler::pagination::{FeedExpansion, PaginationDriver, SessionLauncher};
use crate::crawler::retry::fetch_with_retry;
use crate::state::DiscoveredUrlSet;
use crate::CrawlError;
use reqwest::Client;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Outcome of a discovery pass
#[derive(Debug)]
pub struct Discovery {
    /// The article URLs, in discovery order
    pub urls: DiscoveredUrlSet,

    /// How the feed expansion went; `None` when no session was needed
    pub expansion: Option<FeedExpansion>,

    /// Seeds that were skipped because they could not be fetched
    pub seeds_skipped: usize,
}

impl Discovery {
    fn empty(cap: usize) -> Self {
        Self {
            urls: DiscoveredUrlSet::new(cap),
            expansion: None,
            seeds_skipped: 0,
        }
    }
}

/// Main discovery coordinator structure
pub struct Coordinator<L> {
    config: Arc<CrawlConfig>,
    client: Client,
    driver: PaginationDriver<L>,
    cancel: CancellationToken,
}

impl<L: SessionLauncher> Coordinator<L> {
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawl configuration
    /// * `client` - HTTP client built from the same configuration
    /// * `launcher` - Opens the browsing session used to expand the feed
    /// * `cancel` - Aborts discovery between requests
    pub fn new(
        config: Arc<CrawlConfig>,
        client: Client,
        launcher: L,
        cancel: CancellationToken,
    ) -> Self {
        let driver = PaginationDriver::from_config(launcher, &config);
        Self {
            config,
            client,
            driver,
            cancel,
        }
    }

    /// Discovers up to `total_articles` unique article URLs
    ///
    /// The feed is expanded once and its snapshot is shared by every seed:
    /// a seed only has to load successfully for the snapshot's links to be
    /// taken on its behalf.
    ///
    /// # Returns
    ///
    /// * `Ok(Discovery)` - The URL set (possibly empty) and the feed outcome
    /// * `Err(CrawlError::Cancelled)` - The cancellation token fired
    pub async fn discover_article_urls(&self) -> Result<Discovery, CrawlError> {
        let cap = self.config.total_articles;

        if cap == 0 || self.config.seed_urls.is_empty() {
            tracing::info!(cap, seeds = self.config.seed_urls.len(), "Nothing to discover");
            return Ok(Discovery::empty(cap));
        }

        let (Some(landing_url), Some(base_url)) =
            (self.config.landing_url(), self.config.base_url())
        else {
            tracing::warn!("Could not derive the feed landing page from the seeds");
            return Ok(Discovery::empty(cap));
        };

        let expansion = self.driver.expand_feed(&landing_url, &self.cancel).await;
        if self.cancel.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }

        let parsed = FeedSnapshot::parse(&expansion.snapshot, &base_url, &self.config.site.preview);
        let snapshot = match parsed {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(error = %e, "Could not read the feed snapshot");
                return Ok(Discovery {
                    urls: DiscoveredUrlSet::new(cap),
                    expansion: Some(expansion),
                    seeds_skipped: 0,
                });
            }
        };

        tracing::info!(
            previews = snapshot.links().len(),
            outcome = ?expansion.outcome,
            "Feed snapshot ready"
        );

        let mut urls = DiscoveredUrlSet::new(cap);
        let mut seeds_skipped = 0;

        'seeds: for seed in &self.config.seed_urls {
            if self.cancel.is_cancelled() {
                return Err(CrawlError::Cancelled);
            }

            let response = fetch_with_retry(
                &self.client,
                seed,
                &self.config.encoding,
                &self.config.retry,
                &self.cancel,
            )
            .await;

            match response {
                Ok(result) if result.is_success() => {}
                Ok(result) => {
                    tracing::warn!(
                        %seed,
                        status = result.status_code,
                        "Seed returned an error status, skipping"
                    );
                    seeds_skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(%seed, error = %e, "Seed could not be fetched, skipping");
                    seeds_skipped += 1;
                    continue;
                }
            }

            let before = urls.len();
            loop {
                if self.cancel.is_cancelled() {
                    return Err(CrawlError::Cancelled);
                }

                let Some(link) = snapshot.next_unseen(&urls) else {
                    break;
                };

                urls.insert(link);
                tracing::debug!(%link, found = urls.len(), "Discovered article");

                if urls.is_full() {
                    tracing::info!(%seed, found = urls.len(), "Article cap reached");
                    break 'seeds;
                }
            }

            tracing::info!(%seed, new = urls.len() - before, "Seed processed");
        }

        tracing::info!(
            found = urls.len(),
            cap,
            seeds_skipped,
            "Discovery finished"
        );

        Ok(Discovery {
            urls,
            expansion: Some(expansion),
            seeds_skipped,
        })
    }
}

/// Runs one discovery pass with a throwaway coordinator
pub async fn discover_article_urls<L: SessionLauncher>(
    config: Arc<CrawlConfig>,
    client: Client,
    launcher: L,
    cancel: CancellationToken,
) -> Result<Discovery, CrawlError> {
    Coordinator::new(config, client, launcher, cancel)
        .discover_article_urls()
        .await
}
