//! Crawler module for article URL discovery
//!
//! This module contains the discovery side of a run, including:
//! - HTTP fetching and the retry policy wrapped around it
//! - Feed expansion through a browsing session
//! - Link extraction from the expanded feed
//! - Overall discovery coordination

pub mod browser;
mod coordinator;
mod fetcher;
mod links;
pub mod pagination;
pub mod retry;

pub use browser::{HttpLauncher, StaticSession};
#[cfg(feature = "browser")]
pub use browser::{ChromeLauncher, ChromeSession};
pub use coordinator::{discover_article_urls, Coordinator, Discovery};
pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use links::FeedSnapshot;
pub use pagination::{
    BrowserSession, ExpansionOutcome, FeedExpansion, PaginationDriver, SessionLauncher,
};
pub use retry::fetch_with_retry;
