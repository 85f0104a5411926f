//! Configuration module
//!
//! This module loads the crawl descriptor (JSON, or TOML by extension) and
//! validates it field by field into an immutable [`CrawlConfig`].
//!
//! # Example
//!
//! ```no_run
//! use newsreap::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scraper_config.json")).unwrap();
//! println!("Will collect up to {} articles", config.total_articles);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CrawlConfig, PaginationConfig, RetryConfig, SiteProfile, MAX_ARTICLES, MAX_TIMEOUT_SECS,
};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_descriptor};
pub use validation::validate;
