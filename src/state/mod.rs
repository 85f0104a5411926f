//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PaginationState`: Tracks the feed expansion loop (idle, loaded, expanding, exhausted, failed)
//! - `DiscoveredUrlSet`: The deduplicated, capped collection of article URLs found so far

mod pagination_state;
mod url_set;

// Re-export main types
pub use pagination_state::PaginationState;
pub use url_set::{DiscoveredUrlSet, InsertOutcome};
