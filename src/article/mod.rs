//! Article extraction
//!
//! # Components
//!
//! - `ArticleRecord` / `ArticleDate`: the normalized output of one article page
//! - `ArticleExtractor`: fetches a page and pulls title, body, author, topics and date
//! - `normalize_date`: folds site-specific date strings into one timestamp form

mod date;
mod extractor;
mod record;

pub use date::normalize_date;
pub use extractor::ArticleExtractor;
pub use record::{ArticleDate, ArticleRecord, DATE_FORMAT};
