//! Output module for storing articles and reporting on runs
//!
//! This module handles:
//! - Preparing a clean output directory
//! - Writing article records through an [`ArticleSink`]
//! - Generating a markdown summary of the run

mod files;
mod markdown;
mod traits;

pub use files::{prepare_environment, FileSink};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use traits::{ArticleFailure, ArticleSink, OutputError, OutputResult, RunSummary};
