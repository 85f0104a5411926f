//! On-disk article storage
//!
//! Each record becomes two files in the output directory:
//! - `{id}_raw.txt`: the article text
//! - `{id}_meta.json`: every other field, pretty-printed

use crate::article::ArticleRecord;
use crate::output::traits::{ArticleSink, OutputResult};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata document written next to the raw text
#[derive(Debug, Serialize)]
struct ArticleMeta<'a> {
    id: usize,
    url: &'a str,
    title: &'a str,
    date: String,
    author: Option<&'a str>,
    topics: &'a BTreeSet<String>,
}

/// Writes records as text + JSON file pairs
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    /// Creates a sink writing into `dir`, which must already exist
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the raw text file for article `id`
    pub fn raw_path(&self, id: usize) -> PathBuf {
        self.dir.join(format!("{}_raw.txt", id))
    }

    /// Path of the metadata file for article `id`
    pub fn meta_path(&self, id: usize) -> PathBuf {
        self.dir.join(format!("{}_meta.json", id))
    }
}

impl ArticleSink for FileSink {
    fn store(&mut self, record: &ArticleRecord) -> OutputResult<()> {
        fs::write(self.raw_path(record.id), &record.text)?;

        let meta = ArticleMeta {
            id: record.id,
            url: &record.url,
            title: &record.title,
            date: record.date.to_string(),
            author: record.author.as_deref(),
            topics: &record.topics,
        };
        let json = serde_json::to_string_pretty(&meta)?;
        fs::write(self.meta_path(record.id), json)?;

        tracing::debug!(id = record.id, dir = %self.dir.display(), "Stored article");
        Ok(())
    }
}

/// Prepares a clean output directory
///
/// Removes `path` with everything in it if it exists, then creates it empty.
pub fn prepare_environment(path: &Path) -> OutputResult<()> {
    if path.exists() {
        if path.is_dir() {
            fs::remove_dir_all(path)?;
        } else {
            fs::remove_file(path)?;
        }
    }
    fs::create_dir_all(path)?;
    Ok(())
}
