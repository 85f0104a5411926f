//! Article record types

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Canonical rendering of article timestamps
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Publication date of an article
///
/// Either a timestamp normalized to [`DATE_FORMAT`] or an explicit marker for
/// pages whose date could not be read. Raw page strings never end up here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArticleDate {
    Known(NaiveDateTime),
    Unknown,
}

impl ArticleDate {
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// The timestamp, if the date was read
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Known(datetime) => Some(*datetime),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for ArticleDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(datetime) => write!(f, "{}", datetime.format(DATE_FORMAT)),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl Serialize for ArticleDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One extracted article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRecord {
    /// 1-based position in discovery order, unique within a run
    pub id: usize,

    pub url: String,

    pub title: String,

    /// Body text blocks joined with newlines
    pub text: String,

    pub date: ArticleDate,

    /// Absent when the page names no author
    pub author: Option<String>,

    pub topics: BTreeSet<String>,
}
