use std::collections::HashSet;

/// Outcome of offering a URL to a [`DiscoveredUrlSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The URL was new and has been appended
    Added,

    /// The URL was already in the set
    Duplicate,

    /// The set had reached its cap; nothing was added
    Full,
}

/// Insertion-ordered set of unique article URLs with a size cap
///
/// No URL is ever stored twice and the set never grows past `cap`.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredUrlSet {
    urls: Vec<String>,
    seen: HashSet<String>,
    cap: usize,
}

impl DiscoveredUrlSet {
    /// Creates an empty set that holds at most `cap` URLs
    pub fn new(cap: usize) -> Self {
        Self {
            urls: Vec::with_capacity(cap),
            seen: HashSet::with_capacity(cap),
            cap,
        }
    }

    /// Appends `url` unless it is already present or the set is full
    pub fn insert(&mut self, url: impl Into<String>) -> InsertOutcome {
        if self.is_full() {
            return InsertOutcome::Full;
        }

        let url = url.into();
        if self.seen.contains(&url) {
            return InsertOutcome::Duplicate;
        }

        self.seen.insert(url.clone());
        self.urls.push(url);
        InsertOutcome::Added
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Returns true once the cap has been reached
    pub fn is_full(&self) -> bool {
        self.urls.len() >= self.cap
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    /// Freezes the set into its URLs, in discovery order
    pub fn into_vec(self) -> Vec<String> {
        self.urls
    }
}
