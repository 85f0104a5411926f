//! Article link discovery
//!
//! This module scans a feed snapshot for article previews and hands out
//! their links one at a time:
//! - Previews are read in document order
//! - The first `<a href>` of each preview is its article link
//! - Relative links are resolved against the site's base origin

use crate::state::DiscoveredUrlSet;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Article links found in a feed snapshot, in document order
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    links: Vec<String>,
}

impl FeedSnapshot {
    /// Parses the snapshot markup and collects one link per preview element
    ///
    /// # Arguments
    ///
    /// * `markup` - The expanded feed HTML
    /// * `base_url` - Origin that relative links are resolved against
    /// * `preview_selector` - CSS selector matching one element per preview
    ///
    /// # Returns
    ///
    /// * `Ok(FeedSnapshot)` - Links in document order (may be empty)
    /// * `Err(String)` - The preview selector is not valid CSS
    ///
    /// # Example
    ///
    /// ```
    /// use newsreap::crawler::FeedSnapshot;
    /// use url::Url;
    ///
    /// let html = r#"<div class="card"><a href="/news/1">One</a></div>"#;
    /// let base_url = Url::parse("https://example.com/").unwrap();
    /// let snapshot = FeedSnapshot::parse(html, &base_url, ".card").unwrap();
    /// assert_eq!(snapshot.links(), ["https://example.com/news/1"]);
    /// ```
    pub fn parse(markup: &str, base_url: &Url, preview_selector: &str) -> Result<Self, String> {
        let preview_selector = Selector::parse(preview_selector)
            .map_err(|e| format!("invalid preview selector '{}': {:?}", preview_selector, e))?;
        let link_selector =
            Selector::parse("a[href]").map_err(|e| format!("invalid link selector: {:?}", e))?;

        let document = Html::parse_document(markup);

        let links = document
            .select(&preview_selector)
            .filter_map(|preview| preview_href(preview, &link_selector))
            .filter_map(|href| resolve_link(href, base_url))
            .collect();

        Ok(Self { links })
    }

    /// Returns the first preview link not yet in `seen`, or `None` when every
    /// preview has been taken
    pub fn next_unseen(&self, seen: &DiscoveredUrlSet) -> Option<&str> {
        self.links
            .iter()
            .map(String::as_str)
            .find(|link| !seen.contains(link))
    }

    /// All preview links, in document order
    pub fn links(&self) -> &[String] {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// The href of a preview: the preview itself when it is a link, otherwise its
/// first descendant link
fn preview_href<'a>(preview: ElementRef<'a>, link_selector: &Selector) -> Option<&'a str> {
    if preview.value().name() == "a" {
        if let Some(href) = preview.value().attr("href") {
            return Some(href);
        }
    }

    preview
        .select(link_selector)
        .next()
        .and_then(|link| link.value().attr("href"))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url.to_string())
    } else {
        None
    }
}
