//! Article page extraction
//!
//! Fetches one article page and turns it into an [`ArticleRecord`]. Parsing
//! is synchronous and never holds the DOM across an await point.

use crate::article::date::normalize_date;
use crate::article::record::{ArticleDate, ArticleRecord};
use crate::config::CrawlConfig;
use crate::crawler::retry::fetch_with_retry;
use crate::{ArticleFetchError, ConfigError};
use chrono::{Local, NaiveDateTime};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Compiled selectors for the article template
#[derive(Debug, Clone)]
struct ArticleSelectors {
    title: Selector,
    body: Selector,
    author: Selector,
    date: Selector,
    topics: Selector,
    og_title: Selector,
    html_title: Selector,
    meta_author: Selector,
    meta_keywords: Selector,
    published_time: Selector,
}

impl ArticleSelectors {
    fn compile(config: &CrawlConfig) -> Result<Self, ConfigError> {
        let site = &config.site;
        Ok(Self {
            title: parse_selector("title", &site.title)?,
            body: parse_selector("body", &site.body)?,
            author: parse_selector("author", &site.author)?,
            date: parse_selector("date", &site.date)?,
            topics: parse_selector("topics", &site.topics)?,
            og_title: parse_selector("title", r#"meta[property="og:title"]"#)?,
            html_title: parse_selector("title", "title")?,
            meta_author: parse_selector("author", r#"meta[name="author"]"#)?,
            meta_keywords: parse_selector("topics", r#"meta[name="keywords"]"#)?,
            published_time: parse_selector("date", r#"meta[property="article:published_time"]"#)?,
        })
    }
}

fn parse_selector(field: &'static str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        field,
        selector: selector.to_string(),
    })
}

/// Turns article URLs into records
#[derive(Debug, Clone)]
pub struct ArticleExtractor {
    client: Client,
    config: Arc<CrawlConfig>,
    selectors: ArticleSelectors,
}

impl ArticleExtractor {
    /// Creates an extractor for the site template in `config`
    ///
    /// Fails only if one of the configured selectors is not valid CSS, which
    /// config validation already rules out.
    pub fn new(client: Client, config: Arc<CrawlConfig>) -> Result<Self, ConfigError> {
        let selectors = ArticleSelectors::compile(&config)?;
        Ok(Self {
            client,
            config,
            selectors,
        })
    }

    /// Fetches and extracts one article
    ///
    /// # Arguments
    ///
    /// * `url` - Article page URL
    /// * `id` - 1-based position of the URL in discovery order
    /// * `cancel` - Aborts retry pauses and pending work
    ///
    /// # Returns
    ///
    /// * `Ok(ArticleRecord)` - Fully populated record
    /// * `Err(ArticleFetchError)` - Non-2xx status, transport failure, or a
    ///   page without title or body
    pub async fn extract(
        &self,
        url: &str,
        id: usize,
        cancel: &CancellationToken,
    ) -> Result<ArticleRecord, ArticleFetchError> {
        if cancel.is_cancelled() {
            return Err(ArticleFetchError::Cancelled {
                url: url.to_string(),
            });
        }

        let result = fetch_with_retry(
            &self.client,
            url,
            &self.config.encoding,
            &self.config.retry,
            cancel,
        )
        .await?;

        if !result.is_success() {
            return Err(ArticleFetchError::Status {
                url: url.to_string(),
                status: result.status_code,
            });
        }

        let record = self.parse_article(url, id, &result.body, Local::now().naive_local())?;

        tracing::debug!(
            id,
            %url,
            title = %record.title,
            date = %record.date,
            chars = record.text.len(),
            "Extracted article"
        );

        Ok(record)
    }

    /// Builds a record from already fetched markup
    ///
    /// `now` anchors relative dates such as "5 hours ago".
    pub fn parse_article(
        &self,
        url: &str,
        id: usize,
        html: &str,
        now: NaiveDateTime,
    ) -> Result<ArticleRecord, ArticleFetchError> {
        let document = Html::parse_document(html);
        let selectors = &self.selectors;

        let title = first_text(&document, &selectors.title)
            .or_else(|| meta_content(&document, &selectors.og_title))
            .or_else(|| first_text(&document, &selectors.html_title))
            .ok_or_else(|| ArticleFetchError::MissingContent {
                url: url.to_string(),
                what: "title",
            })?;

        let text = document
            .select(&selectors.body)
            .map(element_text)
            .filter(|block| !block.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            return Err(ArticleFetchError::MissingContent {
                url: url.to_string(),
                what: "body",
            });
        }

        let author = first_text(&document, &selectors.author)
            .or_else(|| meta_content(&document, &selectors.meta_author));

        let mut topics: BTreeSet<String> = document
            .select(&selectors.topics)
            .map(element_text)
            .filter(|topic| !topic.is_empty())
            .collect();

        if let Some(keywords) = meta_content(&document, &selectors.meta_keywords) {
            topics.extend(
                keywords
                    .split(',')
                    .map(str::trim)
                    .filter(|keyword| !keyword.is_empty())
                    .map(str::to_string),
            );
        }

        let date = raw_date(&document, selectors)
            .map(|raw| normalize_date(&raw, now))
            .unwrap_or(ArticleDate::Unknown);

        Ok(ArticleRecord {
            id,
            url: url.to_string(),
            title,
            text,
            date,
            author,
            topics,
        })
    }
}

/// Date element's `datetime` attribute or text, then the Open Graph time
fn raw_date(document: &Html, selectors: &ArticleSelectors) -> Option<String> {
    if let Some(element) = document.select(&selectors.date).next() {
        if let Some(datetime) = element.value().attr("datetime") {
            let datetime = datetime.trim();
            if !datetime.is_empty() {
                return Some(datetime.to_string());
            }
        }
        let text = element_text(element);
        if !text.is_empty() {
            return Some(text);
        }
    }

    meta_content(document, &selectors.published_time)
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

/// Element text with runs of whitespace collapsed to single spaces
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
