use crate::config::parser::json_type_name;
use crate::config::types::{
    CrawlConfig, PaginationConfig, RetryConfig, SiteProfile, MAX_ARTICLES, MAX_TIMEOUT_SECS,
};
use crate::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderName, HeaderValue};
use scraper::Selector;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use url::Url;

static SEED_URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://").expect("seed URL pattern is valid"));

const MAX_CONCURRENCY: u64 = 16;

/// Validates a raw descriptor mapping into a [`CrawlConfig`]
///
/// Checks run in a fixed order and stop at the first failure, so the error
/// returned always names the earliest offending field:
/// seed URLs, article count, headers, encoding, timeout, headless mode,
/// certificate verification, then the optional sections.
pub fn validate(raw: &Map<String, Value>) -> Result<CrawlConfig, ConfigError> {
    let seed_urls = validate_seed_urls(raw.get("seed_urls"))?;
    let total_articles = validate_article_count(raw.get("total_articles"))?;
    let headers = validate_headers(raw.get("headers"))?;
    let encoding = validate_encoding(raw.get("encoding"))?;
    let timeout = validate_timeout(raw.get("timeout"))?;
    let headless_mode = validate_flag("headless_mode", raw.get("headless_mode"))?;
    let should_verify_certificate = validate_flag(
        "should_verify_certificate",
        raw.get("should_verify_certificate"),
    )?;

    let site: SiteProfile = optional_section(raw, "site")?;
    validate_site(&site)?;

    let pagination: PaginationConfig = optional_section(raw, "pagination")?;
    validate_pagination(&pagination)?;

    let retry: RetryConfig = optional_section(raw, "retry")?;
    validate_retry(&retry)?;

    let concurrency = validate_concurrency(raw.get("concurrency"))?;

    Ok(CrawlConfig {
        seed_urls,
        headers,
        total_articles,
        timeout,
        encoding,
        headless_mode,
        should_verify_certificate,
        site,
        pagination,
        retry,
        concurrency,
    })
}

fn validate_seed_urls(value: Option<&Value>) -> Result<Vec<String>, ConfigError> {
    let items = match value {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(ConfigError::InvalidSeedUrl(format!(
                "seed_urls must be a list, got {}",
                json_type_name(other)
            )))
        }
        None => {
            return Err(ConfigError::InvalidSeedUrl(
                "seed_urls is missing".to_string(),
            ))
        }
    };

    let mut seeds = Vec::with_capacity(items.len());
    for item in items {
        let url = item.as_str().ok_or_else(|| {
            ConfigError::InvalidSeedUrl(format!(
                "seed URL must be a string, got {}",
                json_type_name(item)
            ))
        })?;

        if !SEED_URL_PATTERN.is_match(url) {
            return Err(ConfigError::InvalidSeedUrl(format!(
                "'{}' does not start with http:// or https://",
                url
            )));
        }

        seeds.push(url.to_string());
    }

    Ok(seeds)
}

fn validate_article_count(value: Option<&Value>) -> Result<usize, ConfigError> {
    let number = match value {
        Some(Value::Number(number)) => number,
        // JSON booleans are never counts, even where a host language treats them as 0/1
        Some(Value::Bool(_)) => {
            return Err(ConfigError::InvalidArticleCount(
                "total_articles must be an integer, got boolean".to_string(),
            ))
        }
        Some(other) => {
            return Err(ConfigError::InvalidArticleCount(format!(
                "total_articles must be an integer, got {}",
                json_type_name(other)
            )))
        }
        None => {
            return Err(ConfigError::InvalidArticleCount(
                "total_articles is missing".to_string(),
            ))
        }
    };

    match number.as_u64() {
        Some(count) if count > MAX_ARTICLES => Err(ConfigError::ArticleCountRange {
            count,
            max: MAX_ARTICLES,
        }),
        Some(count) => Ok(count as usize),
        None if number.is_i64() => Err(ConfigError::InvalidArticleCount(format!(
            "total_articles must be >= 0, got {}",
            number
        ))),
        None => Err(ConfigError::InvalidArticleCount(format!(
            "total_articles must be an integer, got {}",
            number
        ))),
    }
}

fn validate_headers(value: Option<&Value>) -> Result<BTreeMap<String, String>, ConfigError> {
    let map = match value {
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(ConfigError::InvalidHeaders(format!(
                "headers must be a mapping, got {}",
                json_type_name(other)
            )))
        }
        None => {
            return Err(ConfigError::InvalidHeaders(
                "headers is missing".to_string(),
            ))
        }
    };

    let mut headers = BTreeMap::new();
    for (name, value) in map {
        let value = value.as_str().ok_or_else(|| {
            ConfigError::InvalidHeaders(format!(
                "header '{}' must be a string, got {}",
                name,
                json_type_name(value)
            ))
        })?;

        HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ConfigError::InvalidHeaders(format!("'{}' is not a valid header name", name))
        })?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::InvalidHeaders(format!("header '{}' has an invalid value", name))
        })?;

        headers.insert(name.clone(), value.to_string());
    }

    Ok(headers)
}

fn validate_encoding(value: Option<&Value>) -> Result<String, ConfigError> {
    match value {
        Some(Value::String(encoding)) => Ok(encoding.clone()),
        Some(other) => Err(ConfigError::InvalidEncoding(format!(
            "encoding must be a string, got {}",
            json_type_name(other)
        ))),
        None => Err(ConfigError::InvalidEncoding(
            "encoding is missing".to_string(),
        )),
    }
}

fn validate_timeout(value: Option<&Value>) -> Result<u64, ConfigError> {
    let timeout = match value {
        Some(Value::Number(number)) => number.as_u64(),
        Some(other) => {
            return Err(ConfigError::InvalidTimeout(format!(
                "timeout must be an integer, got {}",
                json_type_name(other)
            )))
        }
        None => {
            return Err(ConfigError::InvalidTimeout(
                "timeout is missing".to_string(),
            ))
        }
    };

    match timeout {
        Some(secs) if secs <= MAX_TIMEOUT_SECS => Ok(secs),
        _ => Err(ConfigError::InvalidTimeout(format!(
            "timeout must be an integer between 0 and {} seconds, got {}",
            MAX_TIMEOUT_SECS,
            value.map(Value::to_string).unwrap_or_default()
        ))),
    }
}

fn validate_flag(field: &'static str, value: Option<&Value>) -> Result<bool, ConfigError> {
    match value {
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(other) => Err(ConfigError::InvalidFlag {
            field,
            reason: format!("must be a boolean, got {}", json_type_name(other)),
        }),
        None => Err(ConfigError::InvalidFlag {
            field,
            reason: "is missing".to_string(),
        }),
    }
}

/// Deserializes an optional section, falling back to its defaults when absent
fn optional_section<T>(raw: &Map<String, Value>, key: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    match raw.get(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| ConfigError::Validation(format!("invalid '{}' section: {}", key, e))),
    }
}

fn validate_site(site: &SiteProfile) -> Result<(), ConfigError> {
    let selectors = [
        ("preview", &site.preview),
        ("reveal_control", &site.reveal_control),
        ("title", &site.title),
        ("body", &site.body),
        ("author", &site.author),
        ("date", &site.date),
        ("topics", &site.topics),
    ];

    for (name, selector) in selectors {
        Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
            field: name,
            selector: selector.clone(),
        })?;
    }

    for (name, url) in [("landing_url", &site.landing_url), ("base_url", &site.base_url)] {
        if let Some(url) = url {
            let parsed = Url::parse(url).map_err(|e| {
                ConfigError::Validation(format!("site.{} '{}' is invalid: {}", name, url, e))
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(ConfigError::Validation(format!(
                    "site.{} '{}' must use http or https",
                    name, url
                )));
            }
        }
    }

    Ok(())
}

fn validate_pagination(pagination: &PaginationConfig) -> Result<(), ConfigError> {
    if pagination.min_pause_secs > pagination.max_pause_secs {
        return Err(ConfigError::Validation(format!(
            "pagination.min_pause_secs ({}) must not exceed max_pause_secs ({})",
            pagination.min_pause_secs, pagination.max_pause_secs
        )));
    }

    Ok(())
}

fn validate_retry(retry: &RetryConfig) -> Result<(), ConfigError> {
    if !retry.backoff_multiplier.is_finite() || retry.backoff_multiplier < 1.0 {
        return Err(ConfigError::Validation(format!(
            "retry.backoff_multiplier must be >= 1.0, got {}",
            retry.backoff_multiplier
        )));
    }

    if retry.initial_delay_ms > retry.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "retry.initial_delay_ms ({}) must not exceed max_delay_ms ({})",
            retry.initial_delay_ms, retry.max_delay_ms
        )));
    }

    Ok(())
}

fn validate_concurrency(value: Option<&Value>) -> Result<usize, ConfigError> {
    match value {
        None | Some(Value::Null) => Ok(1),
        Some(Value::Number(number)) => match number.as_u64() {
            Some(n) if (1..=MAX_CONCURRENCY).contains(&n) => Ok(n as usize),
            _ => Err(ConfigError::Validation(format!(
                "concurrency must be between 1 and {}, got {}",
                MAX_CONCURRENCY, number
            ))),
        },
        Some(other) => Err(ConfigError::Validation(format!(
            "concurrency must be an integer, got {}",
            json_type_name(other)
        ))),
    }
}
