use crate::config::types::CrawlConfig;
use crate::config::validation::validate;
use crate::ConfigError;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and validates a crawl descriptor from the given path
///
/// Files ending in `.toml` are read as TOML; everything else is read as JSON.
///
/// # Arguments
///
/// * `path` - Path to the descriptor
///
/// # Returns
///
/// * `Ok(CrawlConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to read, parse, or validate the descriptor
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use newsreap::config::load_config;
///
/// let config = load_config(Path::new("scraper_config.json")).unwrap();
/// println!("Seeds: {:?}", config.seed_urls);
/// ```
pub fn load_config(path: &Path) -> Result<CrawlConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let raw = parse_descriptor(&content, is_toml)?;

    validate(&raw)
}

/// Parses descriptor text into a raw key/value mapping
///
/// Fails with [`ConfigError::Format`] when the text is not valid JSON/TOML or
/// its top level is not a mapping.
pub fn parse_descriptor(content: &str, is_toml: bool) -> Result<Map<String, Value>, ConfigError> {
    let value: Value = if is_toml {
        let table: toml::Table = toml::from_str(content)?;
        serde_json::to_value(table)?
    } else {
        serde_json::from_str(content)?
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(ConfigError::Format(format!(
            "descriptor must be a mapping, got {}",
            json_type_name(&other)
        ))),
    }
}

/// Computes a SHA-256 hash of the descriptor content
///
/// Logged at startup and written into the run summary so two runs can be
/// matched to the configuration that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(CrawlConfig, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn create_temp_config(content: &str, suffix: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_JSON: &str = r#"{
        "seed_urls": ["https://www.iguides.ru/"],
        "headers": {"user-agent": "Mozilla/5.0"},
        "total_articles": 5,
        "encoding": "utf-8",
        "timeout": 10,
        "should_verify_certificate": true,
        "headless_mode": true
    }"#;

    #[test]
    fn test_load_valid_json_config() {
        let file = create_temp_config(VALID_JSON, ".json");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.seed_urls, vec!["https://www.iguides.ru/".to_string()]);
        assert_eq!(config.total_articles, 5);
        assert_eq!(config.timeout, 10);
        assert_eq!(
            config.headers.get("user-agent").map(String::as_str),
            Some("Mozilla/5.0")
        );
    }

    #[test]
    fn test_load_valid_toml_config() {
        let config_content = r#"
seed_urls = ["http://news.example.com/"]
total_articles = 3
encoding = "utf-8"
timeout = 5
should_verify_certificate = false
headless_mode = true

[headers]
accept = "text/html"

[pagination]
min_pause_secs = 0
max_pause_secs = 1
"#;

        let file = create_temp_config(config_content, ".toml");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.total_articles, 3);
        assert!(!config.should_verify_certificate);
        assert_eq!(config.pagination.max_pause_secs, 1);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_json() {
        let file = create_temp_config("this is not JSON {{{", ".json");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Format(_))));
    }

    #[test]
    fn test_descriptor_must_be_mapping() {
        let result = parse_descriptor("[1, 2, 3]", false);
        assert!(matches!(result, Err(ConfigError::Format(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = VALID_JSON.replace("\"timeout\": 10", "\"timeout\": 61");
        let file = create_temp_config(&content, ".json");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::InvalidTimeout(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content", ".json");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_load_config_with_hash() {
        let file = create_temp_config(VALID_JSON, ".json");
        let (config, hash) = load_config_with_hash(file.path()).unwrap();

        assert_eq!(config.encoding, "utf-8");
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
    }
}
