//! Configuration for artindex

mod index;
mod logging;
mod opensearch;

pub use index::{validate_index_name, IndexingConfig, DEFAULT_BATCH_SIZE, DEFAULT_INDEX_NAME};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use opensearch::OpenSearchConfig;
pub(crate) use opensearch::redacted;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Search backend connection
    #[serde(default)]
    pub opensearch: OpenSearchConfig,
    /// Indexing run settings
    #[serde(default)]
    pub indexing: IndexingConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.opensearch.resolve_password();
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML, e.g. for writing a starter config
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))
    }

    /// Validate all configuration fields.
    ///
    /// Every problem is collected and reported in one error.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.indexing.batch_size == 0 {
            errors.push("batch_size must be positive".to_string());
        }
        if let Err(e) = validate_index_name(&self.indexing.index_name) {
            errors.push(e);
        }
        if self.indexing.file_extension.trim_start_matches('.').is_empty() {
            errors.push("file_extension must not be empty".to_string());
        }
        if self.indexing.data_dir.as_os_str().is_empty() {
            errors.push("data_dir must not be empty".to_string());
        }

        if self.opensearch.timeout_secs == 0 {
            errors.push("timeout_secs must be positive".to_string());
        }
        match url::Url::parse(&self.opensearch.url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(format!("opensearch url scheme must be http or https, got '{}'", url.scheme())),
            Err(e) => errors.push(format!("opensearch url '{}' is invalid: {}", self.opensearch.url, e)),
        }
        if self.opensearch.password.is_some() && self.opensearch.username.is_none() {
            errors.push("opensearch password is set without a username".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid_config() -> Config {
        Config::default()
    }

    #[test]
    fn default_config_passes_validation() {
        assert!(valid_config().validate().is_ok(), "default config should be valid");
    }

    #[test]
    fn validate_rejects_zero_batch_size() {
        let mut cfg = valid_config();
        cfg.indexing.batch_size = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("batch_size must be positive"));
    }

    #[test]
    fn validate_rejects_bad_index_name() {
        let mut cfg = valid_config();
        cfg.indexing.index_name = "Articles".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("must be lowercase"));
    }

    #[test]
    fn validate_rejects_non_http_url() {
        let mut cfg = valid_config();
        cfg.opensearch.url = "ftp://localhost:9200".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("scheme must be http or https"));
    }

    #[test]
    fn validate_reports_all_errors_together() {
        let mut cfg = valid_config();
        cfg.indexing.batch_size = 0;
        cfg.indexing.index_name = String::new();
        cfg.opensearch.timeout_secs = 0;
        let message = cfg.validate().unwrap_err().to_string();
        assert!(message.contains("batch_size must be positive"));
        assert!(message.contains("index name must not be empty"));
        assert!(message.contains("timeout_secs must be positive"));
    }

    #[test]
    fn load_fills_missing_sections_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[indexing]\nbatch_size = 250\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.indexing.batch_size, 250);
        assert_eq!(config.indexing.index_name, "articles");
        assert_eq!(config.opensearch.url, "http://localhost:9200");
    }

    #[test]
    fn load_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[indexing]\nbatch_size = 0\n").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let text = valid_config().to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.indexing.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(parsed.indexing.index_name, DEFAULT_INDEX_NAME);
    }
}
