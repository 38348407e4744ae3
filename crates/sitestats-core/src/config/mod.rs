//! Configuration system for sitestats.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{SiteStatsError, StatsResult};

/// Store and import configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database.
    pub database_path: PathBuf,
    /// Rows between progress log lines during CSV import.
    pub import_batch_size: usize,
    /// Site type applied when an import row leaves it blank.
    pub default_site_type: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|h| h.join(".sitestats"))
            .unwrap_or_else(|| PathBuf::from(".sitestats"));

        Self {
            database_path: data_dir.join("sites.db"),
            import_batch_size: 500,
            default_site_type: "General".to_string(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> StatsResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| SiteStatsError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| SiteStatsError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| SiteStatsError::Configuration(e.to_string())),
            _ => Err(SiteStatsError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `SITESTATS_*` environment overrides on top of this configuration.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("SITESTATS_DB_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(size) = std::env::var("SITESTATS_IMPORT_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.import_batch_size = size;
        }
        self
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }
}

/// Builder for StoreConfig.
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set database path.
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database_path = path.into();
        self
    }

    /// Set import progress batch size.
    pub fn import_batch_size(mut self, size: usize) -> Self {
        self.config.import_batch_size = size.max(1);
        self
    }

    /// Set default site type.
    pub fn default_site_type(mut self, site_type: impl Into<String>) -> Self {
        self.config.default_site_type = site_type.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> StoreConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert!(config.database_path.ends_with(".sitestats/sites.db"));
        assert_eq!(config.default_site_type, "General");
        assert_eq!(config.import_batch_size, 500);
    }

    #[test]
    fn test_from_toml_file_with_partial_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitestats.toml");
        std::fs::write(&path, "database_path = \"/tmp/x.db\"\n").unwrap();

        let config = StoreConfig::from_file(&path).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.import_batch_size, 500);
    }

    #[test]
    fn test_from_yaml_and_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("c.yaml");
        std::fs::write(&yaml, "import_batch_size: 10\n").unwrap();
        assert_eq!(StoreConfig::from_file(&yaml).unwrap().import_batch_size, 10);

        let json = dir.path().join("c.json");
        std::fs::write(&json, r#"{"default_site_type":"Research"}"#).unwrap();
        assert_eq!(
            StoreConfig::from_file(&json).unwrap().default_site_type,
            "Research"
        );
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.ini");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            StoreConfig::from_file(&path),
            Err(SiteStatsError::Configuration(_))
        ));
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::builder()
            .database_path("/data/sites.db")
            .import_batch_size(0)
            .default_site_type("Research")
            .build();
        assert_eq!(config.database_path, PathBuf::from("/data/sites.db"));
        assert_eq!(config.import_batch_size, 1);
        assert_eq!(config.default_site_type, "Research");
    }
}
