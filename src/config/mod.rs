//! Configuration loading and validation.
//!
//! Layers, later wins: built-in defaults, an optional TOML file, then
//! `MATCH_TRACKER__*` environment variables (`__` separates sections, e.g.
//! `MATCH_TRACKER__SERVER__PORT=9000`).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::calculate::StatsSettings;
use crate::models::{builtin_seasons, Season, SeasonTable};
use crate::normalize::QueueNames;
use crate::storage::StorageConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to load config: {0}")]
    LoadError(#[from] ::config::ConfigError),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Built frontend to serve for non-API paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            static_dir: None,
        }
    }
}

/// Queue labels with special meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_ranked_queue")]
    pub ranked: String,

    /// Queue whose score counts as a highscore
    #[serde(default = "default_special_queue")]
    pub special: String,
}

fn default_ranked_queue() -> String {
    "Rangliste".to_string()
}

fn default_special_queue() -> String {
    "Stadion".to_string()
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            ranked: default_ranked_queue(),
            special: default_special_queue(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Players tracked by the dashboard, in display order
    #[serde(default = "default_roster")]
    pub roster: Vec<String>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub queues: QueueConfig,

    #[serde(default = "builtin_seasons")]
    pub seasons: Vec<Season>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_roster() -> Vec<String> {
    vec!["Pudel".to_string(), "Nora".to_string(), "Philipp".to_string()]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            roster: default_roster(),
            server: ServerConfig::default(),
            queues: QueueConfig::default(),
            seasons: builtin_seasons(),
        }
    }
}

impl AppConfig {
    /// Load from an optional TOML file plus the environment, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(true),
            );
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix("MATCH_TRACKER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Write as TOML, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.roster.is_empty() {
            return Err(ConfigError::ValidationError(
                "Roster must name at least one player".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in &self.roster {
            if name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "Roster names must not be blank".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "Roster lists {} twice",
                    name
                )));
            }
        }

        if self.queues.ranked.trim().is_empty() || self.queues.special.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Queue names must not be empty".to_string(),
            ));
        }

        self.season_table()?;
        Ok(())
    }

    pub fn season_table(&self) -> Result<SeasonTable, ConfigError> {
        SeasonTable::new(self.seasons.clone())
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    pub fn queue_names(&self) -> QueueNames {
        QueueNames {
            ranked: self.queues.ranked.clone(),
            special: self.queues.special.clone(),
        }
    }

    pub fn stats_settings(&self) -> StatsSettings {
        StatsSettings {
            roster: self.roster.clone(),
            special_queue: self.queues.special.clone(),
        }
    }

    pub fn storage(&self) -> StorageConfig {
        StorageConfig::new(self.data_dir.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.roster, vec!["Pudel", "Nora", "Philipp"]);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.queues.special, "Stadion");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_roster() {
        let mut config = AppConfig::default();
        config.roster.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.roster.push("Nora".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Nora"));
    }

    #[test]
    fn test_validate_rejects_unordered_seasons() {
        let mut config = AppConfig::default();
        config.seasons = vec![
            Season::new("B", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
            Season::new("A", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        ];
        assert!(config.validate().is_err());

        config.seasons.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_queue() {
        let mut config = AppConfig::default();
        config.queues.ranked = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/srv/tracker"
roster = ["Ana", "Bo"]

[server]
port = 9000

[[seasons]]
label = "Spring"
start = "2024-03-01"

[[seasons]]
label = "Autumn"
start = "2024-09-01"
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/tracker"));
        assert_eq!(config.roster, vec!["Ana", "Bo"]);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.queues.ranked, "Rangliste");
        assert_eq!(config.season_table().unwrap().all().len(), 2);
        assert_eq!(config.stats_settings().roster.len(), 2);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.roster, vec!["Pudel", "Nora", "Philipp"]);
        assert_eq!(config.season_table().unwrap().all().len(), 19);
    }

    #[test]
    fn test_write_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.server.port = 3001;
        config.write_to(&path).unwrap();

        let loaded = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.server.port, 3001);
        assert_eq!(loaded.seasons, config.seasons);
        assert_eq!(loaded.roster, config.roster);
    }
}
