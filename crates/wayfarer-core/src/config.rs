use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Durable backing for saved places
    #[serde(default)]
    pub storage: StorageConfig,

    /// Favourites and history bounds
    #[serde(default)]
    pub preferences: PreferencesConfig,

    /// Location search settings
    #[serde(default)]
    pub search: SearchConfig,
}

/// Which durable backing the preference stores write through to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    File,
    /// Process-local only; nothing survives a restart.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// SQLite database file, relative to the config directory
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Directory for the file backing, relative to the config directory
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_database_file() -> String {
    "preferences.db".to_string()
}

fn default_data_dir() -> String {
    "places".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_file: default_database_file(),
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    pub fn database_path(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(&self.database_file)
    }

    pub fn data_path(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(&self.data_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// Maximum number of pinned favourites (oldest are kept when full)
    #[serde(default = "default_favourites_limit")]
    pub favourites_limit: usize,

    /// Maximum number of history entries (newest are kept when full)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_favourites_limit() -> usize {
    10
}

fn default_history_limit() -> usize {
    10
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            favourites_limit: default_favourites_limit(),
            history_limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the Open-Meteo geocoding API
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    /// Queries shorter than this never reach the geocoder
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,

    /// How long a successful lookup is reused, in seconds (0 disables caching)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Number of candidates requested per lookup
    #[serde(default = "default_result_count")]
    pub result_count: u32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com".to_string()
}

fn default_min_query_len() -> usize {
    3
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_result_count() -> u32 {
    5
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            min_query_len: default_min_query_len(),
            cache_ttl_secs: default_cache_ttl_secs(),
            result_count: default_result_count(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SearchConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            storage: StorageConfig::default(),
            preferences: PreferencesConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wayfarer")
}

/// Limits above this are allowed but probably a typo
const LIMIT_WARNING_THRESHOLD: usize = 100;

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit file path, creating a default file if absent
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let mut config = Self::default();
            if let Some(parent) = config_path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)?;

        let config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_limit(
            self.preferences.favourites_limit,
            "preferences.favourites_limit",
            &mut result,
        );
        Self::validate_limit(
            self.preferences.history_limit,
            "preferences.history_limit",
            &mut result,
        );

        self.validate_url(&self.search.geocoding_url, "search.geocoding_url", &mut result);

        if self.search.min_query_len == 0 {
            result.add_warning(
                "search.min_query_len",
                "Empty queries will be sent to the geocoder",
            );
        }

        if self.search.cache_ttl_secs == 0 {
            result.add_warning("search.cache_ttl_secs", "Search result caching disabled");
        }

        if self.search.result_count == 0 {
            result.add_error("search.result_count", "Result count must be greater than 0");
        }

        if self.search.request_timeout_secs == 0 {
            result.add_error(
                "search.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if self.storage.backend == StorageBackend::Memory {
            result.add_warning(
                "storage.backend",
                "Memory backing selected - favourites and history will not survive a restart",
            );
        }

        result
    }

    fn validate_limit(limit: usize, field_name: &str, result: &mut ValidationResult) {
        if limit == 0 {
            result.add_error(field_name, "Limit must be greater than 0");
        } else if limit > LIMIT_WARNING_THRESHOLD {
            result.add_warning(
                field_name,
                format!("Limit is unusually large (>{})", LIMIT_WARNING_THRESHOLD),
            );
        }
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit file path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        std::fs::write(config_path, contents)?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound("platform config directory".to_string()))?
            .join("wayfarer");

        Ok(config_dir.join("config.toml"))
    }
}
