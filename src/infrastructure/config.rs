//! Configuration infrastructure
//!
//! Contains configuration loading and validation for catalog runs.
//!
//! Sources are layered in this order (later wins):
//! 1. Built-in defaults (`defaults` module)
//! 2. Optional config file (explicit path, else the user config directory)
//! 3. `PARTS_CATALOG__SECTION__KEY` environment variables

#![allow(clippy::uninlined_format_args)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::domain::Price;
use crate::infrastructure::parsing::{ExtractionLimits, PartPageRules};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    FileLoad {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },

    #[error("Failed to locate user config directory")]
    NoConfigDir,
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scrape: ScrapeConfig,
    pub http: HttpConfig,
    pub extraction: ExtractionLimits,
    pub rules: PartPageRules,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

/// Worker pool and candidate URL settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Site root substituted for `{base}` in candidate templates
    pub base_url: String,

    /// Maximum resolutions in flight
    pub concurrency: usize,

    /// Minimum gap between the starts of one worker's fetches
    pub politeness_delay_ms: u64,

    /// Per-attempt bound
    pub fetch_timeout_ms: u64,

    /// Tried in order; placeholders `{base}` `{id}` `{brand}` `{mfr}` `{name}`
    pub candidate_templates: Vec<String>,
}

impl ScrapeConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

/// HTTP adapter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,

    /// Process-wide request budget shared by every worker
    pub max_requests_per_second: u32,

    pub follow_redirects: bool,
}

/// Output and data file locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub output_path: PathBuf,

    /// Reference table; the bundled table is used when unset
    pub reference_path: Option<PathBuf>,

    /// Identifier sources; the bundled known-part lists are used when unset
    pub sources_path: Option<PathBuf>,

    /// Price applied to records whose page carried none. Unset leaves them absent.
    pub price_fallback: Option<Price>,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    pub console_output: bool,
    pub file_output: bool,

    /// Directory for rolling log files; defaults to `<data dir>/parts-catalog/logs`
    pub log_dir: Option<PathBuf>,

    pub file_prefix: String,

    /// Module-specific log level filters (e.g., "reqwest": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            concurrency: defaults::CONCURRENCY,
            politeness_delay_ms: defaults::POLITENESS_DELAY_MS,
            fetch_timeout_ms: defaults::FETCH_TIMEOUT_MS,
            candidate_templates: defaults::CANDIDATE_TEMPLATES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            follow_redirects: true,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(defaults::OUTPUT_PATH),
            reference_path: None,
            sources_path: None,
            price_fallback: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
            file_prefix: defaults::LOG_FILE_PREFIX.to_string(),
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "warn".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("h2".to_string(), "warn".to_string());
                filters.insert("html5ever".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

impl AppConfig {
    /// Load defaults, then `path` (or the user config file when `None`), then env.
    ///
    /// An explicit path must exist; the implicit user file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (file, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (ConfigManager::new()?.config_path, false),
        };

        let settings = config::Config::builder()
            .add_source(config::File::with_name(&file.to_string_lossy()).required(required))
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;

        info!("Configuration loaded (file: {}, required: {})", file.display(), required);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| Err(ConfigError::Validation { message: message.to_string() });

        if self.scrape.concurrency == 0 {
            return invalid("scrape.concurrency must be at least 1");
        }
        if self.scrape.fetch_timeout_ms == 0 {
            return invalid("scrape.fetch_timeout_ms must be greater than 0");
        }
        if self.scrape.candidate_templates.is_empty() {
            return invalid("scrape.candidate_templates must not be empty");
        }
        if url::Url::parse(&self.scrape.base_url).is_err() {
            return Err(ConfigError::Validation {
                message: format!("scrape.base_url '{}' is not a valid URL", self.scrape.base_url),
            });
        }
        if self.http.max_requests_per_second == 0 {
            return invalid("http.max_requests_per_second must be at least 1");
        }
        if self.extraction.min_description_chars > self.extraction.max_description_chars {
            return invalid("extraction.min_description_chars exceeds max_description_chars");
        }

        Ok(())
    }
}

/// Locates the user-level config file and data directory
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(defaults::APP_DIR_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn new() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE_STEM);
        Ok(Self { config_path })
    }

    /// Application data directory, falling back to the working directory
    pub fn get_app_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|dir| dir.join(defaults::APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Default configuration values
pub mod defaults {
    pub const APP_DIR_NAME: &str = "parts-catalog";

    /// File stem; any extension the `config` crate understands is accepted
    pub const CONFIG_FILE_STEM: &str = "config";

    pub const ENV_PREFIX: &str = "PARTS_CATALOG";

    pub const BASE_URL: &str = "https://www.partselect.com";

    pub const CANDIDATE_TEMPLATES: &[&str] = &[
        "{base}/{id}.htm",
        "{base}/{id}-{brand}-{mfr}.htm",
        "{base}/{id}-{brand}-{mfr}-{name}.htm",
    ];

    pub const CONCURRENCY: usize = 5;

    pub const POLITENESS_DELAY_MS: u64 = 500;

    pub const FETCH_TIMEOUT_MS: u64 = 15_000;

    pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    pub const MAX_REQUESTS_PER_SECOND: u32 = 4;

    pub const OUTPUT_PATH: &str = "parts_catalog.json";

    // Log configuration defaults
    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const LOG_FILE_PREFIX: &str = "parts-catalog.log";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scrape.candidate_templates.len(), 3);
        assert_eq!(config.catalog.price_fallback, None);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = AppConfig::default();
        config.scrape.concurrency = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[scrape]
concurrency = 2
politeness_delay_ms = 0

[catalog]
price_fallback = 29.99
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.scrape.concurrency, 2);
        assert_eq!(config.scrape.politeness_delay(), Duration::ZERO);
        assert_eq!(config.scrape.base_url, defaults::BASE_URL);
        assert_eq!(config.catalog.price_fallback.map(Price::cents), Some(2999));
        assert_eq!(config.extraction, ExtractionLimits::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/parts-catalog.toml")));
        assert!(matches!(result, Err(ConfigError::FileLoad { .. })));
    }
}
