//! Infrastructure layer for fetching, parsing, persistence and runtime setup
//!
//! Adapters for the domain seams (HTTP fetcher, JSON catalog writer,
//! reference table) plus HTML extraction, configuration and logging.

pub mod config;  // Layered configuration and defaults
pub mod http_client;  // reqwest + governor page fetcher
pub mod json_catalog_writer;  // Seed-format catalog output
pub mod logging;  // Logging infrastructure
pub mod parsing;  // Part page extraction cascades
pub mod reference_table;  // Versioned enrichment data

// Re-export commonly used items
pub use config::{AppConfig, CatalogConfig, ConfigError, ConfigManager, HttpConfig, LoggingConfig, ScrapeConfig};
pub use http_client::HttpPageFetcher;
pub use json_catalog_writer::{JsonCatalogWriter, SeedCatalog, SeedPart};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use parsing::{ExtractedFields, ExtractionLimits, ParserBuildError, PartField, PartPageParser, PartPageRules};
pub use reference_table::{ReferenceError, ReferenceTable};
