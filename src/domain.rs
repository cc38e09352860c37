//! Domain module - part catalog entities and the seams the core depends on
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod fetching;
pub mod part;
pub mod repositories;

pub use fetching::{AttemptError, FetchAttempt, FetchError, FetchFailure, PageFetcher, ScrapeOutcome};
pub use part::{ApplianceCategory, InstallStep, PartIdentifier, PartRecord, Price};
pub use repositories::{CatalogWriteError, CatalogWriter, ReferenceEntry, ReferenceSource};
