//! Parts Catalog - appliance part page scraping pipeline
//!
//! Resolves known part identifiers into structured catalog records by
//! fetching each part's page, running per-field extraction cascades and
//! merging results from several identifier sources.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{CatalogPipeline, IdentifierSource, PipelineSummary};
pub use domain::{PartIdentifier, PartRecord};
