//! HTML extraction infrastructure for part detail pages
//!
//! Selectors and anchor phrases are configuration (`config`), each field is
//! an ordered cascade of named strategies (`cascade`, `strategies`), and
//! `PartPageParser` ties them together.

pub mod cascade;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod part_page_parser;
pub mod strategies;

// Re-export public types
pub use cascade::{Extracted, Extraction, FieldCascade, Strategy};
pub use config::{CompiledRules, ExtractionLimits, PartPageRules};
pub use context::ExtractionContext;
pub use document::check_markup;
pub use error::ParserBuildError;
pub use part_page_parser::{ExtractedFields, FieldCascades, PartField, PartPageParser};
