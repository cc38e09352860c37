//! Repository interfaces for catalog persistence and reference data
//!
//! The core only depends on these traits; adapters live in `infrastructure`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::part::PartRecord;

#[derive(Error, Debug)]
pub enum CatalogWriteError {
    #[error("failed to write catalog to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Sink for the final, ordered record list
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    async fn write(&self, records: &[PartRecord]) -> Result<(), CatalogWriteError>;
}

/// Known facts about one part, used to backfill fields the page did not yield
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    #[serde(default)]
    pub compatible_models: Vec<String>,
    #[serde(default)]
    pub symptoms_fixed: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Versioned, read-only lookup keyed by part identifier
pub trait ReferenceSource: Send + Sync {
    fn version(&self) -> &str;

    fn lookup(&self, identifier: &str) -> Option<&ReferenceEntry>;
}
