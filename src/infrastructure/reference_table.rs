//! Versioned reference table backed by JSON
//!
//! Known compatible models, symptoms and descriptions per part, used only by
//! enrichment. A copy of the seed table ships inside the binary.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::domain::{ReferenceEntry, ReferenceSource};

const BUNDLED_TABLE: &str = include_str!("../../data/reference_parts.json");

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("failed to read reference table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid reference table: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTable {
    version: String,
    #[serde(default)]
    entries: HashMap<String, ReferenceEntry>,
}

impl ReferenceTable {
    pub fn new(version: impl Into<String>, entries: HashMap<String, ReferenceEntry>) -> Self {
        Self {
            version: version.into(),
            entries,
        }
    }

    /// Table compiled into the binary
    pub fn bundled() -> Result<Self, ReferenceError> {
        Self::from_json(BUNDLED_TABLE)
    }

    pub fn from_json(json: &str) -> Result<Self, ReferenceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ReferenceError> {
        let json = std::fs::read_to_string(path).map_err(|source| ReferenceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_json(&json)?;
        info!(
            "Loaded reference table {} ({} entries) from {}",
            table.version,
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReferenceSource for ReferenceTable {
    fn version(&self) -> &str {
        &self.version
    }

    fn lookup(&self, identifier: &str) -> Option<&ReferenceEntry> {
        self.entries.get(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_table_loads() {
        let table = ReferenceTable::bundled().unwrap();
        assert_eq!(table.version(), "2024-seed-1");

        let entry = table.lookup("PS11752778").unwrap();
        assert!(entry.compatible_models.contains(&"WRS325SDHZ".to_string()));
        assert!(!entry.symptoms_fixed.is_empty());
        assert!(entry.description.is_some());
        assert!(table.lookup("PS0000000").is_none());
    }

    #[test]
    fn test_partial_entries_default_missing_fields() {
        let table = ReferenceTable::from_json(
            r#"{"version": "t1", "entries": {"PS1": {"symptoms_fixed": ["leaking"]}}}"#,
        )
        .unwrap();
        let entry = table.lookup("PS1").unwrap();
        assert!(entry.compatible_models.is_empty());
        assert_eq!(entry.description, None);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ReferenceTable::from_path(Path::new("/nonexistent/reference.json"));
        assert!(matches!(result, Err(ReferenceError::Io { .. })));
    }
}
