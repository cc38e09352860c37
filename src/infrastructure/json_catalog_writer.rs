//! JSON catalog writer
//!
//! Persists records as `{"parts": [...]}` using the seed-file field names
//! consumed downstream. The file is written next to its destination and
//! renamed into place, so readers never observe a half-written catalog.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::domain::{CatalogWriteError, CatalogWriter, PartRecord};

/// One part in the seed-file shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedPart {
    pub part_number: String,
    pub manufacturer_part_number: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub part_type: String,
    pub brand: String,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub compatible_models: Vec<String>,
    pub symptoms_fixed: Vec<String>,
    pub install_instructions: String,
    pub image_url: String,
    pub product_url: String,
}

impl From<&PartRecord> for SeedPart {
    fn from(record: &PartRecord) -> Self {
        Self {
            part_number: record.identifier.clone(),
            manufacturer_part_number: record.manufacturer_id.clone(),
            name: record.display_name.clone(),
            part_type: record.category.to_string(),
            brand: record.brand.clone(),
            price: record.price.map(|price| price.as_f64()),
            description: record.description.clone(),
            compatible_models: record.compatible_models.clone(),
            symptoms_fixed: record.symptoms_fixed.clone(),
            install_instructions: record.install_instructions(),
            image_url: record.image_url.clone(),
            product_url: record.source_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedCatalog {
    pub parts: Vec<SeedPart>,
}

pub struct JsonCatalogWriter {
    path: PathBuf,
}

impl JsonCatalogWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(path: &Path, source: std::io::Error) -> CatalogWriteError {
        CatalogWriteError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl CatalogWriter for JsonCatalogWriter {
    async fn write(&self, records: &[PartRecord]) -> Result<(), CatalogWriteError> {
        let catalog = SeedCatalog {
            parts: records.iter().map(SeedPart::from).collect(),
        };
        let json = serde_json::to_vec_pretty(&catalog)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::io_error(parent, e))?;
        }

        let temp_path = self.temp_path();
        if let Err(e) = tokio::fs::write(&temp_path, json).await {
            error!("Failed to write catalog to {}: {}", temp_path.display(), e);
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(Self::io_error(&temp_path, e));
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            error!("Failed to move catalog into place at {}: {}", self.path.display(), e);
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(Self::io_error(&self.path, e));
        }

        info!("Wrote {} parts to {}", records.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ApplianceCategory, InstallStep, Price};

    fn record() -> PartRecord {
        PartRecord {
            identifier: "PS11752778".into(),
            manufacturer_id: Some("W10873791".into()),
            display_name: "Refrigerator Door Shelf Bin".into(),
            category: ApplianceCategory::Refrigerator,
            brand: "Whirlpool".into(),
            price: Price::from_cents(4999),
            description: None,
            compatible_models: vec!["WRS325SDHZ".into()],
            symptoms_fixed: vec![],
            install_steps: vec![InstallStep { number: 1, text: "Unplug".into() }],
            source_url: "https://www.partselect.com/PS11752778.htm".into(),
            image_url: "https://www.partselect.com/images/part/PS11752778.jpg".into(),
        }
    }

    #[test]
    fn test_seed_part_field_names() {
        let value = serde_json::to_value(SeedPart::from(&record())).unwrap();
        assert_eq!(value["part_number"], "PS11752778");
        assert_eq!(value["type"], "refrigerator");
        assert_eq!(value["price"], 49.99);
        assert_eq!(value["description"], serde_json::Value::Null);
        assert_eq!(value["install_instructions"], "1. Unplug");
        assert_eq!(value["product_url"], "https://www.partselect.com/PS11752778.htm");
    }

    #[tokio::test]
    async fn test_write_creates_parent_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("catalog.json");
        let writer = JsonCatalogWriter::new(&path);

        writer.write(&[record()]).await.unwrap();

        let written: SeedCatalog = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written.parts.len(), 1);
        assert!(!writer.temp_path().exists());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_failed_write_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonCatalogWriter::new(dir.path().join("catalog.json"));
        // Every write to /dev/full fails with ENOSPC
        std::os::unix::fs::symlink("/dev/full", writer.temp_path()).unwrap();

        let result = writer.write(&[record()]).await;

        assert!(matches!(result, Err(CatalogWriteError::Io { .. })), "got {result:?}");
        assert!(std::fs::symlink_metadata(writer.temp_path()).is_err());
        assert!(!writer.path().exists());
    }
}
