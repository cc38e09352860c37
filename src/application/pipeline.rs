//! End-to-end catalog pipeline
//!
//! Runs the scheduler once per identifier source, merges every run, backfills
//! from reference data and hands the ordered records to the writer.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::catalog_aggregator::{CatalogAggregator, FailureReport};
use super::enrichment::Enricher;
use super::scrape_scheduler::ScrapeScheduler;
use crate::domain::{CatalogWriteError, CatalogWriter, PartIdentifier, PartRecord, Price};

const BUNDLED_SOURCES: &str = include_str!("../../data/known_parts.json");

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to read identifier sources {path}: {source}")]
    SourcesIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid identifier sources: {0}")]
    SourcesParse(#[from] serde_json::Error),

    #[error(transparent)]
    Write(#[from] CatalogWriteError),
}

/// A named identifier list; each source is scraped as one stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierSource {
    pub name: String,
    pub identifiers: Vec<PartIdentifier>,
}

#[derive(Deserialize)]
struct SourceFile {
    sources: Vec<IdentifierSource>,
}

impl IdentifierSource {
    pub fn new(name: impl Into<String>, identifiers: Vec<PartIdentifier>) -> Self {
        Self {
            name: name.into(),
            identifiers,
        }
    }

    /// Known-part lists compiled into the binary
    pub fn bundled() -> Result<Vec<Self>, PipelineError> {
        Self::from_json(BUNDLED_SOURCES)
    }

    pub fn from_json(json: &str) -> Result<Vec<Self>, PipelineError> {
        let file: SourceFile = serde_json::from_str(json)?;
        Ok(file.sources)
    }

    pub fn load_all(path: &Path) -> Result<Vec<Self>, PipelineError> {
        let json = std::fs::read_to_string(path).map_err(|source| PipelineError::SourcesIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub name: String,
    pub run_id: Uuid,
    pub resolved: usize,
    pub failed: usize,
    pub not_dispatched: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub sources: Vec<SourceSummary>,
    pub records_written: usize,
    pub failures: FailureReport,
    pub duplicates_dropped: usize,

    /// Backfill count per field name
    pub backfilled: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub by_brand: BTreeMap<String, usize>,
    pub price_range: Option<(Price, Price)>,
    /// Mean of the present prices, rounded to the nearest cent
    pub average_price: Option<Price>,
    pub missing_price: usize,
}

impl PipelineSummary {
    fn tally(&mut self, records: &[PartRecord]) {
        self.records_written = records.len();
        for record in records {
            *self.by_category.entry(record.category.to_string()).or_default() += 1;
            *self.by_brand.entry(record.brand.clone()).or_default() += 1;
        }

        let mut prices = records.iter().filter_map(|r| r.price);
        self.price_range = prices.next().map(|first| {
            prices.fold((first, first), |(low, high), price| (low.min(price), high.max(price)))
        });
        let (total, priced) = records
            .iter()
            .filter_map(|r| r.price)
            .fold((0u64, 0u64), |(total, count), price| (total + price.cents(), count + 1));
        self.average_price = (priced > 0)
            .then(|| (total + priced / 2) / priced)
            .and_then(Price::from_cents);
        self.missing_price = records.iter().filter(|r| r.price.is_none()).count();
    }

    fn log(&self) {
        info!(
            "📊 Catalog: {} parts written, {} failed, {} duplicates dropped",
            self.records_written, self.failures.count, self.duplicates_dropped
        );
        for (category, count) in &self.by_category {
            info!("   {}: {}", category, count);
        }
        for (brand, count) in &self.by_brand {
            info!("   {}: {}", brand, count);
        }
        match self.price_range {
            Some((low, high)) => info!("   Price range: ${} - ${}", low, high),
            None => info!("   Price range: no prices extracted"),
        }
        if let Some(average) = self.average_price {
            info!("   Average price: ${}", average);
        }
        for (field, count) in &self.backfilled {
            info!("   Backfilled {}: {}", field, count);
        }
        if !self.failures.identifiers.is_empty() {
            warn!("   Unresolved: {}", self.failures.identifiers.join(", "));
        }
    }
}

pub struct CatalogPipeline {
    scheduler: ScrapeScheduler,
    enricher: Enricher,
    writer: Arc<dyn CatalogWriter>,
}

impl CatalogPipeline {
    pub fn new(scheduler: ScrapeScheduler, enricher: Enricher, writer: Arc<dyn CatalogWriter>) -> Self {
        Self {
            scheduler,
            enricher,
            writer,
        }
    }

    /// Scrape every source in turn, then merge, enrich and write.
    ///
    /// Per-identifier failures are reported in the summary; only writer
    /// errors fail the pipeline.
    pub async fn run(
        &self,
        sources: Vec<IdentifierSource>,
        cancel: CancellationToken,
    ) -> Result<PipelineSummary, PipelineError> {
        let mut aggregator = CatalogAggregator::new();
        let mut summary = PipelineSummary::default();

        for source in sources {
            info!("Scraping source '{}' ({} identifiers)", source.name, source.identifiers.len());
            let run = self
                .scheduler
                .run_source(&source.name, source.identifiers, cancel.clone())
                .await;

            summary.sources.push(SourceSummary {
                name: source.name,
                run_id: run.run_id,
                resolved: run.resolved_count(),
                failed: run.failed_count(),
                not_dispatched: run.not_dispatched.len(),
            });
            aggregator.ingest_run(run);
        }

        let catalog = aggregator.finish();
        let mut records = Vec::with_capacity(catalog.records.len());
        for record in catalog.records {
            let enriched = self.enricher.enrich(record);
            for field in enriched.backfilled {
                *summary.backfilled.entry(field.to_string()).or_default() += 1;
            }
            records.push(enriched.record);
        }

        self.writer.write(&records).await?;

        summary.failures = catalog.failures;
        summary.duplicates_dropped = catalog.duplicates_dropped;
        summary.tally(&records);
        summary.log();

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_sources() {
        let sources = IdentifierSource::bundled().unwrap();
        let names: Vec<_> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["specific", "comprehensive"]);

        let specific = &sources[0];
        assert_eq!(specific.identifiers[0].id, "PS11752778");
        assert_eq!(specific.identifiers[0].name_hint.as_deref(), Some("Ice Maker Assembly"));
        assert!(sources[1].identifiers.iter().any(|p| p.id == "PS11752778"));
    }

    #[test]
    fn test_missing_sources_file() {
        let result = IdentifierSource::load_all(Path::new("/nonexistent/known_parts.json"));
        assert!(matches!(result, Err(PipelineError::SourcesIo { .. })));
    }
}
