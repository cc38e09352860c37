//! Merges outcomes from one or more runs into a single catalog
//!
//! First successful resolution per identifier wins. A failure is reported
//! only if no stream resolved that identifier.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scrape_scheduler::ScrapeRun;
use crate::domain::{FetchFailure, PartRecord, ScrapeOutcome};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub count: usize,
    pub identifiers: Vec<String>,
    pub failures: Vec<FetchFailure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// In first-resolution order
    pub records: Vec<PartRecord>,
    pub failures: FailureReport,
    pub duplicates_dropped: usize,
}

#[derive(Debug, Default)]
pub struct CatalogAggregator {
    records: Vec<PartRecord>,
    resolved: HashSet<String>,
    failures: Vec<FetchFailure>,
    failed: HashSet<String>,
    duplicates_dropped: usize,
}

impl CatalogAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one outcome. Returns whether it changed the catalog.
    pub fn ingest(&mut self, outcome: ScrapeOutcome) -> bool {
        match outcome {
            ScrapeOutcome::Resolved(record) => {
                if !self.resolved.insert(record.identifier.clone()) {
                    debug!("Dropping duplicate resolution for {}", record.identifier);
                    self.duplicates_dropped += 1;
                    return false;
                }
                if self.failed.remove(&record.identifier) {
                    self.failures.retain(|f| f.identifier != record.identifier);
                }
                self.records.push(record);
                true
            }
            ScrapeOutcome::Failed(failure) => {
                if self.resolved.contains(&failure.identifier) || !self.failed.insert(failure.identifier.clone()) {
                    return false;
                }
                self.failures.push(failure);
                true
            }
        }
    }

    pub fn ingest_run(&mut self, run: ScrapeRun) {
        for outcome in run.outcomes {
            self.ingest(outcome);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn finish(self) -> Catalog {
        let identifiers = self.failures.iter().map(|f| f.identifier.clone()).collect();
        Catalog {
            records: self.records,
            failures: FailureReport {
                count: self.failures.len(),
                identifiers,
                failures: self.failures,
            },
            duplicates_dropped: self.duplicates_dropped,
        }
    }
}
