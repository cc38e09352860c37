//! Application layer module
//!
//! Resolution, scheduling, aggregation and enrichment, orchestrated by the
//! catalog pipeline.

pub mod catalog_aggregator;
pub mod enrichment;
pub mod part_resolver;
pub mod pipeline;
pub mod request_pacer;
pub mod scrape_scheduler;

pub use catalog_aggregator::{Catalog, CatalogAggregator, FailureReport};
pub use enrichment::{EnrichedRecord, Enricher, PricePolicy};
pub use part_resolver::{CandidateUrlTemplate, PartResolver};
pub use pipeline::{CatalogPipeline, IdentifierSource, PipelineError, PipelineSummary, SourceSummary};
pub use request_pacer::RequestPacer;
pub use scrape_scheduler::{SchedulerConfig, SchedulerError, ScrapeRun, ScrapeScheduler, ScrapeStream};
