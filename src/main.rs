//! `parts-catalog [CONFIG_PATH]`
//!
//! Loads configuration, scrapes every identifier source and writes the
//! catalog. Ctrl-C stops dispatch; parts already being fetched finish.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use parts_catalog_lib::application::{
    CandidateUrlTemplate, CatalogPipeline, Enricher, IdentifierSource, PartResolver, PricePolicy, SchedulerConfig,
    ScrapeScheduler,
};
use parts_catalog_lib::infrastructure::{
    AppConfig, HttpPageFetcher, JsonCatalogWriter, PartPageParser, ReferenceTable, init_logging_with_config,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    init_logging_with_config(&config.logging)?;
    info!("Starting parts-catalog v{}", env!("CARGO_PKG_VERSION"));

    let fetcher = Arc::new(HttpPageFetcher::new(config.http.clone()).context("Failed to build HTTP client")?);
    let parser = Arc::new(
        PartPageParser::with_config(&config.rules, config.extraction.clone()).context("Invalid extraction rules")?,
    );
    let templates = config
        .scrape
        .candidate_templates
        .iter()
        .map(CandidateUrlTemplate::new)
        .collect();
    let resolver = Arc::new(PartResolver::new(fetcher, parser, &config.scrape.base_url, templates));
    let scheduler = ScrapeScheduler::new(resolver, SchedulerConfig::from(&config.scrape))?;

    let reference = match &config.catalog.reference_path {
        Some(path) => ReferenceTable::from_path(path)?,
        None => ReferenceTable::bundled()?,
    };
    let enricher = Enricher::new(Arc::new(reference))
        .with_price_policy(PricePolicy::from(config.catalog.price_fallback))
        .with_limits(config.extraction.clone());

    let sources = match &config.catalog.sources_path {
        Some(path) => IdentifierSource::load_all(path)?,
        None => IdentifierSource::bundled()?,
    };

    let writer = Arc::new(JsonCatalogWriter::new(&config.catalog.output_path));
    let pipeline = CatalogPipeline::new(scheduler, enricher, writer);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Interrupt received, finishing in-flight parts");
            on_interrupt.cancel();
        }
    });

    let summary = pipeline
        .run(sources, cancel)
        .await
        .context("Catalog pipeline failed")?;

    info!(
        "✅ Wrote {} parts to {}",
        summary.records_written,
        config.catalog.output_path.display()
    );
    Ok(())
}
