//! Extraction cascade and scheduler throughput benchmarks
//!
//! - Full page: every field hits its first strategy
//! - Sparse page: most fields fall through to later strategies
//! - Scheduler: in-memory fetcher, measures pool and channel overhead

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use async_trait::async_trait;
use parts_catalog_lib::application::{CandidateUrlTemplate, PartResolver, SchedulerConfig, ScrapeScheduler};
use parts_catalog_lib::domain::{ApplianceCategory, FetchError, PageFetcher, PartIdentifier};
use parts_catalog_lib::infrastructure::PartPageParser;

const FULL_PAGE: &str = include_str!("../tests/fixtures/ice_maker_full.html");
const SPARSE_PAGE: &str = include_str!("../tests/fixtures/rack_wheel_sparse.html");

struct StaticFetcher;

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str, _timeout: Duration) -> Result<String, FetchError> {
        Ok(FULL_PAGE.to_string())
    }
}

fn extraction(c: &mut Criterion) {
    let parser = PartPageParser::new().expect("default rules compile");
    let ice_maker = PartIdentifier::new("PS11752778", "Whirlpool", ApplianceCategory::Refrigerator)
        .with_manufacturer_id("WPW10190965");
    let rack_wheel = PartIdentifier::new("PS3406971", "Whirlpool", ApplianceCategory::Dishwasher);

    let mut group = c.benchmark_group("extraction");
    group.bench_function("full_page", |b| {
        b.iter(|| parser.extract(black_box(FULL_PAGE), &ice_maker))
    });
    group.bench_function("sparse_page", |b| {
        b.iter(|| parser.extract(black_box(SPARSE_PAGE), &rack_wheel))
    });
    group.finish();
}

fn scheduler_throughput(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let resolver = Arc::new(PartResolver::new(
        Arc::new(StaticFetcher),
        Arc::new(PartPageParser::new().expect("default rules compile")),
        "https://parts.test",
        vec![CandidateUrlTemplate::new("{base}/{id}.htm")],
    ));
    let config = SchedulerConfig {
        concurrency: 8,
        politeness_delay: Duration::ZERO,
        fetch_timeout: Duration::from_secs(5),
    };
    let scheduler = ScrapeScheduler::new(resolver, config).expect("valid scheduler config");
    let identifiers: Vec<_> = (0..64)
        .map(|i| PartIdentifier::new(format!("PS{i:05}"), "Whirlpool", ApplianceCategory::Refrigerator))
        .collect();

    c.bench_function("scheduler_64_parts", |b| {
        b.to_async(&rt).iter(|| async {
            let run = scheduler.run(identifiers.clone(), CancellationToken::new()).await;
            black_box(run.resolved_count())
        })
    });
}

criterion_group!(benches, extraction, scheduler_throughput);
criterion_main!(benches);
