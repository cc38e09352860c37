//! Candidate URL fallback and failure reporting
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use parts_catalog_lib::application::{CandidateUrlTemplate, PartResolver, RequestPacer};
use parts_catalog_lib::domain::{
    ApplianceCategory, AttemptError, FetchError, PageFetcher, PartIdentifier, ScrapeOutcome,
};
use parts_catalog_lib::infrastructure::PartPageParser;

const BASE: &str = "https://parts.test";
const PAGE: &str = "<html><head><title>Door Shelf Bin PS11752778 | Parts</title></head><body></body></html>";

/// Serves canned responses by URL and records every request
#[derive(Default)]
struct ScriptedFetcher {
    responses: HashMap<String, Result<String, FetchError>>,
    delay: Option<Duration>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn respond(mut self, url: &str, response: Result<&str, FetchError>) -> Self {
        self.responses.insert(url.to_string(), response.map(str::to_string));
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::Status { status: 404 }))
    }
}

fn resolver(fetcher: Arc<ScriptedFetcher>) -> PartResolver {
    PartResolver::new(
        fetcher,
        Arc::new(PartPageParser::new().unwrap()),
        BASE,
        CandidateUrlTemplate::defaults(),
    )
}

fn shelf_bin() -> PartIdentifier {
    PartIdentifier::new("PS11752778", "Whirlpool", ApplianceCategory::Refrigerator).with_manufacturer_id("W10321304")
}

fn pacer() -> RequestPacer {
    RequestPacer::new(Duration::ZERO)
}

#[tokio::test]
async fn first_successful_candidate_wins() {
    let fetcher = Arc::new(ScriptedFetcher::default().respond("https://parts.test/PS11752778.htm", Ok(PAGE)));
    let resolver = resolver(Arc::clone(&fetcher));

    let outcome = resolver.resolve(&shelf_bin(), &mut pacer(), Duration::from_secs(5)).await;

    let ScrapeOutcome::Resolved(record) = outcome else {
        panic!("expected a resolved record");
    };
    assert_eq!(record.identifier, "PS11752778");
    assert_eq!(record.manufacturer_id.as_deref(), Some("W10321304"));
    assert_eq!(record.display_name, "Door Shelf Bin");
    assert_eq!(record.brand, "Whirlpool");
    assert_eq!(record.source_url, "https://parts.test/PS11752778.htm");
    assert_eq!(record.image_url, "https://parts.test/images/part/PS11752778.jpg");
    assert_eq!(fetcher.requested().len(), 1);
}

#[tokio::test]
async fn all_candidates_failing_reports_every_attempt() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let resolver = resolver(Arc::clone(&fetcher));

    let outcome = resolver.resolve(&shelf_bin(), &mut pacer(), Duration::from_secs(5)).await;

    let ScrapeOutcome::Failed(failure) = outcome else {
        panic!("expected a failure");
    };
    assert_eq!(failure.identifier, "PS11752778");
    // The name template needs a name hint, so only two URLs are tried
    assert_eq!(
        failure.attempted_urls(),
        vec![
            "https://parts.test/PS11752778.htm",
            "https://parts.test/PS11752778-Whirlpool-W10321304.htm",
        ]
    );
    assert!(
        failure
            .attempts
            .iter()
            .all(|a| a.error == AttemptError::Fetch(FetchError::Status { status: 404 }))
    );
    assert_eq!(fetcher.requested(), failure.attempted_urls());
}

#[tokio::test]
async fn malformed_page_falls_through_to_next_candidate() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .respond("https://parts.test/PS11752778.htm", Ok("   "))
            .respond("https://parts.test/PS11752778-Whirlpool-W10321304.htm", Ok(PAGE)),
    );
    let resolver = resolver(Arc::clone(&fetcher));

    let outcome = resolver.resolve(&shelf_bin(), &mut pacer(), Duration::from_secs(5)).await;

    let ScrapeOutcome::Resolved(record) = outcome else {
        panic!("expected a resolved record");
    };
    assert_eq!(record.source_url, "https://parts.test/PS11752778-Whirlpool-W10321304.htm");
    assert_eq!(fetcher.requested().len(), 2);
}

#[tokio::test]
async fn network_error_is_recorded_and_next_candidate_tried() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .respond("https://parts.test/PS11752778.htm", Err(FetchError::network("connection reset")))
            .respond("https://parts.test/PS11752778-Whirlpool-W10321304.htm", Ok("no markup here")),
    );
    let resolver = resolver(fetcher);

    let outcome = resolver.resolve(&shelf_bin(), &mut pacer(), Duration::from_secs(5)).await;

    let ScrapeOutcome::Failed(failure) = outcome else {
        panic!("expected a failure");
    };
    assert_eq!(failure.attempts.len(), 2);
    assert!(matches!(
        failure.attempts[0].error,
        AttemptError::Fetch(FetchError::Network { .. })
    ));
    assert!(matches!(
        failure.attempts[1].error,
        AttemptError::MalformedDocument { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn slow_candidate_times_out() {
    let fetcher = Arc::new(ScriptedFetcher {
        delay: Some(Duration::from_secs(30)),
        ..ScriptedFetcher::default()
    });
    let resolver = resolver(fetcher);
    let id = PartIdentifier::new("PS3406971", "Whirlpool", ApplianceCategory::Dishwasher);

    let outcome = resolver.resolve(&id, &mut pacer(), Duration::from_millis(200)).await;

    let ScrapeOutcome::Failed(failure) = outcome else {
        panic!("expected a failure");
    };
    assert_eq!(failure.attempted_urls(), vec!["https://parts.test/PS3406971.htm"]);
    assert_eq!(
        failure.attempts[0].error,
        AttemptError::Fetch(FetchError::Timeout {
            elapsed: Duration::from_millis(200)
        })
    );
}

#[tokio::test]
async fn identifier_with_no_fillable_template_fails_without_requests() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let resolver = PartResolver::new(
        Arc::clone(&fetcher) as Arc<dyn PageFetcher>,
        Arc::new(PartPageParser::new().unwrap()),
        BASE,
        vec![CandidateUrlTemplate::new("{base}/{id}-{mfr}.htm")],
    );
    let id = PartIdentifier::new("PS3406971", "Whirlpool", ApplianceCategory::Dishwasher);

    let outcome = resolver.resolve(&id, &mut pacer(), Duration::from_secs(5)).await;

    let ScrapeOutcome::Failed(failure) = outcome else {
        panic!("expected a failure");
    };
    assert!(failure.attempts.is_empty());
    assert!(fetcher.requested().is_empty());
}

#[test]
fn candidate_urls_are_deduplicated() {
    let resolver = PartResolver::new(
        Arc::new(ScriptedFetcher::default()),
        Arc::new(PartPageParser::new().unwrap()),
        BASE,
        vec![
            CandidateUrlTemplate::new("{base}/{id}.htm"),
            CandidateUrlTemplate::new("{base}/{id}.htm"),
        ],
    );
    assert_eq!(resolver.candidate_urls(&shelf_bin()), vec!["https://parts.test/PS11752778.htm"]);
}
