//! Resolves one part identifier into a record by trying candidate URLs in order.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::request_pacer::RequestPacer;
use crate::domain::{
    AttemptError, FetchAttempt, FetchError, FetchFailure, PageFetcher, PartIdentifier, PartRecord, ScrapeOutcome,
};
use crate::infrastructure::config::defaults;
use crate::infrastructure::parsing::{ExtractedFields, PartPageParser, check_markup};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([a-z]+)\}").expect("static pattern"));

/// URL shape with `{base}`, `{id}`, `{brand}`, `{mfr}` and `{name}` placeholders
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateUrlTemplate(String);

impl CandidateUrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn defaults() -> Vec<Self> {
        defaults::CANDIDATE_TEMPLATES.iter().map(|t| Self::new(*t)).collect()
    }

    /// Fill every placeholder, or `None` when the identifier lacks a value
    /// (or the template names an unknown placeholder)
    pub fn expand(&self, base_url: &str, identifier: &PartIdentifier) -> Option<String> {
        let mut url = String::with_capacity(self.0.len() + 48);
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(&self.0) {
            let whole = caps.get(0)?;
            let value = match &caps[1] {
                "base" => base_url.trim_end_matches('/').to_string(),
                "id" => slug(&identifier.id)?,
                "brand" => slug(&identifier.brand)?,
                "mfr" => slug(identifier.manufacturer_id.as_deref()?)?,
                "name" => slug(identifier.name_hint.as_deref()?)?,
                _ => return None,
            };
            url.push_str(&self.0[last..whole.start()]);
            url.push_str(&value);
            last = whole.end();
        }

        url.push_str(&self.0[last..]);
        Some(url)
    }
}

impl fmt::Display for CandidateUrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Words joined with `-`; blank input cannot fill a placeholder
fn slug(value: &str) -> Option<String> {
    let slug = value.split_whitespace().collect::<Vec<_>>().join("-");
    (!slug.is_empty()).then_some(slug)
}

pub struct PartResolver {
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<PartPageParser>,
    base_url: String,
    templates: Vec<CandidateUrlTemplate>,
}

impl PartResolver {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<PartPageParser>,
        base_url: impl Into<String>,
        templates: Vec<CandidateUrlTemplate>,
    ) -> Self {
        Self {
            fetcher,
            parser,
            base_url: base_url.into(),
            templates,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Expanded candidates in template order, each URL at most once
    pub fn candidate_urls(&self, identifier: &PartIdentifier) -> Vec<String> {
        let mut seen = HashSet::new();
        self.templates
            .iter()
            .filter_map(|template| {
                let url = template.expand(&self.base_url, identifier);
                if url.is_none() {
                    debug!("Skipping template {} for {}: unfillable placeholder", template, identifier.id);
                }
                url
            })
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }

    /// Try each candidate until one yields a usable page.
    ///
    /// Never fails: an identifier whose candidates all fail becomes a
    /// `FetchFailure` listing every attempt.
    pub async fn resolve(
        &self,
        identifier: &PartIdentifier,
        pacer: &mut RequestPacer,
        fetch_timeout: Duration,
    ) -> ScrapeOutcome {
        let candidates = self.candidate_urls(identifier);
        let mut attempts = Vec::with_capacity(candidates.len());

        for url in candidates {
            pacer.wait_turn().await;
            debug!("Fetching candidate {} for {}", url, identifier.id);

            let fetched = tokio::time::timeout(fetch_timeout, self.fetcher.fetch(&url, fetch_timeout))
                .await
                .unwrap_or(Err(FetchError::Timeout {
                    elapsed: fetch_timeout,
                }));

            let error = match fetched {
                Ok(content) => match check_markup(&content) {
                    Ok(()) => {
                        let fields = self.parser.extract(&content, identifier);
                        info!("Resolved {} from {}", identifier.id, url);
                        return ScrapeOutcome::Resolved(self.assemble(identifier, url, fields));
                    }
                    Err(detail) => AttemptError::MalformedDocument { detail },
                },
                Err(e) => AttemptError::from(e),
            };

            warn!("Candidate {} failed for {}: {}", url, identifier.id, error);
            attempts.push(FetchAttempt { url, error });
        }

        let failure = FetchFailure {
            identifier: identifier.id.clone(),
            attempts,
        };
        warn!("{}", failure);
        ScrapeOutcome::Failed(failure)
    }

    /// Build the record from input-carried fields and extracted values
    pub fn assemble(&self, identifier: &PartIdentifier, source_url: String, fields: ExtractedFields) -> PartRecord {
        PartRecord {
            identifier: identifier.id.clone(),
            manufacturer_id: identifier.manufacturer_id.clone(),
            display_name: fields.display_name.unwrap_or_default(),
            category: identifier.category.clone(),
            brand: identifier.brand.clone(),
            price: fields.price,
            description: fields.description,
            compatible_models: fields.compatible_models,
            symptoms_fixed: fields.symptoms_fixed,
            install_steps: fields.install_steps,
            source_url,
            image_url: PartRecord::image_url_for(&self.base_url, &identifier.id),
        }
    }
}
