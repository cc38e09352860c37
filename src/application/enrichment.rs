//! Post-resolution backfill from reference data
//!
//! Only empty fields are filled; scraped values are never overwritten.
//! Backfilled lists go through the same normalisation as extracted ones.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{PartRecord, Price, ReferenceSource};
use crate::infrastructure::parsing::ExtractionLimits;
use crate::infrastructure::parsing::document::{normalize_whitespace, truncate_chars};
use crate::infrastructure::parsing::strategies::{normalize_models, normalize_symptoms};

/// What to do with a record whose page carried no price
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "price", rename_all = "snake_case")]
pub enum PricePolicy {
    #[default]
    LeaveAbsent,
    Fallback(Price),
}

impl From<Option<Price>> for PricePolicy {
    fn from(fallback: Option<Price>) -> Self {
        fallback.map_or(Self::LeaveAbsent, Self::Fallback)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedRecord {
    pub record: PartRecord,

    /// Names of the fields that were filled, in fill order
    pub backfilled: Vec<&'static str>,
}

pub struct Enricher {
    reference: Arc<dyn ReferenceSource>,
    price_policy: PricePolicy,
    limits: ExtractionLimits,
}

impl Enricher {
    pub fn new(reference: Arc<dyn ReferenceSource>) -> Self {
        Self {
            reference,
            price_policy: PricePolicy::default(),
            limits: ExtractionLimits::default(),
        }
    }

    pub fn with_price_policy(mut self, price_policy: PricePolicy) -> Self {
        self.price_policy = price_policy;
        self
    }

    pub fn with_limits(mut self, limits: ExtractionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn reference_version(&self) -> &str {
        self.reference.version()
    }

    pub fn enrich(&self, mut record: PartRecord) -> EnrichedRecord {
        let mut backfilled = Vec::new();
        let limits = &self.limits;

        if let Some(entry) = self.reference.lookup(&record.identifier) {
            if record.compatible_models.is_empty() {
                let models = normalize_models(
                    entry.compatible_models.clone(),
                    limits.min_model_chars,
                    limits.max_compatible_models,
                );
                if !models.is_empty() {
                    record.compatible_models = models;
                    backfilled.push("compatible_models");
                }
            }

            if record.symptoms_fixed.is_empty() {
                let symptoms =
                    normalize_symptoms(entry.symptoms_fixed.clone(), limits.min_symptom_chars, limits.max_symptoms);
                if !symptoms.is_empty() {
                    record.symptoms_fixed = symptoms;
                    backfilled.push("symptoms_fixed");
                }
            }

            if record.description.is_none() {
                let description = entry
                    .description
                    .as_deref()
                    .map(normalize_whitespace)
                    .filter(|d| !d.is_empty())
                    .map(|d| truncate_chars(&d, limits.max_description_chars));
                if description.is_some() {
                    record.description = description;
                    backfilled.push("description");
                }
            }
        }

        if record.price.is_none() {
            if let PricePolicy::Fallback(price) = self.price_policy {
                record.price = Some(price);
                backfilled.push("price");
            }
        }

        if !backfilled.is_empty() {
            debug!(
                "Backfilled {} for {} from reference {}",
                backfilled.join(", "),
                record.identifier,
                self.reference.version()
            );
        }

        EnrichedRecord { record, backfilled }
    }
}
