//! Part detail page parser
//!
//! Runs one ordered strategy cascade per field over a parsed page. The
//! parser compiles its selectors once and is shared read-only by every
//! worker.

use std::fmt;

use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cascade::{FieldCascade, Strategy};
use super::config::{CompiledRules, ExtractionLimits, PartPageRules};
use super::context::ExtractionContext;
use super::error::ParserBuildError;
use super::strategies;
use crate::domain::{InstallStep, PartIdentifier, Price};

/// Fields populated by extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartField {
    DisplayName,
    Price,
    Description,
    SymptomsFixed,
    CompatibleModels,
    InstallSteps,
}

impl PartField {
    pub const ALL: [Self; 6] = [
        Self::DisplayName,
        Self::Price,
        Self::Description,
        Self::SymptomsFixed,
        Self::CompatibleModels,
        Self::InstallSteps,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DisplayName => "display_name",
            Self::Price => "price",
            Self::Description => "description",
            Self::SymptomsFixed => "symptoms_fixed",
            Self::CompatibleModels => "compatible_models",
            Self::InstallSteps => "install_steps",
        }
    }
}

impl fmt::Display for PartField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cascade per field, in evaluation order
#[derive(Debug, Clone)]
pub struct FieldCascades {
    pub display_name: FieldCascade<String>,
    pub price: FieldCascade<Price>,
    pub description: FieldCascade<String>,
    pub symptoms_fixed: FieldCascade<Vec<String>>,
    pub compatible_models: FieldCascade<Vec<String>>,
    pub install_steps: FieldCascade<Vec<InstallStep>>,
}

impl Default for FieldCascades {
    fn default() -> Self {
        Self {
            display_name: FieldCascade::new(
                "display_name",
                vec![
                    Strategy::new("title-tag", strategies::title_tag),
                    Strategy::new("h1-heading", strategies::h1_heading),
                ],
            ),
            price: FieldCascade::new(
                "price",
                vec![
                    Strategy::new("structured-price", strategies::structured_price),
                    Strategy::new("price-element", strategies::price_element),
                ],
            ),
            description: FieldCascade::new(
                "description",
                vec![
                    Strategy::new("itemprop-description", strategies::itemprop_description),
                    Strategy::new("description-container", strategies::description_container),
                    Strategy::new("meta-description", strategies::meta_description),
                ],
            ),
            symptoms_fixed: FieldCascade::new(
                "symptoms_fixed",
                vec![
                    Strategy::new("symptoms-list-after-anchor", strategies::symptoms_list_after_anchor),
                    Strategy::new("symptoms-list-after-keyword", strategies::symptoms_list_after_keyword),
                ],
            ),
            compatible_models: FieldCascade::new(
                "compatible_models",
                vec![
                    Strategy::new("model-links-after-anchor", strategies::model_links_after_anchor),
                    Strategy::new("list-items-after-anchor", strategies::list_items_after_anchor),
                    Strategy::new("spare-part-itemprop", strategies::spare_part_itemprop),
                ],
            ),
            install_steps: FieldCascade::new(
                "install_steps",
                vec![
                    Strategy::new(
                        "ordered-list-after-install-heading",
                        strategies::ordered_list_after_install_heading,
                    ),
                    Strategy::new("list-after-install-text", strategies::list_after_install_text),
                ],
            ),
        }
    }
}

/// Raw field values from one page. Empty means "not extracted".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub display_name: Option<String>,
    pub price: Option<Price>,
    pub description: Option<String>,
    pub symptoms_fixed: Vec<String>,
    pub compatible_models: Vec<String>,
    pub install_steps: Vec<InstallStep>,

    /// Winning strategy per extracted field
    pub strategy_hits: Vec<(PartField, &'static str)>,
}

impl ExtractedFields {
    pub fn strategy_for(&self, field: PartField) -> Option<&'static str> {
        self.strategy_hits.iter().find(|(f, _)| *f == field).map(|(_, name)| *name)
    }
}

/// Parser for part detail pages
#[derive(Debug)]
pub struct PartPageParser {
    rules: CompiledRules,
    limits: ExtractionLimits,
    cascades: FieldCascades,
}

impl PartPageParser {
    /// Parser with the built-in rules and limits
    pub fn new() -> Result<Self, ParserBuildError> {
        Self::with_config(&PartPageRules::default(), ExtractionLimits::default())
    }

    pub fn with_config(rules: &PartPageRules, limits: ExtractionLimits) -> Result<Self, ParserBuildError> {
        Ok(Self {
            rules: rules.compile()?,
            limits,
            cascades: FieldCascades::default(),
        })
    }

    /// Replace the strategy cascades
    pub fn with_cascades(mut self, cascades: FieldCascades) -> Self {
        self.cascades = cascades;
        self
    }

    pub fn limits(&self) -> &ExtractionLimits {
        &self.limits
    }

    /// Strategy names for `field` in evaluation order
    pub fn strategy_order(&self, field: PartField) -> Vec<&'static str> {
        match field {
            PartField::DisplayName => self.cascades.display_name.strategy_names(),
            PartField::Price => self.cascades.price.strategy_names(),
            PartField::Description => self.cascades.description.strategy_names(),
            PartField::SymptomsFixed => self.cascades.symptoms_fixed.strategy_names(),
            PartField::CompatibleModels => self.cascades.compatible_models.strategy_names(),
            PartField::InstallSteps => self.cascades.install_steps.strategy_names(),
        }
    }

    /// Parse `html` and extract every field for `identifier`
    pub fn extract(&self, html: &str, identifier: &PartIdentifier) -> ExtractedFields {
        let document = Html::parse_document(html);
        self.extract_document(&document, identifier)
    }

    pub fn extract_document(&self, document: &Html, identifier: &PartIdentifier) -> ExtractedFields {
        let ctx = ExtractionContext::new(document, &self.rules, &self.limits)
            .for_part(&identifier.id, identifier.manufacturer_id.as_deref());

        let mut fields = ExtractedFields::default();
        let hits = &mut fields.strategy_hits;

        if let Some(hit) = self.cascades.display_name.evaluate(&ctx) {
            hits.push((PartField::DisplayName, hit.strategy));
            fields.display_name = Some(hit.value);
        }
        if let Some(hit) = self.cascades.price.evaluate(&ctx) {
            hits.push((PartField::Price, hit.strategy));
            fields.price = Some(hit.value);
        }
        if let Some(hit) = self.cascades.description.evaluate(&ctx) {
            hits.push((PartField::Description, hit.strategy));
            fields.description = Some(hit.value);
        }
        if let Some(hit) = self.cascades.symptoms_fixed.evaluate(&ctx) {
            hits.push((PartField::SymptomsFixed, hit.strategy));
            fields.symptoms_fixed = hit.value;
        }
        if let Some(hit) = self.cascades.compatible_models.evaluate(&ctx) {
            hits.push((PartField::CompatibleModels, hit.strategy));
            fields.compatible_models = hit.value;
        }
        if let Some(hit) = self.cascades.install_steps.evaluate(&ctx) {
            hits.push((PartField::InstallSteps, hit.strategy));
            fields.install_steps = hit.value;
        }

        debug!(
            "Extracted {} of {} fields for {}",
            fields.strategy_hits.len(),
            PartField::ALL.len(),
            identifier.id
        );
        fields
    }
}
