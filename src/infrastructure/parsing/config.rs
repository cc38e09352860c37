//! Parsing configuration for part page extraction
//!
//! Centralized configuration for CSS selectors, anchor phrases and the size
//! limits applied to extracted values.

use regex::{Regex, RegexBuilder};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::ParserBuildError;

/// Selectors and anchor phrases for part detail pages.
///
/// Selector lists are tried in order; phrase patterns are matched
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartPageRules {
    pub title: Vec<String>,
    pub heading: Vec<String>,

    /// Machine-readable price carriers (content attribute preferred)
    pub structured_price: Vec<String>,
    /// Visible price containers
    pub price_element: Vec<String>,

    pub itemprop_description: Vec<String>,
    pub description_container: Vec<String>,
    pub meta_description: Vec<String>,

    /// Links that point at a model page
    pub model_link: Vec<String>,
    pub spare_part_itemprop: Vec<String>,

    /// Elements that may carry an installation heading
    pub install_heading: Vec<String>,

    pub symptoms_anchor: String,
    pub symptoms_keyword_anchor: String,
    pub models_anchor: String,
    pub install_anchor: String,

    /// First capture group is the numeric part of a currency-like token
    pub price_token: String,
}

impl Default for PartPageRules {
    fn default() -> Self {
        Self {
            title: strings(&["title"]),
            heading: strings(&["h1"]),
            structured_price: strings(&[
                "meta[property='product:price:amount']",
                "[itemprop='price']",
            ]),
            price_element: strings(&[
                "span.price",
                "div.price",
                ".product-price",
                "[class*='price']",
            ]),
            itemprop_description: strings(&["[itemprop='description']"]),
            description_container: strings(&[
                "div.product-description",
                "div.description",
                "p.description",
            ]),
            meta_description: strings(&["meta[name='description']"]),
            model_link: strings(&["a[href*='/Models/']"]),
            spare_part_itemprop: strings(&["[itemprop='isAccessoryOrSparePartFor']"]),
            install_heading: strings(&["h1", "h2", "h3", "h4", "strong"]),
            symptoms_anchor: r"fix(?:es)? the following symptoms?".to_string(),
            symptoms_keyword_anchor: r"symptom|problem|issue".to_string(),
            models_anchor: r"works? with.*following|compatible.*models?".to_string(),
            install_anchor: r"installation|how to (?:install|replace)".to_string(),
            price_token: r"\$?\s*(\d[\d,]*(?:\.\d+)?)".to_string(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_string()).collect()
}

/// Bounds applied while collecting field values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionLimits {
    pub min_description_chars: usize,
    pub max_description_chars: usize,
    pub min_symptom_chars: usize,
    pub max_symptoms: usize,
    /// Cap for the loose keyword-anchored symptom strategy
    pub max_symptoms_fallback: usize,
    pub min_model_chars: usize,
    pub max_compatible_models: usize,
    pub max_install_steps: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            min_description_chars: 50,
            max_description_chars: 800,
            min_symptom_chars: 6,
            max_symptoms: 10,
            max_symptoms_fallback: 5,
            min_model_chars: 4,
            max_compatible_models: 15,
            max_install_steps: 15,
        }
    }
}

/// Selectors and patterns compiled once per parser
#[derive(Debug)]
pub struct CompiledRules {
    pub title: Vec<Selector>,
    pub heading: Vec<Selector>,
    pub structured_price: Vec<Selector>,
    pub price_element: Vec<Selector>,
    pub itemprop_description: Vec<Selector>,
    pub description_container: Vec<Selector>,
    pub meta_description: Vec<Selector>,
    pub model_link: Vec<Selector>,
    pub spare_part_itemprop: Vec<Selector>,
    pub install_heading: Vec<Selector>,
    pub symptoms_anchor: Regex,
    pub symptoms_keyword_anchor: Regex,
    pub models_anchor: Regex,
    pub install_anchor: Regex,
    pub price_token: Regex,
}

impl PartPageRules {
    pub fn compile(&self) -> Result<CompiledRules, ParserBuildError> {
        Ok(CompiledRules {
            title: compile_selectors("title", &self.title)?,
            heading: compile_selectors("heading", &self.heading)?,
            structured_price: compile_selectors("structured_price", &self.structured_price)?,
            price_element: compile_selectors("price_element", &self.price_element)?,
            itemprop_description: compile_selectors("itemprop_description", &self.itemprop_description)?,
            description_container: compile_selectors("description_container", &self.description_container)?,
            meta_description: compile_selectors("meta_description", &self.meta_description)?,
            model_link: compile_selectors("model_link", &self.model_link)?,
            spare_part_itemprop: compile_selectors("spare_part_itemprop", &self.spare_part_itemprop)?,
            install_heading: compile_selectors("install_heading", &self.install_heading)?,
            symptoms_anchor: compile_pattern("symptoms_anchor", &self.symptoms_anchor)?,
            symptoms_keyword_anchor: compile_pattern("symptoms_keyword_anchor", &self.symptoms_keyword_anchor)?,
            models_anchor: compile_pattern("models_anchor", &self.models_anchor)?,
            install_anchor: compile_pattern("install_anchor", &self.install_anchor)?,
            price_token: compile_pattern("price_token", &self.price_token)?,
        })
    }
}

/// Compile selector strings, skipping invalid ones.
///
/// Fails only when a non-empty list yields no usable selector.
fn compile_selectors(rule: &'static str, selector_strings: &[String]) -> Result<Vec<Selector>, ParserBuildError> {
    let mut selectors = Vec::new();
    let mut errors = Vec::new();

    for selector_str in selector_strings {
        match Selector::parse(selector_str) {
            Ok(selector) => selectors.push(selector),
            Err(e) => {
                warn!("Failed to compile {} selector '{}': {}", rule, selector_str, e);
                errors.push(format!("'{selector_str}': {e}"));
            }
        }
    }

    if selectors.is_empty() && !selector_strings.is_empty() {
        return Err(ParserBuildError::NoValidSelectors { rule, errors });
    }

    if !errors.is_empty() {
        debug!("Some {} selectors failed to compile: {}", rule, errors.join(", "));
    }

    Ok(selectors)
}

fn compile_pattern(rule: &'static str, pattern: &str) -> Result<Regex, ParserBuildError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ParserBuildError::InvalidPattern { rule, source })
}
