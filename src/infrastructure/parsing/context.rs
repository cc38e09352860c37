//! Extraction context shared by every field strategy
//!
//! Borrowed for the duration of one synchronous extraction; the parsed
//! document never outlives the call that created it.

use scraper::Html;

use super::config::{CompiledRules, ExtractionLimits};

/// Everything a strategy may look at
#[derive(Clone, Copy)]
pub struct ExtractionContext<'a> {
    pub document: &'a Html,
    pub rules: &'a CompiledRules,
    pub limits: &'a ExtractionLimits,

    /// Identifier and manufacturer number of the page's part, used to trim
    /// them out of the display name
    pub identifier: &'a str,
    pub manufacturer_id: Option<&'a str>,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(document: &'a Html, rules: &'a CompiledRules, limits: &'a ExtractionLimits) -> Self {
        Self {
            document,
            rules,
            limits,
            identifier: "",
            manufacturer_id: None,
        }
    }

    pub fn for_part(mut self, identifier: &'a str, manufacturer_id: Option<&'a str>) -> Self {
        self.identifier = identifier;
        self.manufacturer_id = manufacturer_id;
        self
    }
}
