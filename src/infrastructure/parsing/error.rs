//! Errors raised while building a parser from configuration.
//!
//! Extraction itself never fails: a field with no match is simply empty.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserBuildError {
    #[error("no valid selectors for rule '{rule}': {}", .errors.join(", "))]
    NoValidSelectors {
        rule: &'static str,
        errors: Vec<String>,
    },

    #[error("invalid pattern for rule '{rule}': {source}")]
    InvalidPattern {
        rule: &'static str,
        #[source]
        source: regex::Error,
    },
}
