//! Ordered, named extraction strategies with first-non-empty early exit.

use std::fmt;

use tracing::{debug, trace};

use super::context::ExtractionContext;
use crate::domain::Price;

/// Decides whether a strategy result counts as "found"
pub trait Extracted {
    fn is_blank(&self) -> bool;
}

impl Extracted for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl<T> Extracted for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Extracted for Price {
    fn is_blank(&self) -> bool {
        false
    }
}

pub type StrategyFn<T> = fn(&ExtractionContext<'_>) -> Option<T>;

/// A pure function of the extraction context, tagged with a stable name
pub struct Strategy<T> {
    pub name: &'static str,
    pub extract: StrategyFn<T>,
}

impl<T> Strategy<T> {
    pub const fn new(name: &'static str, extract: StrategyFn<T>) -> Self {
        Self { name, extract }
    }
}

impl<T> Clone for Strategy<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Strategy<T> {}

impl<T> fmt::Debug for Strategy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy").field("name", &self.name).finish()
    }
}

/// Value produced by a cascade together with the strategy that found it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction<T> {
    pub value: T,
    pub strategy: &'static str,
}

#[derive(Debug, Clone)]
pub struct FieldCascade<T> {
    field: &'static str,
    strategies: Vec<Strategy<T>>,
}

impl<T: Extracted> FieldCascade<T> {
    pub fn new(field: &'static str, strategies: Vec<Strategy<T>>) -> Self {
        Self { field, strategies }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name).collect()
    }

    /// Run strategies in order; the first non-blank result wins.
    pub fn evaluate(&self, ctx: &ExtractionContext<'_>) -> Option<Extraction<T>> {
        for strategy in &self.strategies {
            match (strategy.extract)(ctx) {
                Some(value) if !value.is_blank() => {
                    debug!("{} for {} found by '{}'", self.field, ctx.identifier, strategy.name);
                    return Some(Extraction {
                        value,
                        strategy: strategy.name,
                    });
                }
                _ => trace!("{} strategy '{}' found nothing", self.field, strategy.name),
            }
        }

        debug!("No strategy produced {} for {}", self.field, ctx.identifier);
        None
    }
}
