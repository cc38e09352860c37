//! Page fetching seam and per-identifier outcomes.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::part::PartRecord;

/// Why a single fetch attempt failed. Every kind is recoverable at the
/// resolver level: the next candidate URL is tried.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("non-success status {status}")]
    Status { status: u16 },

    #[error("timed out after {}ms", .elapsed.as_millis())]
    Timeout { elapsed: Duration },
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }
}

/// Source of raw page content.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// Failure of one candidate URL
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AttemptError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("malformed document: {detail}")]
    MalformedDocument { detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchAttempt {
    pub url: String,
    pub error: AttemptError,
}

/// Every candidate URL for an identifier failed
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("all {} candidate URLs failed for {identifier}", .attempts.len())]
pub struct FetchFailure {
    pub identifier: String,
    pub attempts: Vec<FetchAttempt>,
}

impl FetchFailure {
    pub fn attempted_urls(&self) -> Vec<&str> {
        self.attempts.iter().map(|a| a.url.as_str()).collect()
    }
}

/// Exactly one of these is produced per dispatched identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScrapeOutcome {
    Resolved(PartRecord),
    Failed(FetchFailure),
}

impl ScrapeOutcome {
    pub fn identifier(&self) -> &str {
        match self {
            Self::Resolved(record) => &record.identifier,
            Self::Failed(failure) => &failure.identifier,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fetch_error_variants_carry_named_fields() {
        assert_eq!(
            serde_json::to_value(FetchError::Status { status: 404 }).unwrap(),
            json!({ "kind": "status", "status": 404 })
        );
        assert_eq!(
            serde_json::to_value(FetchError::network("connection refused")).unwrap(),
            json!({ "kind": "network", "message": "connection refused" })
        );

        let timeout = FetchError::Timeout {
            elapsed: Duration::from_millis(200),
        };
        assert_eq!(timeout.to_string(), "timed out after 200ms");
        let restored: FetchError = serde_json::from_value(serde_json::to_value(&timeout).unwrap()).unwrap();
        assert_eq!(restored, timeout);
    }
}
