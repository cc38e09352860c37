//! HTTP page fetcher with rate limiting and error classification
//!
//! Production `PageFetcher` backed by reqwest. A process-wide governor
//! limiter caps the request rate across every worker; each fetch is bounded
//! by the caller's timeout.

use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};

use crate::domain::{FetchError, PageFetcher};
use crate::infrastructure::config::HttpConfig;

/// reqwest-backed page fetcher
pub struct HttpPageFetcher {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    config: HttpConfig,
}

impl HttpPageFetcher {
    pub fn new(config: HttpConfig) -> Result<Self> {
        // Setup headers
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second).context("Rate limit must be greater than 0")?,
        );
        let rate_limiter = RateLimiter::direct(quota);

        Ok(Self {
            client,
            rate_limiter,
            config,
        })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let started = Instant::now();
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    elapsed: started.elapsed(),
                }
            } else {
                FetchError::network(e.to_string())
            }
        };

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(classify)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        // Wait for rate limiter
        self.rate_limiter.until_ready().await;

        tracing::debug!("Fetching URL: {}", url);

        match tokio::time::timeout(timeout, self.get_text(url, timeout)).await {
            Ok(Ok(text)) => {
                tracing::debug!("Successfully fetched: {} ({} chars)", url, text.len());
                Ok(text)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(FetchError::Timeout { elapsed: timeout }),
        }
    }
}
