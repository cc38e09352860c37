//! Bounded worker pool over an identifier list
//!
//! Workers pull identifiers from a shared queue, resolve them one at a time
//! behind their own politeness pacer and send each outcome over a channel.
//! Cancelling the token stops dispatch; resolutions already started finish.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{FutureExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use super::part_resolver::PartResolver;
use super::request_pacer::RequestPacer;
use crate::domain::{FetchFailure, PartIdentifier, ScrapeOutcome};
use crate::infrastructure::config::ScrapeConfig;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("fetch timeout must be greater than zero")]
    ZeroFetchTimeout,
}

/// Read once before a run and never mutated during it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub concurrency: usize,
    pub politeness_delay: Duration,
    pub fetch_timeout: Duration,
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.concurrency == 0 {
            return Err(SchedulerError::ZeroConcurrency);
        }
        if self.fetch_timeout.is_zero() {
            return Err(SchedulerError::ZeroFetchTimeout);
        }
        Ok(())
    }
}

impl From<&ScrapeConfig> for SchedulerConfig {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            politeness_delay: config.politeness_delay(),
            fetch_timeout: config.fetch_timeout(),
        }
    }
}

/// Result of one scheduler run over one identifier list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeRun {
    pub run_id: Uuid,
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// One per dispatched identifier, in completion order
    pub outcomes: Vec<ScrapeOutcome>,

    /// Identifiers left in the queue when the run was cancelled
    pub not_dispatched: Vec<PartIdentifier>,
}

impl ScrapeRun {
    pub fn resolved_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_resolved()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.resolved_count()
    }
}

/// Outcomes as they arrive. Ends when every worker has exited.
pub struct ScrapeStream {
    run_id: Uuid,
    outcomes: ReceiverStream<ScrapeOutcome>,
    coordinator: JoinHandle<Vec<PartIdentifier>>,
}

impl ScrapeStream {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Wait for the workers to exit and return what was never dispatched.
    ///
    /// Any outcomes not yet consumed are dropped.
    pub async fn not_dispatched(self) -> Vec<PartIdentifier> {
        drop(self.outcomes);
        match self.coordinator.await {
            Ok(remaining) => remaining,
            Err(e) => {
                error!("Scrape coordinator failed: {}", e);
                Vec::new()
            }
        }
    }
}

impl Stream for ScrapeStream {
    type Item = ScrapeOutcome;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.outcomes).poll_next(cx)
    }
}

pub struct ScrapeScheduler {
    resolver: Arc<PartResolver>,
    config: SchedulerConfig,
}

impl ScrapeScheduler {
    pub fn new(resolver: Arc<PartResolver>, config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(Self { resolver, config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Start a run and consume outcomes as they complete
    pub fn stream(&self, identifiers: Vec<PartIdentifier>, cancel: CancellationToken) -> ScrapeStream {
        self.spawn_run(Uuid::new_v4(), "adhoc", identifiers, cancel)
    }

    /// Run to completion over `identifiers`
    pub async fn run(&self, identifiers: Vec<PartIdentifier>, cancel: CancellationToken) -> ScrapeRun {
        self.run_source("adhoc", identifiers, cancel).await
    }

    /// Run to completion, labelling logs and the result with `source`
    pub async fn run_source(
        &self,
        source: &str,
        identifiers: Vec<PartIdentifier>,
        cancel: CancellationToken,
    ) -> ScrapeRun {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let total = identifiers.len();

        let mut stream = self.spawn_run(run_id, source, identifiers, cancel);
        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = stream.next().await {
            outcomes.push(outcome);
        }
        let not_dispatched = stream.not_dispatched().await;

        let run = ScrapeRun {
            run_id,
            source: source.to_string(),
            started_at,
            finished_at: Utc::now(),
            outcomes,
            not_dispatched,
        };

        info!(
            "Run {} ({}) finished: {} resolved, {} failed, {} not dispatched",
            run.run_id,
            run.source,
            run.resolved_count(),
            run.failed_count(),
            run.not_dispatched.len()
        );
        run
    }

    fn spawn_run(
        &self,
        run_id: Uuid,
        source: &str,
        identifiers: Vec<PartIdentifier>,
        cancel: CancellationToken,
    ) -> ScrapeStream {
        let span = info_span!("scrape_run", run_id = %run_id, source = %source);
        let worker_count = self.config.concurrency.min(identifiers.len());
        let (tx, rx) = mpsc::channel(self.config.concurrency.saturating_mul(2).max(1));
        let queue = Arc::new(Mutex::new(VecDeque::from(identifiers)));

        let resolver = Arc::clone(&self.resolver);
        let config = self.config;

        let coordinator = tokio::spawn(
            async move {
                info!("🚀 Starting {} workers", worker_count);

                let handles: Vec<_> = (0..worker_count)
                    .map(|worker_id| {
                        let worker = Worker {
                            id: worker_id,
                            resolver: Arc::clone(&resolver),
                            queue: Arc::clone(&queue),
                            outcomes: tx.clone(),
                            cancel: cancel.clone(),
                            pacer: RequestPacer::new(config.politeness_delay),
                            fetch_timeout: config.fetch_timeout,
                        };
                        tokio::spawn(worker.run().in_current_span())
                    })
                    .collect();
                drop(tx);

                for (worker_id, result) in futures::future::join_all(handles).await.into_iter().enumerate() {
                    if let Err(e) = result {
                        error!("Worker {} terminated abnormally: {}", worker_id, e);
                    }
                }

                let remaining: Vec<PartIdentifier> = queue.lock().await.drain(..).collect();
                if !remaining.is_empty() {
                    info!("🛑 Run cancelled with {} identifiers not dispatched", remaining.len());
                }
                remaining
            }
            .instrument(span),
        );

        ScrapeStream {
            run_id,
            outcomes: ReceiverStream::new(rx),
            coordinator,
        }
    }
}

struct Worker {
    id: usize,
    resolver: Arc<PartResolver>,
    queue: Arc<Mutex<VecDeque<PartIdentifier>>>,
    outcomes: mpsc::Sender<ScrapeOutcome>,
    cancel: CancellationToken,
    pacer: RequestPacer,
    fetch_timeout: Duration,
}

impl Worker {
    async fn run(mut self) {
        debug!("👷 Worker {} started", self.id);

        loop {
            if self.cancel.is_cancelled() {
                debug!("🛑 Worker {} stopping: run cancelled", self.id);
                break;
            }

            let next = self.queue.lock().await.pop_front();
            let Some(identifier) = next else {
                break;
            };

            let resolution = self.resolver.resolve(&identifier, &mut self.pacer, self.fetch_timeout);
            let outcome = match AssertUnwindSafe(resolution).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!("Worker {} panicked while resolving {}", self.id, identifier.id);
                    ScrapeOutcome::Failed(FetchFailure {
                        identifier: identifier.id.clone(),
                        attempts: Vec::new(),
                    })
                }
            };

            if self.outcomes.send(outcome).await.is_err() {
                debug!("Worker {} stopping: outcome receiver dropped", self.id);
                break;
            }
        }

        debug!("👷 Worker {} finished", self.id);
    }
}
