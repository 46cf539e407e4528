//! Multi-region refresh orchestration.
//!
//! One price-list request per configured region, at most
//! `max_concurrency` in flight. The refresh is all-or-nothing: the cache is
//! only replaced when every region succeeded, and a failed or cancelled
//! refresh leaves the previous snapshot in place.

use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::cache::PricingCache;
use crate::client::PricingClient;
use crate::error::{PricingError, PricingResult};
use crate::parser::parse_price_list;
use crate::schema::PricingSchema;

/// Regional price-list requests allowed in flight at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// How long a failed refresh holds off the next due-driven attempt
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(30);

/// Resolves once `signal` is set to `true`.
///
/// A dropped sender means nobody can cancel any more, so the future then
/// stays pending forever.
pub async fn cancelled(signal: &mut watch::Receiver<bool>) {
    let fired = signal.wait_for(|cancelled| *cancelled).await.is_ok();
    if !fired {
        std::future::pending::<()>().await;
    }
}

/// A cancellation signal that never fires
pub fn never_cancelled() -> watch::Receiver<bool> {
    let (_sender, receiver) = watch::channel(false);
    receiver
}

/// Outcome of one successful refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub service: &'static str,
    pub regions: usize,
    pub documents: usize,
    pub products: usize,
    pub skipped_documents: usize,
    pub skipped_dimensions: usize,
    pub duration: Duration,
}

pub struct RefreshOrchestrator<S: PricingSchema> {
    schema: S,
    regions: Vec<String>,
    clients: HashMap<String, Arc<dyn PricingClient>>,
    cache: Arc<PricingCache<S::Key, S::Detail>>,
    interval: Duration,
    max_concurrency: usize,
    retry_backoff: Duration,
    /// Held for the whole refresh so one cache never refreshes twice at once
    gate: Mutex<()>,
}

impl<S: PricingSchema> RefreshOrchestrator<S> {
    pub fn new(
        schema: S,
        regions: Vec<String>,
        clients: HashMap<String, Arc<dyn PricingClient>>,
        interval: Duration,
    ) -> Self {
        Self {
            schema,
            regions,
            clients,
            cache: Arc::new(PricingCache::new()),
            interval,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            gate: Mutex::new(()),
        }
    }

    /// Override the in-flight bound (minimum 1)
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Override the pause after a failed refresh before scrapes retry
    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn cache(&self) -> &Arc<PricingCache<S::Key, S::Detail>> {
        &self.cache
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn service(&self) -> &'static str {
        self.schema.service()
    }

    /// Refresh unconditionally, waiting for any refresh already running
    pub async fn refresh(
        &self,
        cancel: &mut watch::Receiver<bool>,
    ) -> PricingResult<RefreshSummary> {
        let _gate = self.gate.lock().await;
        self.refresh_locked(cancel).await
    }

    /// Refresh only when the cache is due. Returns `None` when it was not.
    ///
    /// Callers that queued behind another refresh re-check after taking the
    /// gate, so a burst of scrapes triggers a single fetch. A failed refresh
    /// holds the cache back for `retry_backoff`, so the queued callers behind
    /// it return `None` instead of fetching again.
    pub async fn refresh_if_due(
        &self,
        cancel: &mut watch::Receiver<bool>,
    ) -> PricingResult<Option<RefreshSummary>> {
        if !self.cache.is_due(Utc::now()).await {
            return Ok(None);
        }

        let _gate = self.gate.lock().await;
        if !self.cache.is_due(Utc::now()).await {
            debug!(service = self.service(), "Cache refreshed while waiting");
            return Ok(None);
        }

        self.refresh_locked(cancel).await.map(Some)
    }

    async fn refresh_locked(
        &self,
        cancel: &mut watch::Receiver<bool>,
    ) -> PricingResult<RefreshSummary> {
        let started = Instant::now();
        let service = self.service();

        let documents = match self.fetch_all(cancel).await {
            Ok(documents) => documents,
            Err(e) => {
                warn!(service, error = %e, "Pricing refresh failed, keeping previous snapshot");
                if e != PricingError::Cancelled {
                    self.cache.mark_failed(Utc::now(), self.retry_backoff).await;
                }
                return Err(e);
            }
        };

        let parsed = parse_price_list(&documents);
        let previous = self.cache.snapshot().await;
        let snapshot = self.schema.build(&parsed, &previous);

        // A cancel that lands while parsing still leaves the cache untouched
        if *cancel.borrow() {
            return Err(PricingError::Cancelled);
        }

        let summary = RefreshSummary {
            service,
            regions: snapshot.len(),
            documents: documents.len(),
            products: parsed.products.len(),
            skipped_documents: parsed.skipped_documents,
            skipped_dimensions: parsed.skipped_dimensions,
            duration: started.elapsed(),
        };

        self.cache.commit(snapshot, Utc::now(), self.interval).await;

        info!(
            service,
            regions = summary.regions,
            documents = summary.documents,
            products = summary.products,
            duration_ms = summary.duration.as_millis() as u64,
            "Pricing cache refreshed"
        );

        Ok(summary)
    }

    /// Fan out one request per region and gather every document.
    ///
    /// The first failure (or a cancel) wins. Requests already in flight are
    /// left to finish in the background; their results go to a buffer
    /// nobody reads any more.
    async fn fetch_all(&self, cancel: &mut watch::Receiver<bool>) -> PricingResult<Vec<String>> {
        if *cancel.borrow() {
            return Err(PricingError::Cancelled);
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let buffer: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let filters: Arc<[_]> = self.schema.filters().into();
        let service_code = self.schema.service_code();

        let mut tasks = JoinSet::new();
        for region in &self.regions {
            let region = region.clone();
            let client = self.clients.get(&region).cloned();
            let semaphore = semaphore.clone();
            let buffer = buffer.clone();
            let filters = filters.clone();

            tasks.spawn(async move {
                let client = client.ok_or_else(|| PricingError::ClientNotFound(region.clone()))?;

                // Closed once the refresh has already failed
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| PricingError::Cancelled)?;

                let documents = client.list_prices(service_code, &region, &filters).await?;
                debug!(region = %region, service_code, documents = documents.len(), "Fetched price list");

                buffer.lock().await.extend(documents);
                Ok::<_, PricingError>(())
            });
        }

        loop {
            let outcome = tokio::select! {
                _ = cancelled(cancel) => Err(PricingError::Cancelled),
                next = tasks.join_next() => match next {
                    None => break,
                    Some(Ok(Ok(()))) => Ok(()),
                    Some(Ok(Err(e))) => Err(e),
                    Some(Err(e)) => Err(PricingError::Task(e.to_string())),
                },
            };

            if let Err(e) = outcome {
                semaphore.close();
                tasks.detach_all();
                return Err(e);
            }
        }

        let documents = std::mem::take(&mut *buffer.lock().await);
        Ok(documents)
    }
}
