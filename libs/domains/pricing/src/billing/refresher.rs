use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::cache::PricingCache;
use crate::error::{PricingError, PricingResult};
use crate::refresh::{cancelled, DEFAULT_RETRY_BACKOFF};

use super::client::BillingClient;
use super::data::{BillingComponent, BillingData};
use super::decoder::decode_usage_key;

pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// Outcome of one successful billing refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub pages: usize,
    pub groups: usize,
    /// Groups that could not be attributed to a region and component
    pub dropped: usize,
    pub regions: usize,
    pub duration: Duration,
}

/// Pages through the cost report for a look-back window and swaps the
/// aggregated result into the billing cache.
pub struct BillingRefresher {
    client: Arc<dyn BillingClient>,
    cache: Arc<PricingCache<String, BillingComponent>>,
    interval: Duration,
    lookback_days: u32,
    retry_backoff: Duration,
    gate: Mutex<()>,
}

impl BillingRefresher {
    pub fn new(client: Arc<dyn BillingClient>, interval: Duration) -> Self {
        Self {
            client,
            cache: Arc::new(PricingCache::new()),
            interval,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            gate: Mutex::new(()),
        }
    }

    pub fn with_lookback_days(mut self, lookback_days: u32) -> Self {
        self.lookback_days = lookback_days.max(1);
        self
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn cache(&self) -> &Arc<PricingCache<String, BillingComponent>> {
        &self.cache
    }

    /// `[today - lookback, today)`
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = today
            .checked_sub_days(Days::new(u64::from(self.lookback_days)))
            .unwrap_or(NaiveDate::MIN);
        (start, today)
    }

    pub async fn refresh(&self, cancel: &mut watch::Receiver<bool>) -> PricingResult<BillingSummary> {
        let _gate = self.gate.lock().await;
        self.refresh_locked(cancel).await
    }

    pub async fn refresh_if_due(
        &self,
        cancel: &mut watch::Receiver<bool>,
    ) -> PricingResult<Option<BillingSummary>> {
        if !self.cache.is_due(Utc::now()).await {
            return Ok(None);
        }

        let _gate = self.gate.lock().await;
        if !self.cache.is_due(Utc::now()).await {
            return Ok(None);
        }

        self.refresh_locked(cancel).await.map(Some)
    }

    async fn refresh_locked(&self, cancel: &mut watch::Receiver<bool>) -> PricingResult<BillingSummary> {
        let result = self.fetch_and_commit(cancel).await;
        if matches!(&result, Err(e) if *e != PricingError::Cancelled) {
            self.cache.mark_failed(Utc::now(), self.retry_backoff).await;
        }
        result
    }

    async fn fetch_and_commit(&self, cancel: &mut watch::Receiver<bool>) -> PricingResult<BillingSummary> {
        let started = Instant::now();
        let (start, end) = self.window(Utc::now().date_naive());

        let mut data = BillingData::new();
        let mut next_page_token: Option<String> = None;
        let mut pages = 0;
        let mut groups = 0;
        let mut dropped = 0;

        loop {
            if *cancel.borrow() {
                return Err(PricingError::Cancelled);
            }

            let page = tokio::select! {
                _ = cancelled(cancel) => return Err(PricingError::Cancelled),
                page = self.client.get_cost_and_usage(start, end, next_page_token.take()) => page,
            };
            let page = page
                .inspect_err(|e| warn!(error = %e, "Billing refresh failed, keeping previous data"))?;
            pages += 1;

            for group in page.results_by_time.iter().flat_map(|result| result.groups.iter()) {
                groups += 1;
                let Some(key) = group.usage_key() else {
                    dropped += 1;
                    continue;
                };

                let (region, component) = decode_usage_key(key);
                if region.is_empty() || component.is_empty() {
                    debug!(key, "Dropping unattributable billing line");
                    dropped += 1;
                    continue;
                }
                data.add_metric_group(&region, &component, group);
            }

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => next_page_token = Some(token),
                None => break,
            }
        }

        let regions = data.into_regions();
        let summary = BillingSummary {
            start,
            end,
            pages,
            groups,
            dropped,
            regions: regions.len(),
            duration: started.elapsed(),
        };

        self.cache.commit(regions, Utc::now(), self.interval).await;

        info!(
            pages = summary.pages,
            groups = summary.groups,
            dropped = summary.dropped,
            regions = summary.regions,
            "Billing data refreshed"
        );

        Ok(summary)
    }
}
