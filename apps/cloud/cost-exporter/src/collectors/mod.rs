//! Per-service cost collectors.
//!
//! Every scrape runs each collector: refresh its cache when due (the scrape
//! waits), then price the observed resources from whatever snapshot the cache
//! holds. A failed refresh is reported but never empties the cache.

mod ebs;
mod ec2;
mod elb;
mod natgw;
mod rds;
mod s3;
mod vpc;

pub use ebs::EbsCollector;
pub use ec2::Ec2Collector;
pub use elb::ElbCollector;
pub use natgw::NatGatewayCollector;
pub use rds::RdsCollector;
pub use s3::S3Collector;
pub use vpc::VpcCollector;

use async_trait::async_trait;
use domain_pricing::{
    CacheStatus, PricingError, PricingResult, PricingSchema, RefreshOrchestrator, RefreshSummary,
};
use futures::future::join_all;
use observability::{CostSample, RefreshMetrics, RefreshTimer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::inventory::{Inventory, Resources};

/// Output of one collector run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Collection {
    pub samples: Vec<CostSample>,
    /// Set when a due refresh failed; samples then come from the previous snapshot
    pub refresh_error: Option<String>,
}

#[async_trait]
pub trait Collector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Refresh if due, then price `resources`
    async fn collect(&self, resources: &Resources, cancel: &mut watch::Receiver<bool>) -> Collection;

    /// Refresh unconditionally
    async fn refresh(&self, cancel: &mut watch::Receiver<bool>) -> PricingResult<()>;

    async fn status(&self) -> CacheStatus;
}

/// Single configurable discount on price-list rates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Discount {
    percent: f64,
}

impl Discount {
    pub fn new(percent: f64) -> Self {
        Self {
            percent: percent.clamp(0.0, 100.0),
        }
    }

    pub fn apply(&self, price: f64) -> f64 {
        price * (1.0 - self.percent / 100.0)
    }
}

fn record_refresh(summary: &RefreshSummary) {
    RefreshMetrics::record_skipped(
        summary.service,
        summary.skipped_documents,
        summary.skipped_dimensions,
    );
    info!(
        service = summary.service,
        regions = summary.regions,
        products = summary.products,
        "Pricing refreshed"
    );
}

/// Scrape-time refresh. Returns the error message when a due refresh failed.
pub(crate) async fn refresh_if_due<S: PricingSchema>(
    orchestrator: &RefreshOrchestrator<S>,
    cancel: &mut watch::Receiver<bool>,
) -> Option<String> {
    match orchestrator.refresh_if_due(cancel).await {
        Ok(Some(summary)) => {
            RefreshMetrics::record_success(summary.service, summary.duration.as_secs_f64());
            record_refresh(&summary);
            None
        }
        Ok(None) => None,
        Err(e) => {
            RefreshMetrics::record_failure(orchestrator.service(), &e.to_string());
            warn!(service = orchestrator.service(), "Serving last known prices");
            Some(e.to_string())
        }
    }
}

pub(crate) async fn refresh_now<S: PricingSchema>(
    orchestrator: &RefreshOrchestrator<S>,
    cancel: &mut watch::Receiver<bool>,
) -> PricingResult<()> {
    let timer = RefreshTimer::start(orchestrator.service());
    match orchestrator.refresh(cancel).await {
        Ok(summary) => {
            timer.succeed();
            record_refresh(&summary);
            Ok(())
        }
        Err(e) => {
            timer.fail(&e.to_string());
            Err(e)
        }
    }
}

/// Price for a resource in services that only skip on missing data
pub(crate) fn price_or_skip<V>(service: &str, resource: &str, lookup: PricingResult<V>) -> Option<V> {
    match lookup {
        Ok(price) => Some(price),
        Err(e) => {
            warn!(service, resource, error = %e, "No price, skipping resource");
            None
        }
    }
}

/// Price for a resource in services with a default rate.
///
/// A region without any pricing data yields `fallback`; a region that is
/// priced but lacks the key is skipped.
pub(crate) fn price_or_fallback(
    service: &str,
    resource: &str,
    lookup: PricingResult<f64>,
    fallback: f64,
) -> Option<f64> {
    match lookup {
        Ok(price) => Some(price),
        Err(PricingError::RegionNotFound(region)) => {
            warn!(service, resource, region, fallback, "No pricing for region, using default rate");
            Some(fallback)
        }
        Err(e) => {
            warn!(service, resource, error = %e, "No price, skipping resource");
            None
        }
    }
}

/// Output of one scrape across all collectors
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scrape {
    pub samples: Vec<CostSample>,
    /// Collector (or `inventory`) name to error message
    pub errors: BTreeMap<String, String>,
}

pub struct CollectorRegistry {
    collectors: Vec<Arc<dyn Collector>>,
    inventory: Arc<dyn Inventory>,
}

impl CollectorRegistry {
    pub fn new(inventory: Arc<dyn Inventory>) -> Self {
        Self {
            collectors: Vec::new(),
            inventory,
        }
    }

    pub fn register(&mut self, collector: Arc<dyn Collector>) {
        self.collectors.push(collector);
    }

    pub fn collectors(&self) -> &[Arc<dyn Collector>] {
        &self.collectors
    }

    /// Run every collector concurrently against the current inventory
    pub async fn scrape(&self, cancel: &watch::Receiver<bool>) -> Scrape {
        let mut scrape = Scrape::default();

        let resources = match self.inventory.resources().await {
            Ok(resources) => resources,
            Err(e) => {
                warn!(error = %e, "Inventory unavailable, pricing no resources");
                RefreshMetrics::record_collector_error("inventory");
                scrape.errors.insert("inventory".to_string(), e.to_string());
                Resources::default()
            }
        };

        let runs = self.collectors.iter().map(|collector| {
            let mut cancel = cancel.clone();
            let resources = &resources;
            async move { (collector.name(), collector.collect(resources, &mut cancel).await) }
        });

        for (name, collection) in join_all(runs).await {
            if let Some(error) = collection.refresh_error {
                RefreshMetrics::record_collector_error(name);
                scrape.errors.insert(name.to_string(), error);
            }
            scrape.samples.extend(collection.samples);
        }

        scrape
    }

    /// Refresh every collector unconditionally; returns the failures
    pub async fn refresh_all(&self, cancel: &watch::Receiver<bool>) -> BTreeMap<String, PricingError> {
        let runs = self.collectors.iter().map(|collector| {
            let mut cancel = cancel.clone();
            async move { (collector.name(), collector.refresh(&mut cancel).await) }
        });

        join_all(runs)
            .await
            .into_iter()
            .filter_map(|(name, result)| result.err().map(|e| (name.to_string(), e)))
            .collect()
    }

    pub async fn status(&self) -> BTreeMap<String, CacheStatus> {
        let mut statuses = BTreeMap::new();
        for collector in &self.collectors {
            statuses.insert(collector.name().to_string(), collector.status().await);
        }
        statuses
    }
}
