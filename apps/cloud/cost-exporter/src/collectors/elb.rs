use async_trait::async_trait;
use domain_pricing::services::{FallbackRates, LoadBalancerSchema};
use domain_pricing::{CacheStatus, PricingClient, PricingResult, RefreshOrchestrator};
use observability::cost::ELB_USD_PER_HOUR;
use observability::CostSample;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::{price_or_fallback, refresh_if_due, refresh_now, Collection, Collector, Discount};
use crate::inventory::Resources;

/// Hourly load balancer rates, with a default per kind for unpriced regions
pub struct ElbCollector {
    prices: RefreshOrchestrator<LoadBalancerSchema>,
    discount: Discount,
    fallback: FallbackRates,
}

impl ElbCollector {
    pub fn new(
        regions: Vec<String>,
        clients: HashMap<String, Arc<dyn PricingClient>>,
        interval: Duration,
        max_concurrency: usize,
        discount: Discount,
        fallback: FallbackRates,
    ) -> Self {
        Self {
            prices: RefreshOrchestrator::new(LoadBalancerSchema, regions, clients, interval)
                .with_max_concurrency(max_concurrency),
            discount,
            fallback,
        }
    }
}

#[async_trait]
impl Collector for ElbCollector {
    fn name(&self) -> &'static str {
        self.prices.service()
    }

    async fn collect(&self, resources: &Resources, cancel: &mut watch::Receiver<bool>) -> Collection {
        let refresh_error = refresh_if_due(&self.prices, cancel).await;
        let cache = self.prices.cache();

        let mut samples = Vec::with_capacity(resources.load_balancers.len());
        for balancer in &resources.load_balancers {
            let lookup = cache
                .get(&balancer.region, &balancer.kind)
                .await
                .map(|price| price.usd_per_hour);
            let fallback = self.fallback.load_balancer(balancer.kind);
            let Some(usd_per_hour) = price_or_fallback(self.name(), &balancer.name, lookup, fallback) else {
                continue;
            };

            samples.push(
                CostSample::new(ELB_USD_PER_HOUR, self.discount.apply(usd_per_hour))
                    .with_label("region", balancer.region.clone())
                    .with_label("name", balancer.name.clone())
                    .with_label("type", balancer.kind.to_string()),
            );
        }

        Collection {
            samples,
            refresh_error,
        }
    }

    async fn refresh(&self, cancel: &mut watch::Receiver<bool>) -> PricingResult<()> {
        refresh_now(&self.prices, cancel).await
    }

    async fn status(&self) -> CacheStatus {
        self.prices.cache().status().await
    }
}
