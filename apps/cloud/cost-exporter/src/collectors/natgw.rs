use async_trait::async_trait;
use domain_pricing::services::{FallbackRates, NatGatewaySchema, NAT_GATEWAY_HOURS};
use domain_pricing::{CacheStatus, PricingClient, PricingResult, RefreshOrchestrator};
use observability::cost::NATGW_USD_PER_HOUR;
use observability::CostSample;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::{price_or_fallback, refresh_if_due, refresh_now, Collection, Collector, Discount};
use crate::inventory::Resources;

pub struct NatGatewayCollector {
    prices: RefreshOrchestrator<NatGatewaySchema>,
    discount: Discount,
    fallback: FallbackRates,
}

impl NatGatewayCollector {
    pub fn new(
        regions: Vec<String>,
        clients: HashMap<String, Arc<dyn PricingClient>>,
        interval: Duration,
        max_concurrency: usize,
        discount: Discount,
        fallback: FallbackRates,
    ) -> Self {
        Self {
            prices: RefreshOrchestrator::new(NatGatewaySchema, regions, clients, interval)
                .with_max_concurrency(max_concurrency),
            discount,
            fallback,
        }
    }
}

#[async_trait]
impl Collector for NatGatewayCollector {
    fn name(&self) -> &'static str {
        self.prices.service()
    }

    async fn collect(&self, resources: &Resources, cancel: &mut watch::Receiver<bool>) -> Collection {
        let refresh_error = refresh_if_due(&self.prices, cancel).await;
        let cache = self.prices.cache();

        let mut samples = Vec::with_capacity(resources.nat_gateways.len());
        for gateway in &resources.nat_gateways {
            let lookup = cache.get(&gateway.region, NAT_GATEWAY_HOURS).await;
            let Some(usd_per_hour) =
                price_or_fallback(self.name(), &gateway.id, lookup, self.fallback.nat_gateway)
            else {
                continue;
            };

            samples.push(
                CostSample::new(NATGW_USD_PER_HOUR, self.discount.apply(usd_per_hour))
                    .with_label("region", gateway.region.clone())
                    .with_label("nat_gateway_id", gateway.id.clone()),
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
