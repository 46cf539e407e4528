use async_trait::async_trait;
use domain_pricing::services::ComputeSchema;
use domain_pricing::{CacheStatus, PricingClient, PricingResult, RefreshOrchestrator};
use observability::cost::{EC2_CPU_USD_PER_CORE_HOUR, EC2_MEMORY_USD_PER_GIB_HOUR, EC2_TOTAL_USD_PER_HOUR};
use observability::CostSample;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::{price_or_skip, refresh_if_due, refresh_now, Collection, Collector, Discount};
use crate::inventory::Resources;

/// On-demand Linux instance prices, split into CPU and RAM
pub struct Ec2Collector {
    prices: RefreshOrchestrator<ComputeSchema>,
    discount: Discount,
}

impl Ec2Collector {
    pub fn new(
        regions: Vec<String>,
        clients: HashMap<String, Arc<dyn PricingClient>>,
        interval: Duration,
        max_concurrency: usize,
        discount: Discount,
    ) -> Self {
        Self {
            prices: RefreshOrchestrator::new(ComputeSchema, regions, clients, interval)
                .with_max_concurrency(max_concurrency),
            discount,
        }
    }
}

#[async_trait]
impl Collector for Ec2Collector {
    fn name(&self) -> &'static str {
        self.prices.service()
    }

    async fn collect(&self, resources: &Resources, cancel: &mut watch::Receiver<bool>) -> Collection {
        let refresh_error = refresh_if_due(&self.prices, cancel).await;
        let cache = self.prices.cache();

        let mut samples = Vec::with_capacity(resources.instances.len() * 3);
        for instance in &resources.instances {
            let lookup = cache.get(&instance.region, instance.instance_type.as_str()).await;
            let Some(price) = price_or_skip(self.name(), &instance.id, lookup) else {
                continue;
            };

            let family = price.attributes.family.clone().unwrap_or_default();
            let sample = |name: &'static str, value: f64| {
                CostSample::new(name, self.discount.apply(value))
                    .with_label("region", instance.region.clone())
                    .with_label("instance_id", instance.id.clone())
                    .with_label("instance_type", instance.instance_type.clone())
                    .with_label("family", family.clone())
                    .with_label("price_tier", "ondemand")
            };

            samples.push(sample(EC2_CPU_USD_PER_CORE_HOUR, price.cpu_usd_per_core_hour));
            samples.push(sample(EC2_MEMORY_USD_PER_GIB_HOUR, price.ram_usd_per_gib_hour));
            samples.push(sample(EC2_TOTAL_USD_PER_HOUR, price.total_usd_per_hour));
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
