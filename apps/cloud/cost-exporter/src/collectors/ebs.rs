use async_trait::async_trait;
use domain_pricing::services::StorageSchema;
use domain_pricing::{CacheStatus, PricingClient, PricingResult, RefreshOrchestrator};
use observability::cost::EBS_USD_PER_GIB_HOUR;
use observability::CostSample;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::{price_or_skip, refresh_if_due, refresh_now, Collection, Collector, Discount};
use crate::inventory::Resources;

/// Block storage per GiB-hour
pub struct EbsCollector {
    prices: RefreshOrchestrator<StorageSchema>,
    discount: Discount,
}

impl EbsCollector {
    pub fn new(
        regions: Vec<String>,
        clients: HashMap<String, Arc<dyn PricingClient>>,
        interval: Duration,
        max_concurrency: usize,
        discount: Discount,
    ) -> Self {
        Self {
            prices: RefreshOrchestrator::new(StorageSchema, regions, clients, interval)
                .with_max_concurrency(max_concurrency),
            discount,
        }
    }
}

#[async_trait]
impl Collector for EbsCollector {
    fn name(&self) -> &'static str {
        self.prices.service()
    }

    async fn collect(&self, resources: &Resources, cancel: &mut watch::Receiver<bool>) -> Collection {
        let refresh_error = refresh_if_due(&self.prices, cancel).await;
        let cache = self.prices.cache();

        let mut samples = Vec::with_capacity(resources.volumes.len());
        for volume in &resources.volumes {
            let lookup = cache.get(&volume.region, volume.volume_type.as_str()).await;
            let Some(price) = price_or_skip(self.name(), &volume.id, lookup) else {
                continue;
            };

            samples.push(
                CostSample::new(EBS_USD_PER_GIB_HOUR, self.discount.apply(price.usd_per_gib_hour))
                    .with_label("region", volume.region.clone())
                    .with_label("volume_id", volume.id.clone())
                    .with_label("volume_type", volume.volume_type.clone())
                    .with_label("size_gib", volume.size_gib.to_string()),
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
