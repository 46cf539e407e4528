use async_trait::async_trait;
use domain_pricing::services::{RdsKey, RdsSchema};
use domain_pricing::{CacheStatus, PricingClient, PricingResult, RefreshOrchestrator};
use observability::cost::RDS_USD_PER_HOUR;
use observability::CostSample;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::{price_or_skip, refresh_if_due, refresh_now, Collection, Collector, Discount};
use crate::inventory::Resources;

pub struct RdsCollector {
    prices: RefreshOrchestrator<RdsSchema>,
    discount: Discount,
}

impl RdsCollector {
    pub fn new(
        regions: Vec<String>,
        clients: HashMap<String, Arc<dyn PricingClient>>,
        interval: Duration,
        max_concurrency: usize,
        discount: Discount,
    ) -> Self {
        Self {
            prices: RefreshOrchestrator::new(RdsSchema, regions, clients, interval)
                .with_max_concurrency(max_concurrency),
            discount,
        }
    }
}

#[async_trait]
impl Collector for RdsCollector {
    fn name(&self) -> &'static str {
        self.prices.service()
    }

    async fn collect(&self, resources: &Resources, cancel: &mut watch::Receiver<bool>) -> Collection {
        let refresh_error = refresh_if_due(&self.prices, cancel).await;
        let cache = self.prices.cache();

        let mut samples = Vec::with_capacity(resources.rds_instances.len());
        for database in &resources.rds_instances {
            let key = RdsKey::new(
                database.instance_class.as_str(),
                database.engine.as_str(),
                database.deployment.as_str(),
            );
            let lookup = cache.get(&database.region, &key).await;
            let Some(price) = price_or_skip(self.name(), &database.id, lookup) else {
                continue;
            };

            samples.push(
                CostSample::new(RDS_USD_PER_HOUR, self.discount.apply(price.usd_per_hour))
                    .with_label("region", database.region.clone())
                    .with_label("db_instance_id", database.id.clone())
                    .with_label("instance_class", database.instance_class.clone())
                    .with_label("engine", database.engine.clone())
                    .with_label("deployment", database.deployment.clone()),
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
