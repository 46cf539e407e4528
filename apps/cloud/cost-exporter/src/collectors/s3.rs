use async_trait::async_trait;
use domain_pricing::billing::{BillingClient, BillingRefresher};
use domain_pricing::{CacheStatus, PricingResult};
use observability::cost::S3_UNIT_COST_USD;
use observability::{CostSample, RefreshMetrics, RefreshTimer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::warn;

use super::{Collection, Collector};
use crate::inventory::Resources;

const SERVICE: &str = "s3";

/// Unit costs derived from billed S3 usage.
///
/// Billing amounts are actual spend, so no discount applies.
pub struct S3Collector {
    billing: BillingRefresher,
}

impl S3Collector {
    pub fn new(client: Arc<dyn BillingClient>, interval: Duration, lookback_days: u32) -> Self {
        Self {
            billing: BillingRefresher::new(client, interval).with_lookback_days(lookback_days),
        }
    }
}

#[async_trait]
impl Collector for S3Collector {
    fn name(&self) -> &'static str {
        SERVICE
    }

    /// Emits one sample per billed (region, component); needs no inventory
    async fn collect(&self, _resources: &Resources, cancel: &mut watch::Receiver<bool>) -> Collection {
        let refresh_error = match self.billing.refresh_if_due(cancel).await {
            Ok(Some(summary)) => {
                RefreshMetrics::record_success(SERVICE, summary.duration.as_secs_f64());
                None
            }
            Ok(None) => None,
            Err(e) => {
                RefreshMetrics::record_failure(SERVICE, &e.to_string());
                warn!(service = SERVICE, "Serving last known billing data");
                Some(e.to_string())
            }
        };

        let snapshot = self.billing.cache().snapshot().await;
        let mut samples = Vec::new();
        for (region, components) in snapshot.iter() {
            for (component, billed) in components {
                samples.push(
                    CostSample::new(S3_UNIT_COST_USD, billed.unit_cost)
                        .with_label("region", region.clone())
                        .with_label("component", component.clone())
                        .with_label("unit", billed.unit.clone()),
                );
            }
        }
        samples.sort_by(|a, b| a.labels.cmp(&b.labels));

        Collection {
            samples,
            refresh_error,
        }
    }

    async fn refresh(&self, cancel: &mut watch::Receiver<bool>) -> PricingResult<()> {
        let timer = RefreshTimer::start(SERVICE);
        match self.billing.refresh(cancel).await {
            Ok(_) => {
                timer.succeed();
                Ok(())
            }
            Err(e) => {
                timer.fail(&e.to_string());
                Err(e)
            }
        }
    }

    async fn status(&self) -> CacheStatus {
        self.billing.cache().status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use domain_pricing::billing::{
        CostAndUsagePage, CostGroup, MetricValue, ResultByTime, METRIC_UNBLENDED_COST,
        METRIC_USAGE_QUANTITY,
    };
    use domain_pricing::{never_cancelled, PricingError};
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        Billing {}

        #[async_trait]
        impl BillingClient for Billing {
            async fn get_cost_and_usage(
                &self,
                start: NaiveDate,
                end: NaiveDate,
                next_page_token: Option<String>,
            ) -> PricingResult<CostAndUsagePage>;
        }
    }

    fn page(key: &str, usage: &str, cost: &str) -> CostAndUsagePage {
        let metric = |amount: &str, unit: &str| MetricValue {
            amount: amount.to_string(),
            unit: unit.to_string(),
        };
        CostAndUsagePage {
            results_by_time: vec![ResultByTime {
                groups: vec![CostGroup {
                    keys: vec![key.to_string()],
                    metrics: HashMap::from([
                        (METRIC_USAGE_QUANTITY.to_string(), metric(usage, "Requests")),
                        (METRIC_UNBLENDED_COST.to_string(), metric(cost, "USD")),
                    ]),
                }],
            }],
            next_page_token: None,
        }
    }

    #[tokio::test]
    async fn test_unit_cost_per_region_and_component() {
        let mut client = MockBilling::new();
        client
            .expect_get_cost_and_usage()
            .times(1)
            .returning(|_, _, _| Ok(page("USE2-Requests-Tier1", "1000", "1.0")));

        let collector = S3Collector::new(Arc::new(client), Duration::from_secs(3600), 30);
        let collection = collector.collect(&Resources::default(), &mut never_cancelled()).await;

        assert_eq!(collection.refresh_error, None);
        assert_eq!(collection.samples.len(), 1);
        let sample = &collection.samples[0];
        assert_eq!(sample.value, 1.0);
        assert_eq!(sample.label("region"), Some("us-east-2"));
        assert_eq!(sample.label("component"), Some("Requests-Tier1"));
    }

    #[tokio::test]
    async fn test_refresh_failure_is_reported() {
        let mut client = MockBilling::new();
        client
            .expect_get_cost_and_usage()
            .returning(|_, _, _| Err(PricingError::Billing("AccessDeniedException".to_string())));

        let collector = S3Collector::new(Arc::new(client), Duration::from_secs(3600), 30);
        let collection = collector.collect(&Resources::default(), &mut never_cancelled()).await;

        assert!(collection.samples.is_empty());
        assert_eq!(
            collection.refresh_error.as_deref(),
            Some("Billing API error: AccessDeniedException")
        );
        assert!(collector.refresh(&mut never_cancelled()).await.is_err());
    }
}
