use async_trait::async_trait;
use domain_pricing::services::{
    FallbackRates, VpcSchema, PUBLIC_IPV4_IDLE, PUBLIC_IPV4_IN_USE, TRANSIT_GATEWAY_HOURS,
    VPC_ENDPOINT_HOURS, VPC_ENDPOINT_SERVICE_HOURS,
};
use domain_pricing::{CacheStatus, PricingClient, PricingResult, RefreshOrchestrator};
use observability::cost::{
    VPC_ELASTIC_IP_USD_PER_HOUR, VPC_ENDPOINT_USD_PER_HOUR, VPC_TRANSIT_GATEWAY_USD_PER_HOUR,
};
use observability::CostSample;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::{price_or_fallback, refresh_if_due, refresh_now, Collection, Collector, Discount};
use crate::inventory::{EndpointKind, Resources};

/// VPC endpoints, transit gateway attachments and public IPv4 addresses
pub struct VpcCollector {
    prices: RefreshOrchestrator<VpcSchema>,
    discount: Discount,
    fallback: FallbackRates,
}

impl VpcCollector {
    pub fn new(
        regions: Vec<String>,
        clients: HashMap<String, Arc<dyn PricingClient>>,
        interval: Duration,
        max_concurrency: usize,
        discount: Discount,
        fallback: FallbackRates,
    ) -> Self {
        Self {
            prices: RefreshOrchestrator::new(VpcSchema, regions, clients, interval)
                .with_max_concurrency(max_concurrency),
            discount,
            fallback,
        }
    }

    async fn hourly(&self, region: &str, resource: &str, component: &str, fallback: f64) -> Option<f64> {
        let lookup = self.prices.cache().get(region, component).await;
        price_or_fallback(self.name(), resource, lookup, fallback).map(|price| self.discount.apply(price))
    }
}

#[async_trait]
impl Collector for VpcCollector {
    fn name(&self) -> &'static str {
        self.prices.service()
    }

    async fn collect(&self, resources: &Resources, cancel: &mut watch::Receiver<bool>) -> Collection {
        let refresh_error = refresh_if_due(&self.prices, cancel).await;
        let mut samples = Vec::new();

        for endpoint in &resources.vpc_endpoints {
            let (component, fallback) = match endpoint.kind {
                EndpointKind::Standard => (VPC_ENDPOINT_HOURS, self.fallback.vpc_endpoint),
                EndpointKind::Service => (VPC_ENDPOINT_SERVICE_HOURS, self.fallback.vpc_endpoint_service),
            };
            if let Some(price) = self.hourly(&endpoint.region, &endpoint.id, component, fallback).await {
                samples.push(
                    CostSample::new(VPC_ENDPOINT_USD_PER_HOUR, price)
                        .with_label("region", endpoint.region.clone())
                        .with_label("vpc_endpoint_id", endpoint.id.clone())
                        .with_label(
                            "kind",
                            match endpoint.kind {
                                EndpointKind::Standard => "standard",
                                EndpointKind::Service => "service",
                            },
                        ),
                );
            }
        }

        for attachment in &resources.transit_gateway_attachments {
            if let Some(price) = self
                .hourly(
                    &attachment.region,
                    &attachment.id,
                    TRANSIT_GATEWAY_HOURS,
                    self.fallback.transit_gateway,
                )
                .await
            {
                samples.push(
                    CostSample::new(VPC_TRANSIT_GATEWAY_USD_PER_HOUR, price)
                        .with_label("region", attachment.region.clone())
                        .with_label("attachment_id", attachment.id.clone()),
                );
            }
        }

        for address in &resources.elastic_ips {
            let (component, fallback, state) = if address.in_use {
                (PUBLIC_IPV4_IN_USE, self.fallback.elastic_ip_in_use, "in_use")
            } else {
                (PUBLIC_IPV4_IDLE, self.fallback.elastic_ip_idle, "idle")
            };
            if let Some(price) = self.hourly(&address.region, &address.address, component, fallback).await {
                samples.push(
                    CostSample::new(VPC_ELASTIC_IP_USD_PER_HOUR, price)
                        .with_label("region", address.region.clone())
                        .with_label("address", address.address.clone())
                        .with_label("state", state),
                );
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testing::{clients, price_document, FixedClient};
    use crate::inventory::{ElasticIp, TransitGatewayAttachment, VpcEndpoint};
    use domain_pricing::never_cancelled;
    use serde_json::json;

    fn usage(usage_type: &str, price: &str) -> String {
        price_document(
            "VpcEndpoint",
            json!({ "regionCode": "us-west-2", "usagetype": usage_type }),
            price,
        )
    }

    fn collector(client: Arc<FixedClient>) -> VpcCollector {
        VpcCollector::new(
            vec!["us-west-2".to_string()],
            clients("us-west-2", client),
            Duration::from_secs(3600),
            5,
            Discount::default(),
            FallbackRates::default(),
        )
    }

    #[tokio::test]
    async fn test_components_are_priced_by_kind() {
        let client = FixedClient::serving(
            "us-west-2",
            vec![
                usage("USW2-VpcEndpoint-Hours", "0.011"),
                usage("USW2-TransitGateway-Hours", "0.05"),
                usage("USW2-PublicIPv4:InUseAddress", "0.005"),
            ],
        );
        let collector = collector(client);
        let resources = Resources {
            vpc_endpoints: vec![
                VpcEndpoint {
                    id: "vpce-1".to_string(),
                    region: "us-west-2".to_string(),
                    kind: EndpointKind::Standard,
                },
                VpcEndpoint {
                    id: "vpce-2".to_string(),
                    region: "us-west-2".to_string(),
                    kind: EndpointKind::Service,
                },
            ],
            transit_gateway_attachments: vec![TransitGatewayAttachment {
                id: "tgw-attach-1".to_string(),
                region: "us-west-2".to_string(),
            }],
            elastic_ips: vec![ElasticIp {
                address: "198.51.100.7".to_string(),
                region: "us-west-2".to_string(),
                in_use: true,
            }],
            ..Resources::default()
        };

        let collection = collector.collect(&resources, &mut never_cancelled()).await;

        // The endpoint service component is not priced in us-west-2: skipped
        let names: Vec<_> = collection.samples.iter().map(|sample| sample.name).collect();
        assert_eq!(
            names,
            vec![
                VPC_ENDPOINT_USD_PER_HOUR,
                VPC_TRANSIT_GATEWAY_USD_PER_HOUR,
                VPC_ELASTIC_IP_USD_PER_HOUR
            ]
        );
        assert_eq!(collection.samples[0].value, 0.011);
        assert_eq!(collection.samples[2].label("state"), Some("in_use"));
    }

    #[tokio::test]
    async fn test_unpriced_region_uses_defaults() {
        let client = FixedClient::serving("us-west-2", vec![usage("USW2-VpcEndpoint-Hours", "0.011")]);
        let collector = collector(client);
        let resources = Resources {
            vpc_endpoints: vec![VpcEndpoint {
                id: "vpce-9".to_string(),
                region: "af-south-1".to_string(),
                kind: EndpointKind::Service,
            }],
            elastic_ips: vec![ElasticIp {
                address: "192.0.2.1".to_string(),
                region: "af-south-1".to_string(),
                in_use: false,
            }],
            ..Resources::default()
        };

        let collection = collector.collect(&resources, &mut never_cancelled()).await;

        let values: Vec<f64> = collection.samples.iter().map(|sample| sample.value).collect();
        assert_eq!(values, vec![0.05, 0.005]);
    }
}
