//! Per-service pricing schemas.
//!
//! Each schema plugs into the generic [`crate::cache::PricingCache`] and
//! [`crate::refresh::RefreshOrchestrator`]; they differ only in which
//! products they request and how a product is keyed.

mod compute;
mod elb;
mod fallback;
mod natgateway;
mod rds;
mod storage;
mod vpc;

pub use compute::{ComputePrice, ComputeSchema};
pub use elb::{LoadBalancerKind, LoadBalancerPrice, LoadBalancerSchema};
pub use fallback::FallbackRates;
pub use natgateway::{NatGatewaySchema, NAT_GATEWAY_BYTES, NAT_GATEWAY_HOURS};
pub use rds::{RdsKey, RdsPrice, RdsSchema};
pub use storage::{StoragePrice, StorageSchema};
pub use vpc::{
    VpcSchema, PUBLIC_IPV4_IDLE, PUBLIC_IPV4_IN_USE, TRANSIT_GATEWAY_HOURS, VPC_ENDPOINT_HOURS,
    VPC_ENDPOINT_SERVICE_HOURS,
};

use tracing::debug;

use crate::billing::usage_component;
use crate::models::RegionMap;
use crate::parser::{ParsedPriceList, PricedProduct};

/// Snapshot keyed by usage component (`NatGateway-Hours`, ...) for products
/// accepted by `accept`.
///
/// Products without a region (global SKUs) are ignored.
pub(crate) fn usage_component_prices<F>(prices: &ParsedPriceList, accept: F) -> RegionMap<String, f64>
where
    F: Fn(&PricedProduct) -> bool,
{
    let mut regions: RegionMap<String, f64> = RegionMap::new();

    for product in prices.products.iter().filter(|product| accept(product)) {
        let region = product.region();
        let (Some(usage_type), Some(price)) = (product.attributes.usage_type.as_deref(), product.price())
        else {
            continue;
        };
        if region.is_empty() {
            debug!(usage_type, "Ignoring product without region");
            continue;
        }

        regions
            .entry(region.to_string())
            .or_default()
            .insert(usage_component(usage_type).to_string(), price);
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::fixtures::usage_document;
    use crate::parser::parse_price_list;

    #[test]
    fn test_usage_components_strip_region_prefix() {
        let prices = parse_price_list([
            usage_document("us-east-1", "NatGateway-Hours", "0.045"),
            usage_document("eu-west-1", "EU-NatGateway-Hours", "0.048"),
            usage_document("ap-south-1", "APS3-NatGateway-Bytes", "0.056"),
            usage_document("", "NatGateway-Hours", "9.99"),
        ]);

        let regions = usage_component_prices(&prices, |_| true);

        assert_eq!(regions.len(), 3);
        assert_eq!(regions["us-east-1"]["NatGateway-Hours"], 0.045);
        assert_eq!(regions["eu-west-1"]["NatGateway-Hours"], 0.048);
        assert_eq!(regions["ap-south-1"]["NatGateway-Bytes"], 0.056);
    }
}
