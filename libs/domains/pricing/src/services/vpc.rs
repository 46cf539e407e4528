use crate::models::{PriceFilter, RegionMap};
use crate::parser::ParsedPriceList;
use crate::schema::PricingSchema;

use super::usage_component_prices;

pub const VPC_ENDPOINT_HOURS: &str = "VpcEndpoint-Hours";
pub const VPC_ENDPOINT_SERVICE_HOURS: &str = "VpcEndpointService-Hours";
pub const TRANSIT_GATEWAY_HOURS: &str = "TransitGateway-Hours";
pub const PUBLIC_IPV4_IN_USE: &str = "PublicIPv4:InUseAddress";
pub const PUBLIC_IPV4_IDLE: &str = "PublicIPv4:IdleAddress";

/// VPC endpoints, transit gateways and public IPv4 addresses, keyed by usage component
#[derive(Debug, Clone, Copy, Default)]
pub struct VpcSchema;

impl PricingSchema for VpcSchema {
    type Key = String;
    type Detail = f64;

    fn service(&self) -> &'static str {
        "vpc"
    }

    fn service_code(&self) -> &'static str {
        "AmazonVPC"
    }

    fn filters(&self) -> Vec<PriceFilter> {
        Vec::new()
    }

    fn build(&self, prices: &ParsedPriceList, _previous: &RegionMap<String, f64>) -> RegionMap<String, f64> {
        usage_component_prices(prices, |_| true)
    }
}
