use crate::models::{PriceFilter, RegionMap};
use crate::parser::ParsedPriceList;
use crate::schema::PricingSchema;

use super::usage_component_prices;

pub const NAT_GATEWAY_HOURS: &str = "NatGateway-Hours";
pub const NAT_GATEWAY_BYTES: &str = "NatGateway-Bytes";

/// NAT gateway hourly and per-GB processing rates, keyed by usage component
#[derive(Debug, Clone, Copy, Default)]
pub struct NatGatewaySchema;

impl PricingSchema for NatGatewaySchema {
    type Key = String;
    type Detail = f64;

    fn service(&self) -> &'static str {
        "natgw"
    }

    fn service_code(&self) -> &'static str {
        "AmazonEC2"
    }

    fn filters(&self) -> Vec<PriceFilter> {
        vec![PriceFilter::term_match("productFamily", "NAT Gateway")]
    }

    fn build(&self, prices: &ParsedPriceList, _previous: &RegionMap<String, f64>) -> RegionMap<String, f64> {
        usage_component_prices(prices, |product| {
            product
                .attributes
                .usage_type
                .as_deref()
                .is_some_and(|usage_type| usage_type.contains("NatGateway-"))
        })
    }
}
