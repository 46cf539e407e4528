use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};

use crate::billing::usage_component;
use crate::models::{PriceFilter, RegionMap};
use crate::parser::ParsedPriceList;
use crate::schema::PricingSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum LoadBalancerKind {
    Application,
    Network,
    Classic,
}

impl LoadBalancerKind {
    /// Map the price-list `productFamily` to a load balancer kind
    pub fn from_product_family(family: &str) -> Option<Self> {
        match family {
            "Load Balancer-Application" => Some(LoadBalancerKind::Application),
            "Load Balancer-Network" => Some(LoadBalancerKind::Network),
            "Load Balancer" => Some(LoadBalancerKind::Classic),
            _ => None,
        }
    }
}

/// Hourly rate of a load balancer kind, plus its LCU rate where one exists
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadBalancerPrice {
    pub usd_per_hour: f64,
    pub lcu_usd_per_hour: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadBalancerSchema;

impl PricingSchema for LoadBalancerSchema {
    type Key = LoadBalancerKind;
    type Detail = LoadBalancerPrice;

    fn service(&self) -> &'static str {
        "elb"
    }

    fn service_code(&self) -> &'static str {
        "AWSELB"
    }

    fn filters(&self) -> Vec<PriceFilter> {
        Vec::new()
    }

    fn build(
        &self,
        prices: &ParsedPriceList,
        _previous: &RegionMap<LoadBalancerKind, LoadBalancerPrice>,
    ) -> RegionMap<LoadBalancerKind, LoadBalancerPrice> {
        let mut hourly: HashMap<(String, LoadBalancerKind), f64> = HashMap::new();
        let mut lcu: HashMap<(String, LoadBalancerKind), f64> = HashMap::new();

        for product in &prices.products {
            let Some(kind) = product
                .product_family
                .as_deref()
                .and_then(LoadBalancerKind::from_product_family)
            else {
                continue;
            };
            let (Some(usage_type), Some(price)) = (product.attributes.usage_type.as_deref(), product.price())
            else {
                continue;
            };
            let region = product.region();
            if region.is_empty() {
                continue;
            }

            let key = (region.to_string(), kind);
            match usage_component(usage_type) {
                "LoadBalancerUsage" => {
                    hourly.insert(key, price);
                }
                "LCUUsage" => {
                    lcu.insert(key, price);
                }
                _ => {}
            }
        }

        // A kind is only priced once its hourly rate is known
        let mut regions: RegionMap<LoadBalancerKind, LoadBalancerPrice> = RegionMap::new();
        for ((region, kind), usd_per_hour) in hourly {
            let lcu_usd_per_hour = lcu.get(&(region.clone(), kind)).copied();
            regions.entry(region).or_default().insert(
                kind,
                LoadBalancerPrice {
                    usd_per_hour,
                    lcu_usd_per_hour,
                },
            );
        }

        regions
    }
}
