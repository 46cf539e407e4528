use serde::Serialize;
use tracing::debug;

use crate::billing::HOURS_IN_MONTH;
use crate::models::{PriceFilter, RegionMap};
use crate::parser::ParsedPriceList;
use crate::schema::PricingSchema;

/// Block-storage price for one volume type
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StoragePrice {
    pub usd_per_gib_month: f64,
    pub usd_per_gib_hour: f64,
}

impl StoragePrice {
    pub fn from_monthly(usd_per_gib_month: f64) -> Self {
        Self {
            usd_per_gib_month,
            usd_per_gib_hour: usd_per_gib_month / HOURS_IN_MONTH,
        }
    }
}

/// EBS volume prices keyed by volume API name (`gp3`, `io2`, ...)
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageSchema;

impl PricingSchema for StorageSchema {
    type Key = String;
    type Detail = StoragePrice;

    fn service(&self) -> &'static str {
        "ebs"
    }

    fn service_code(&self) -> &'static str {
        "AmazonEC2"
    }

    fn filters(&self) -> Vec<PriceFilter> {
        vec![PriceFilter::term_match("productFamily", "Storage")]
    }

    fn build(
        &self,
        prices: &ParsedPriceList,
        _previous: &RegionMap<String, StoragePrice>,
    ) -> RegionMap<String, StoragePrice> {
        let mut regions: RegionMap<String, StoragePrice> = RegionMap::new();

        for product in &prices.products {
            let region = product.region();
            let (Some(volume_type), Some(price)) =
                (product.attributes.volume_api_name.as_deref(), product.price())
            else {
                continue;
            };
            if region.is_empty() {
                debug!(volume_type, "Ignoring storage product without region");
                continue;
            }

            regions
                .entry(region.to_string())
                .or_default()
                .insert(volume_type.to_string(), StoragePrice::from_monthly(price));
        }

        regions
    }
}
