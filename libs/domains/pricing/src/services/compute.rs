use serde::Serialize;
use tracing::{debug, warn};

use crate::allocator::allocate;
use crate::models::{InstanceAttributes, PriceFilter, RegionMap};
use crate::parser::ParsedPriceList;
use crate::schema::PricingSchema;

/// Hourly price of one instance type, split into CPU and RAM
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputePrice {
    pub cpu_usd_per_core_hour: f64,
    pub ram_usd_per_gib_hour: f64,
    pub total_usd_per_hour: f64,
    pub attributes: InstanceAttributes,
}

impl ComputePrice {
    pub fn cpu_usd_per_hour(&self, vcpus: f64) -> f64 {
        self.cpu_usd_per_core_hour * vcpus
    }

    pub fn ram_usd_per_hour(&self, memory_gib: f64) -> f64 {
        self.ram_usd_per_gib_hour * memory_gib
    }
}

/// Linux on-demand shared-tenancy instance prices keyed by instance type
#[derive(Debug, Clone, Copy, Default)]
pub struct ComputeSchema;

impl PricingSchema for ComputeSchema {
    type Key = String;
    type Detail = ComputePrice;

    fn service(&self) -> &'static str {
        "ec2"
    }

    fn service_code(&self) -> &'static str {
        "AmazonEC2"
    }

    fn filters(&self) -> Vec<PriceFilter> {
        vec![
            PriceFilter::term_match("productFamily", "Compute Instance"),
            PriceFilter::term_match("operatingSystem", "Linux"),
            PriceFilter::term_match("tenancy", "Shared"),
            PriceFilter::term_match("preInstalledSw", "NA"),
            PriceFilter::term_match("capacitystatus", "Used"),
        ]
    }

    fn build(
        &self,
        prices: &ParsedPriceList,
        previous: &RegionMap<String, ComputePrice>,
    ) -> RegionMap<String, ComputePrice> {
        let mut regions: RegionMap<String, ComputePrice> = RegionMap::new();

        for product in &prices.products {
            let region = product.region();
            let (Some(instance_type), Some(price)) =
                (product.attributes.instance_type.as_deref(), product.price())
            else {
                continue;
            };
            if region.is_empty() {
                debug!(instance_type, "Ignoring instance product without region");
                continue;
            }

            // Static attributes are captured once per (region, type) and reused
            let attributes = previous
                .get(region)
                .and_then(|types| types.get(instance_type))
                .map(|known| known.attributes.clone())
                .unwrap_or_else(|| InstanceAttributes::from_product(region, &product.attributes));

            let allocation = match allocate(price, &attributes) {
                Ok(allocation) => allocation,
                Err(e) => {
                    warn!(region, instance_type, error = %e, "Skipping instance type");
                    continue;
                }
            };

            regions.entry(region.to_string()).or_default().insert(
                instance_type.to_string(),
                ComputePrice {
                    cpu_usd_per_core_hour: allocation.cpu_usd_per_core_hour,
                    ram_usd_per_gib_hour: allocation.ram_usd_per_gib_hour,
                    total_usd_per_hour: price,
                    attributes,
                },
            );
        }

        regions
    }
}
