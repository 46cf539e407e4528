use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::models::{PriceFilter, RegionMap};
use crate::parser::ParsedPriceList;
use crate::schema::PricingSchema;

/// Only in-region instances are priced; Outposts and Local Zones are not
const REGION_LOCATION_TYPE: &str = "AWS Region";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RdsKey {
    pub instance_class: String,
    pub engine: String,
    pub deployment: String,
}

impl RdsKey {
    pub fn new(
        instance_class: impl Into<String>,
        engine: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            instance_class: instance_class.into(),
            engine: engine.into(),
            deployment: deployment.into(),
        }
    }
}

impl fmt::Display for RdsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.instance_class, self.engine, self.deployment)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RdsPrice {
    pub usd_per_hour: f64,
    pub usage_type: String,
}

/// Managed database instance prices keyed by (class, engine, deployment)
#[derive(Debug, Clone, Copy, Default)]
pub struct RdsSchema;

impl PricingSchema for RdsSchema {
    type Key = RdsKey;
    type Detail = RdsPrice;

    fn service(&self) -> &'static str {
        "rds"
    }

    fn service_code(&self) -> &'static str {
        "AmazonRDS"
    }

    fn filters(&self) -> Vec<PriceFilter> {
        vec![
            PriceFilter::term_match("productFamily", "Database Instance"),
            PriceFilter::term_match("locationType", REGION_LOCATION_TYPE),
        ]
    }

    fn build(&self, prices: &ParsedPriceList, _previous: &RegionMap<RdsKey, RdsPrice>) -> RegionMap<RdsKey, RdsPrice> {
        let mut regions: RegionMap<RdsKey, RdsPrice> = RegionMap::new();

        for product in &prices.products {
            let attributes = &product.attributes;
            if attributes.location_type.as_deref() != Some(REGION_LOCATION_TYPE) {
                debug!(location_type = ?attributes.location_type, "Ignoring non-region database product");
                continue;
            }

            let region = product.region();
            let (Some(class), Some(engine), Some(deployment), Some(price)) = (
                attributes.instance_type.as_deref(),
                attributes.database_engine.as_deref(),
                attributes.deployment_option.as_deref(),
                product.price(),
            ) else {
                continue;
            };
            if region.is_empty() {
                continue;
            }

            regions.entry(region.to_string()).or_default().insert(
                RdsKey::new(class, engine, deployment),
                RdsPrice {
                    usd_per_hour: price,
                    usage_type: attributes.usage_type.clone().unwrap_or_default(),
                },
            );
        }

        regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::fixtures::document;
    use crate::parser::parse_price_list;
    use serde_json::json;

    fn database(location_type: &str, deployment: &str, price: &str) -> String {
        document(
            json!({
                "regionCode": "us-west-2",
                "locationType": location_type,
                "instanceType": "db.m5.large",
                "databaseEngine": "PostgreSQL",
                "deploymentOption": deployment,
                "usagetype": "USW2-InstanceUsage:db.m5.large",
            }),
            "Database Instance",
            &[price],
        )
    }

    #[test]
    fn test_rds_keyed_by_class_engine_deployment() {
        let prices = parse_price_list([
            database("AWS Region", "Single-AZ", "0.178"),
            database("AWS Region", "Multi-AZ", "0.356"),
        ]);

        let snapshot = RdsSchema.build(&prices, &RegionMap::new());
        let region = &snapshot["us-west-2"];

        assert_eq!(region[&RdsKey::new("db.m5.large", "PostgreSQL", "Single-AZ")].usd_per_hour, 0.178);
        assert_eq!(region[&RdsKey::new("db.m5.large", "PostgreSQL", "Multi-AZ")].usd_per_hour, 0.356);
    }

    #[test]
    fn test_outposts_are_excluded() {
        let prices = parse_price_list([database("AWS Outposts", "Single-AZ", "0.5")]);
        assert!(RdsSchema.build(&prices, &RegionMap::new()).is_empty());
    }

    #[test]
    fn test_key_display() {
        let key = RdsKey::new("db.r6g.xlarge", "MySQL", "Multi-AZ");
        assert_eq!(key.to_string(), "db.r6g.xlarge/MySQL/Multi-AZ");
    }
}
