use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Region-keyed, two-level price map: `region -> key -> detail`
pub type RegionMap<K, V> = HashMap<String, HashMap<K, V>>;

/// Flat per-region pricing: `usage type -> unit price (USD)`
pub type RegionPricing = HashMap<String, f64>;

/// One parsed price line from a price-list document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRecord {
    pub region: String,
    /// Provider usage code, e.g. `USE1-NatGateway-Hours`
    pub usage_type: String,
    pub unit_price_usd: f64,
}

/// `product.attributes` of a price-list document.
///
/// Only the attributes the pricing schemas look at are decoded; everything
/// else in the document is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAttributes {
    pub region_code: Option<String>,
    #[serde(rename = "usagetype")]
    pub usage_type: Option<String>,
    pub instance_type: Option<String>,
    pub instance_family: Option<String>,
    pub vcpu: Option<String>,
    pub memory: Option<String>,
    pub tenancy: Option<String>,
    #[serde(rename = "marketoption")]
    pub market_option: Option<String>,
    pub physical_processor: Option<String>,
    pub clock_speed: Option<String>,
    pub operating_system: Option<String>,
    pub volume_api_name: Option<String>,
    pub database_engine: Option<String>,
    pub deployment_option: Option<String>,
    pub location_type: Option<String>,
    pub group: Option<String>,
    pub operation: Option<String>,
}

/// Static properties of an instance SKU.
///
/// Captured the first time an instance type is seen in a region and reused
/// on later refreshes; never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstanceAttributes {
    pub region: String,
    pub instance_type: String,
    pub family: Option<String>,
    pub vcpu: Option<String>,
    pub memory: Option<String>,
    pub tenancy: String,
    pub market_option: String,
    pub physical_processor: String,
    pub clock_speed: String,
    pub usage_type: String,
}

impl InstanceAttributes {
    pub fn from_product(region: &str, attributes: &ProductAttributes) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();

        Self {
            region: region.to_string(),
            instance_type: text(&attributes.instance_type),
            family: attributes.instance_family.clone(),
            vcpu: attributes.vcpu.clone(),
            memory: attributes.memory.clone(),
            tenancy: text(&attributes.tenancy),
            market_option: text(&attributes.market_option),
            physical_processor: text(&attributes.physical_processor),
            clock_speed: text(&attributes.clock_speed),
            usage_type: text(&attributes.usage_type),
        }
    }
}

/// A `TERM_MATCH` filter on a product attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceFilter {
    pub field: String,
    pub value: String,
}

impl PriceFilter {
    pub fn term_match(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_attributes_field_names() {
        let attributes: ProductAttributes = serde_json::from_value(serde_json::json!({
            "regionCode": "af-south-1",
            "usagetype": "AFS1-BoxUsage:c5ad.2xlarge",
            "instanceType": "c5ad.2xlarge",
            "instanceFamily": "Compute optimized",
            "vcpu": "8",
            "memory": "16 GiB",
            "marketoption": "OnDemand",
            "physicalProcessor": "AMD EPYC 7R32",
            "unrelated": "ignored"
        }))
        .unwrap();

        assert_eq!(attributes.region_code.as_deref(), Some("af-south-1"));
        assert_eq!(attributes.usage_type.as_deref(), Some("AFS1-BoxUsage:c5ad.2xlarge"));
        assert_eq!(attributes.market_option.as_deref(), Some("OnDemand"));
        assert_eq!(attributes.tenancy, None);
    }

    #[test]
    fn test_instance_attributes_snapshot() {
        let product = ProductAttributes {
            instance_type: Some("m5.large".into()),
            instance_family: Some("General purpose".into()),
            vcpu: Some("2".into()),
            memory: Some("8 GiB".into()),
            tenancy: Some("Shared".into()),
            ..Default::default()
        };

        let attributes = InstanceAttributes::from_product("us-east-1", &product);
        assert_eq!(attributes.region, "us-east-1");
        assert_eq!(attributes.instance_type, "m5.large");
        assert_eq!(attributes.tenancy, "Shared");
        assert_eq!(attributes.clock_speed, "");
    }
}
