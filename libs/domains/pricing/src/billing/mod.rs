//! Billing data: usage-key decoding, cost aggregation and the billing refresher.

mod client;
mod codes;
mod data;
mod decoder;
mod refresher;

#[cfg(test)]
pub use client::MockBillingClient;
pub use client::BillingClient;
pub use codes::{is_region_code, region_for_code, split_region_prefix, usage_component, BILLING_REGION_CODES};
pub use data::{
    BillingComponent, BillingData, CostAndUsagePage, CostGroup, MetricValue, ResultByTime,
    UnitCostKind, HOURS_IN_MONTH, METRIC_UNBLENDED_COST, METRIC_USAGE_QUANTITY,
};
pub use decoder::decode_usage_key;
pub use refresher::{BillingRefresher, BillingSummary, DEFAULT_LOOKBACK_DAYS};
