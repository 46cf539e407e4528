use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::models::RegionMap;

/// Average hours in a month used to turn monthly storage cost into an hourly rate
pub const HOURS_IN_MONTH: f64 = 24.35 * 30.0;

pub const METRIC_UNBLENDED_COST: &str = "UnblendedCost";
pub const METRIC_USAGE_QUANTITY: &str = "UsageQuantity";

/// One page of a cost-and-usage query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CostAndUsagePage {
    #[serde(default)]
    pub results_by_time: Vec<ResultByTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultByTime {
    #[serde(default)]
    pub groups: Vec<CostGroup>,
}

/// A usage-type group: `Keys[0]` is the usage key, `Metrics` the amounts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CostGroup {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub metrics: HashMap<String, MetricValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricValue {
    pub amount: String,
    #[serde(default)]
    pub unit: String,
}

impl CostGroup {
    pub fn usage_key(&self) -> Option<&str> {
        self.keys.first().map(String::as_str)
    }

    fn amount(&self, metric: &str) -> f64 {
        let Some(value) = self.metrics.get(metric) else {
            return 0.0;
        };
        match value.amount.trim().parse::<f64>() {
            Ok(amount) if amount.is_finite() => amount,
            _ => {
                warn!(metric, amount = %value.amount, "Unparseable billing amount, using 0");
                0.0
            }
        }
    }

    pub fn cost_usd(&self) -> f64 {
        self.amount(METRIC_UNBLENDED_COST)
    }

    pub fn usage_amount(&self) -> f64 {
        self.amount(METRIC_USAGE_QUANTITY)
    }

    pub fn usage_unit(&self) -> &str {
        self.metrics
            .get(METRIC_USAGE_QUANTITY)
            .map(|value| value.unit.as_str())
            .unwrap_or_default()
    }
}

/// Accumulated usage and cost for one (region, component)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BillingComponent {
    pub usage_amount: f64,
    pub cost_usd: f64,
    pub unit: String,
    pub unit_cost: f64,
}

/// How the unit cost of a component is derived from its totals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitCostKind {
    /// Price per 1,000 requests
    PerThousandRequests,
    /// Price per unit per hour of a monthly storage charge
    StorageHourly,
    PerUnit,
}

impl UnitCostKind {
    pub fn for_component(component: &str) -> Self {
        if component.starts_with("Requests-Tier") {
            UnitCostKind::PerThousandRequests
        } else if component.contains("TimedStorage") {
            UnitCostKind::StorageHourly
        } else {
            UnitCostKind::PerUnit
        }
    }

    /// Unit cost from accumulated totals; zero usage yields 0
    pub fn unit_cost(self, usage: f64, cost: f64) -> f64 {
        if usage == 0.0 {
            return 0.0;
        }
        match self {
            UnitCostKind::PerThousandRequests => cost / (usage / 1000.0),
            UnitCostKind::StorageHourly => (cost / HOURS_IN_MONTH) / usage,
            UnitCostKind::PerUnit => cost / usage,
        }
    }
}

/// Region-keyed billing aggregate, built across all pages of one refresh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillingData {
    regions: RegionMap<String, BillingComponent>,
}

impl BillingData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one cost-report group. No-op when region or component is empty.
    pub fn add_metric_group(&mut self, region: &str, component: &str, group: &CostGroup) {
        self.add_usage(
            region,
            component,
            group.usage_amount(),
            group.cost_usd(),
            group.usage_unit(),
        );
    }

    pub fn add_usage(&mut self, region: &str, component: &str, usage: f64, cost: f64, unit: &str) {
        if region.is_empty() || component.is_empty() {
            debug!(region, component, "Dropping unattributable billing line");
            return;
        }

        // Credits and refunds show up as negative amounts; totals only grow.
        let usage = if usage < 0.0 {
            warn!(region, component, usage, "Ignoring negative usage amount");
            0.0
        } else {
            usage
        };
        let cost = if cost < 0.0 {
            warn!(region, component, cost, "Ignoring negative cost amount");
            0.0
        } else {
            cost
        };

        let entry = self
            .regions
            .entry(region.to_string())
            .or_default()
            .entry(component.to_string())
            .or_default();

        entry.usage_amount += usage;
        entry.cost_usd += cost;
        if entry.unit.is_empty() {
            entry.unit = unit.to_string();
        }

        if entry.usage_amount == 0.0 {
            warn!(region, component, "Zero usage, unit cost set to 0");
        }
        entry.unit_cost =
            UnitCostKind::for_component(component).unit_cost(entry.usage_amount, entry.cost_usd);
    }

    pub fn get(&self, region: &str, component: &str) -> Option<&BillingComponent> {
        self.regions.get(region)?.get(component)
    }

    pub fn regions(&self) -> &RegionMap<String, BillingComponent> {
        &self.regions
    }

    pub fn into_regions(self) -> RegionMap<String, BillingComponent> {
        self.regions
    }
}
