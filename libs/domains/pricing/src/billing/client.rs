use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::PricingResult;

use super::data::CostAndUsagePage;

/// Cost-and-usage reporting API.
///
/// Returns one page per call; `next_page_token` from the previous page
/// continues the query. `start` is inclusive, `end` exclusive.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillingClient: Send + Sync {
    async fn get_cost_and_usage(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        next_page_token: Option<String>,
    ) -> PricingResult<CostAndUsagePage>;
}
