use async_trait::async_trait;

use crate::error::PricingResult;
use crate::models::PriceFilter;

/// Regional price-list API.
///
/// One client per configured region. Implementations page through the
/// provider API and return every raw price-list document for the service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PricingClient: Send + Sync {
    /// Fetch all price-list documents for `service_code` in `region`
    async fn list_prices(
        &self,
        service_code: &str,
        region: &str,
        filters: &[PriceFilter],
    ) -> PricingResult<Vec<String>>;
}
