use std::fmt::Display;
use std::hash::Hash;

use crate::models::{PriceFilter, RegionMap};
use crate::parser::ParsedPriceList;

/// How one priced service turns a parsed price list into its cache snapshot.
///
/// The cache and the refresh orchestrator are generic over this trait; each
/// service only decides which products it asks for and how they are keyed.
pub trait PricingSchema: Send + Sync + 'static {
    /// Secondary key within a region (instance type, volume type, ...)
    type Key: Eq + Hash + Clone + Display + Send + Sync + 'static;
    /// Price detail stored per key
    type Detail: Clone + Send + Sync + 'static;

    /// Short service name used in logs and metric labels (`ec2`, `ebs`, ...)
    fn service(&self) -> &'static str;

    /// Provider service code passed to the price-list API (`AmazonEC2`, ...)
    fn service_code(&self) -> &'static str;

    /// Attribute filters applied to every regional price-list request
    fn filters(&self) -> Vec<PriceFilter>;

    /// Build a full snapshot from one refresh worth of prices.
    ///
    /// `previous` is the snapshot currently served; schemas may carry static
    /// data forward from it but must not mutate it.
    fn build(
        &self,
        prices: &ParsedPriceList,
        previous: &RegionMap<Self::Key, Self::Detail>,
    ) -> RegionMap<Self::Key, Self::Detail>;
}
