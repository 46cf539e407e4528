//! Pricing Domain
//!
//! Regional pricing caches built from provider price-list documents, with a
//! weighted CPU/RAM split for compute and a billing-report decoder for
//! usage-billed services.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ RefreshOrchestrator  │  ← bounded multi-region fan-out, all-or-nothing
//! └──────────┬───────────┘
//!            │
//! ┌──────────▼───────────┐
//! │ Parser + Schema      │  ← price documents → per-service snapshot
//! └──────────┬───────────┘
//!            │
//! ┌──────────▼───────────┐
//! │ PricingCache         │  ← region → key → detail, swapped wholesale
//! └──────────────────────┘
//! ```
//!
//! Billing-based services use [`billing::BillingRefresher`] instead of the
//! orchestrator but land in the same cache type.

pub mod allocator;
pub mod billing;
pub mod cache;
pub mod client;
pub mod error;
pub mod models;
pub mod parser;
pub mod refresh;
pub mod schema;
pub mod services;

// Re-export commonly used types
pub use allocator::{allocate, Allocation, InstanceFamily};
pub use cache::{CacheStatus, PricingCache};
pub use client::PricingClient;
pub use error::{PricingError, PricingResult};
pub use models::{
    InstanceAttributes, PriceFilter, PriceRecord, ProductAttributes, RegionMap, RegionPricing,
};
pub use parser::{parse_document, parse_price_list, ParsedPriceList, PricedProduct};
pub use refresh::{
    cancelled, never_cancelled, RefreshOrchestrator, RefreshSummary, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_RETRY_BACKOFF,
};
pub use schema::PricingSchema;
