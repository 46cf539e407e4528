//! Observability utilities for the cloud cost exporter.
//!
//! This crate provides:
//! - Prometheus recorder installation and `/metrics` rendering
//! - Cost gauges built from collector samples
//! - Refresh and collector operational metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, CostMetrics, CostSample};
//!
//! init_metrics();
//!
//! CostMetrics::publish(&[CostSample::new("cloudcost_aws_natgw_usd_per_hour", 0.045)
//!     .with_label("region", "us-east-1")]);
//!
//! let app = Router::new().route("/metrics", get(metrics_handler));
//! ```

pub mod cost;
pub mod refresh;

pub use cost::{CostMetrics, CostSample};
pub use refresh::{RefreshMetrics, RefreshTimer};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// This should be called once at application startup.
/// Returns the PrometheusHandle for rendering metrics.
pub fn init_metrics() -> &'static PrometheusHandle {
    METRICS_HANDLE.get_or_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("Failed to install Prometheus recorder");

        info!("Prometheus metrics recorder initialized");

        register_metric_descriptions();

        handle
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Render the current metrics in the Prometheus text format
pub fn render() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

/// Axum handler for a plain /metrics endpoint
pub async fn metrics_handler() -> String {
    render()
}

/// Register metric descriptions for documentation
fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // Cost gauges
    describe_gauge!(
        cost::EC2_CPU_USD_PER_CORE_HOUR,
        "Hourly cost of one vCPU of an EC2 instance, from the weighted CPU/RAM split"
    );
    describe_gauge!(
        cost::EC2_MEMORY_USD_PER_GIB_HOUR,
        "Hourly cost of one GiB of RAM of an EC2 instance, from the weighted CPU/RAM split"
    );
    describe_gauge!(
        cost::EC2_TOTAL_USD_PER_HOUR,
        "Hourly on-demand price of an EC2 instance"
    );
    describe_gauge!(
        cost::EBS_USD_PER_GIB_HOUR,
        "Hourly cost of one GiB of an EBS volume"
    );
    describe_gauge!(
        cost::ELB_USD_PER_HOUR,
        "Hourly cost of a load balancer"
    );
    describe_gauge!(
        cost::NATGW_USD_PER_HOUR,
        "Hourly cost of a NAT gateway"
    );
    describe_gauge!(
        cost::VPC_ENDPOINT_USD_PER_HOUR,
        "Hourly cost of a VPC endpoint"
    );
    describe_gauge!(
        cost::VPC_TRANSIT_GATEWAY_USD_PER_HOUR,
        "Hourly cost of a transit gateway attachment"
    );
    describe_gauge!(
        cost::VPC_ELASTIC_IP_USD_PER_HOUR,
        "Hourly cost of a public IPv4 address"
    );
    describe_gauge!(
        cost::RDS_USD_PER_HOUR,
        "Hourly cost of an RDS instance"
    );
    describe_gauge!(
        cost::S3_UNIT_COST_USD,
        "S3 unit cost derived from billing data (per 1k requests, per GiB-hour, or per unit)"
    );

    // Refresh metrics
    describe_counter!(
        refresh::REFRESH_TOTAL,
        "Pricing cache refreshes by service and status"
    );
    describe_histogram!(
        refresh::REFRESH_DURATION_SECONDS,
        "Pricing cache refresh duration in seconds"
    );
    describe_counter!(
        refresh::DOCUMENTS_SKIPPED_TOTAL,
        "Price-list documents or dimensions skipped as unparseable"
    );
    describe_counter!(
        refresh::COLLECTOR_ERRORS_TOTAL,
        "Collector errors by collector"
    );
}
