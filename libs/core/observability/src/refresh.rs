//! Refresh and collector operational metrics.

use metrics::{counter, histogram};
use std::time::Instant;

pub const REFRESH_TOTAL: &str = "cloudcost_refresh_total";
pub const REFRESH_DURATION_SECONDS: &str = "cloudcost_refresh_duration_seconds";
pub const DOCUMENTS_SKIPPED_TOTAL: &str = "cloudcost_price_documents_skipped_total";
pub const COLLECTOR_ERRORS_TOTAL: &str = "cloudcost_collector_errors_total";

/// Refresh metrics recorder
pub struct RefreshMetrics;

impl RefreshMetrics {
    pub fn record_success(service: &str, duration_secs: f64) {
        counter!(REFRESH_TOTAL, "service" => service.to_string(), "status" => "success").increment(1);
        histogram!(REFRESH_DURATION_SECONDS, "service" => service.to_string()).record(duration_secs);
    }

    pub fn record_failure(service: &str, error: &str) {
        counter!(REFRESH_TOTAL, "service" => service.to_string(), "status" => "failure").increment(1);

        tracing::warn!(service = service, error = error, "Refresh failed");
    }

    /// Count skipped documents and dimensions from one parse pass
    pub fn record_skipped(service: &str, documents: usize, dimensions: usize) {
        if documents > 0 {
            counter!(DOCUMENTS_SKIPPED_TOTAL, "service" => service.to_string(), "kind" => "document")
                .increment(documents as u64);
        }
        if dimensions > 0 {
            counter!(DOCUMENTS_SKIPPED_TOTAL, "service" => service.to_string(), "kind" => "dimension")
                .increment(dimensions as u64);
        }
    }

    pub fn record_collector_error(collector: &str) {
        counter!(COLLECTOR_ERRORS_TOTAL, "collector" => collector.to_string()).increment(1);
    }
}

/// Timer guard for refresh durations.
///
/// Records a failure when dropped without [`RefreshTimer::succeed`], so an
/// early `?` return is still counted.
pub struct RefreshTimer {
    start: Instant,
    service: String,
    finished: bool,
}

impl RefreshTimer {
    pub fn start(service: &str) -> Self {
        Self {
            start: Instant::now(),
            service: service.to_string(),
            finished: false,
        }
    }

    /// Record success. Returns the duration in milliseconds.
    pub fn succeed(mut self) -> u64 {
        self.finished = true;
        let duration = self.start.elapsed();
        RefreshMetrics::record_success(&self.service, duration.as_secs_f64());
        duration.as_millis() as u64
    }

    pub fn fail(mut self, error: &str) {
        self.finished = true;
        RefreshMetrics::record_failure(&self.service, error);
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        if !self.finished {
            RefreshMetrics::record_failure(&self.service, "refresh abandoned");
        }
    }
}
