//! Cost gauges.
//!
//! Collectors produce [`CostSample`]s; this module is the only place they
//! turn into recorder calls, so the collectors stay testable without a
//! global recorder.

use metrics::{Label, gauge};
use serde::Serialize;

pub const EC2_CPU_USD_PER_CORE_HOUR: &str = "cloudcost_aws_ec2_instance_cpu_usd_per_core_hour";
pub const EC2_MEMORY_USD_PER_GIB_HOUR: &str = "cloudcost_aws_ec2_instance_memory_usd_per_gib_hour";
pub const EC2_TOTAL_USD_PER_HOUR: &str = "cloudcost_aws_ec2_instance_total_usd_per_hour";
pub const EBS_USD_PER_GIB_HOUR: &str = "cloudcost_aws_ebs_volume_usd_per_gib_hour";
pub const ELB_USD_PER_HOUR: &str = "cloudcost_aws_elb_loadbalancer_usd_per_hour";
pub const NATGW_USD_PER_HOUR: &str = "cloudcost_aws_natgw_usd_per_hour";
pub const VPC_ENDPOINT_USD_PER_HOUR: &str = "cloudcost_aws_vpc_endpoint_usd_per_hour";
pub const VPC_TRANSIT_GATEWAY_USD_PER_HOUR: &str = "cloudcost_aws_vpc_transit_gateway_usd_per_hour";
pub const VPC_ELASTIC_IP_USD_PER_HOUR: &str = "cloudcost_aws_vpc_elastic_ip_usd_per_hour";
pub const RDS_USD_PER_HOUR: &str = "cloudcost_aws_rds_instance_usd_per_hour";
pub const S3_UNIT_COST_USD: &str = "cloudcost_aws_s3_unit_cost_usd";

/// One gauge value with its labels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSample {
    pub name: &'static str,
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

impl CostSample {
    pub fn new(name: &'static str, value: f64) -> Self {
        Self {
            name,
            labels: Vec::new(),
            value,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((key.into(), value.into()));
        self
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Cost gauge recorder
pub struct CostMetrics;

impl CostMetrics {
    /// Set one gauge per sample on the installed recorder
    pub fn publish(samples: &[CostSample]) {
        for sample in samples {
            let labels: Vec<Label> = sample
                .labels
                .iter()
                .map(|(key, value)| Label::new(key.clone(), value.clone()))
                .collect();
            gauge!(sample.name, labels).set(sample.value);
        }

        tracing::debug!(samples = samples.len(), "Published cost samples");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_sample_labels() {
        let sample = CostSample::new(NATGW_USD_PER_HOUR, 0.045)
            .with_label("region", "us-east-1")
            .with_label("nat_gateway_id", "nat-0abc");

        assert_eq!(sample.label("region"), Some("us-east-1"));
        assert_eq!(sample.label("missing"), None);
    }

    #[test]
    fn test_publish_renders_gauges() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            CostMetrics::publish(&[CostSample::new(EC2_TOTAL_USD_PER_HOUR, 0.468)
                .with_label("region", "af-south-1")
                .with_label("instance_type", "c5ad.2xlarge")]);
        });

        let rendered = handle.render();
        assert!(rendered.contains(EC2_TOTAL_USD_PER_HOUR));
        assert!(rendered.contains("instance_type=\"c5ad.2xlarge\""));
        assert!(rendered.contains("0.468"));
    }
}
