use serde::{Deserialize, Serialize};

/// Hourly rates (USD) emitted when a region has no pricing data at all.
///
/// Passed into each collector so tests and multiple exporters can run with
/// their own values. Every use is logged as a warning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackRates {
    pub application_load_balancer: f64,
    pub network_load_balancer: f64,
    pub classic_load_balancer: f64,
    pub vpc_endpoint: f64,
    pub vpc_endpoint_service: f64,
    pub transit_gateway: f64,
    pub elastic_ip_in_use: f64,
    pub elastic_ip_idle: f64,
    pub nat_gateway: f64,
}

impl Default for FallbackRates {
    fn default() -> Self {
        Self {
            application_load_balancer: 0.0225,
            network_load_balancer: 0.0225,
            classic_load_balancer: 0.025,
            vpc_endpoint: 0.01,
            vpc_endpoint_service: 0.05,
            transit_gateway: 0.05,
            elastic_ip_in_use: 0.005,
            elastic_ip_idle: 0.005,
            nat_gateway: 0.045,
        }
    }
}

impl FallbackRates {
    pub fn load_balancer(&self, kind: super::LoadBalancerKind) -> f64 {
        match kind {
            super::LoadBalancerKind::Application => self.application_load_balancer,
            super::LoadBalancerKind::Network => self.network_load_balancer,
            super::LoadBalancerKind::Classic => self.classic_load_balancer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::LoadBalancerKind;

    #[test]
    fn test_default_rates() {
        let rates = FallbackRates::default();
        assert_eq!(rates.load_balancer(LoadBalancerKind::Application), 0.0225);
        assert_eq!(rates.load_balancer(LoadBalancerKind::Network), 0.0225);
        assert_eq!(rates.load_balancer(LoadBalancerKind::Classic), 0.025);
        assert_eq!(rates.vpc_endpoint, 0.01);
        assert_eq!(rates.vpc_endpoint_service, 0.05);
        assert_eq!(rates.transit_gateway, 0.05);
        assert_eq!(rates.elastic_ip_in_use, 0.005);
        assert_eq!(rates.elastic_ip_idle, 0.005);
    }
}
