//! Configuration for the cost exporter

use core_config::server::ServerConfig;
use core_config::{env_duration_secs, env_list, env_parse, ConfigError, Environment, FromEnv};
use domain_pricing::billing::DEFAULT_LOOKBACK_DAYS;
use domain_pricing::services::FallbackRates;
use domain_pricing::DEFAULT_MAX_CONCURRENCY;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

const DEFAULT_AWS_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "eu-west-1",
    "eu-central-1",
];

const DEFAULT_PRICING_REGION: &str = "us-east-1";

/// A priced AWS service with its own collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Service {
    Ec2,
    Ebs,
    Elb,
    Natgw,
    Vpc,
    Rds,
    S3,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub aws: AwsConfig,
    pub refresh: RefreshConfig,
    /// Percentage taken off price-list rates, 0-100
    pub discount_percent: f64,
    pub services: Vec<Service>,
    /// JSON resource inventory; nothing is priced without one
    pub inventory_path: Option<PathBuf>,
    pub fallback_rates: FallbackRates,
}

#[derive(Debug, Clone)]
pub struct AwsConfig {
    /// Regions whose prices are cached
    pub regions: Vec<String>,
    /// Region of the Price List API endpoint
    pub pricing_region: String,
    /// Endpoint overrides, for local testing
    pub pricing_endpoint: Option<String>,
    pub cost_explorer_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub pricing_interval: Duration,
    pub billing_interval: Duration,
    pub billing_lookback_days: u32,
    pub max_concurrency: usize,
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_services() -> Result<Vec<Service>, ConfigError> {
    let all: Vec<String> = Service::iter().map(|service| service.to_string()).collect();
    let defaults: Vec<&str> = all.iter().map(String::as_str).collect();

    env_list("EXPORTER_SERVICES", &defaults)
        .iter()
        .map(|name| {
            Service::from_str(name).map_err(|_| ConfigError::ParseError {
                key: "EXPORTER_SERVICES".to_string(),
                details: format!("unknown service '{name}'"),
            })
        })
        .collect()
}

impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        let discount_percent: f64 = env_parse("DISCOUNT_PERCENT", 0.0)?;
        if !(0.0..=100.0).contains(&discount_percent) {
            return Err(ConfigError::ParseError {
                key: "DISCOUNT_PERCENT".to_string(),
                details: format!("{discount_percent} is outside 0-100"),
            });
        }

        let max_concurrency: usize = env_parse("PRICING_MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY)?;
        if max_concurrency == 0 {
            return Err(ConfigError::ParseError {
                key: "PRICING_MAX_CONCURRENCY".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Config {
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            aws: AwsConfig {
                regions: env_list("AWS_REGIONS", DEFAULT_AWS_REGIONS),
                pricing_region: optional("AWS_PRICING_REGION")
                    .unwrap_or_else(|| DEFAULT_PRICING_REGION.to_string()),
                pricing_endpoint: optional("AWS_PRICING_ENDPOINT"),
                cost_explorer_endpoint: optional("AWS_COST_EXPLORER_ENDPOINT"),
            },
            refresh: RefreshConfig {
                pricing_interval: env_duration_secs("PRICING_REFRESH_INTERVAL_SECS", 86_400)?,
                billing_interval: env_duration_secs("BILLING_REFRESH_INTERVAL_SECS", 3_600)?,
                billing_lookback_days: env_parse("BILLING_LOOKBACK_DAYS", DEFAULT_LOOKBACK_DAYS)?,
                max_concurrency,
            },
            discount_percent,
            services: parse_services()?,
            inventory_path: optional("INVENTORY_PATH").map(PathBuf::from),
            fallback_rates: FallbackRates::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let mut all: Vec<(&str, Option<&str>)> = Vec::new();
        for key in [
            "AWS_REGIONS",
            "AWS_PRICING_REGION",
            "AWS_PRICING_ENDPOINT",
            "AWS_COST_EXPLORER_ENDPOINT",
            "DISCOUNT_PERCENT",
            "EXPORTER_SERVICES",
            "INVENTORY_PATH",
            "PRICING_MAX_CONCURRENCY",
            "PRICING_REFRESH_INTERVAL_SECS",
        ] {
            if !vars.iter().any(|(name, _)| *name == key) {
                all.push((key, None));
            }
        }
        all.extend_from_slice(vars);
        temp_env::with_vars(all, f);
    }

    #[test]
    fn test_defaults() {
        with_env(&[], || {
            let config = Config::from_env().unwrap();

            assert_eq!(config.aws.regions.len(), 6);
            assert_eq!(config.aws.pricing_region, "us-east-1");
            assert_eq!(config.aws.pricing_endpoint, None);
            assert_eq!(config.aws.cost_explorer_endpoint, None);
            assert_eq!(config.refresh.pricing_interval, Duration::from_secs(86_400));
            assert_eq!(config.refresh.billing_interval, Duration::from_secs(3_600));
            assert_eq!(config.refresh.billing_lookback_days, 30);
            assert_eq!(config.refresh.max_concurrency, 5);
            assert_eq!(config.discount_percent, 0.0);
            assert_eq!(config.services, Service::iter().collect::<Vec<_>>());
            assert_eq!(config.inventory_path, None);
            assert_eq!(config.fallback_rates, FallbackRates::default());
        });
    }

    #[test]
    fn test_overrides() {
        with_env(
            &[
                ("AWS_REGIONS", Some("eu-west-1, ap-south-1")),
                ("AWS_PRICING_REGION", Some("eu-central-1")),
                ("AWS_PRICING_ENDPOINT", Some("http://localhost:4566")),
                ("DISCOUNT_PERCENT", Some("12.5")),
                ("EXPORTER_SERVICES", Some("ec2,S3")),
                ("INVENTORY_PATH", Some("/etc/exporter/inventory.json")),
                ("PRICING_REFRESH_INTERVAL_SECS", Some("600")),
            ],
            || {
                let config = Config::from_env().unwrap();

                assert_eq!(config.aws.regions, vec!["eu-west-1", "ap-south-1"]);
                assert_eq!(config.aws.pricing_region, "eu-central-1");
                assert_eq!(config.aws.pricing_endpoint.as_deref(), Some("http://localhost:4566"));
                assert_eq!(config.discount_percent, 12.5);
                assert_eq!(config.services, vec![Service::Ec2, Service::S3]);
                assert_eq!(
                    config.inventory_path,
                    Some(PathBuf::from("/etc/exporter/inventory.json"))
                );
                assert_eq!(config.refresh.pricing_interval, Duration::from_secs(600));
            },
        );
    }

    #[test]
    fn test_loads_without_static_credentials() {
        with_env(
            &[
                ("AWS_ACCESS_KEY_ID", None),
                ("AWS_SECRET_ACCESS_KEY", None),
                ("AWS_PRICING_ENDPOINT", Some("  ")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.aws.pricing_endpoint, None);
            },
        );
    }

    #[test]
    fn test_discount_out_of_range() {
        with_env(&[("DISCOUNT_PERCENT", Some("120"))], || {
            let result = Config::from_env();
            assert!(matches!(result, Err(ConfigError::ParseError { key, .. }) if key == "DISCOUNT_PERCENT"));
        });
    }

    #[test]
    fn test_unknown_service() {
        with_env(&[("EXPORTER_SERVICES", Some("ec2,lambda"))], || {
            let result = Config::from_env();
            assert!(matches!(
                result,
                Err(ConfigError::ParseError { key, details })
                    if key == "EXPORTER_SERVICES" && details.contains("lambda")
            ));
        });
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        with_env(&[("PRICING_MAX_CONCURRENCY", Some("0"))], || {
            assert!(Config::from_env().is_err());
        });
    }
}
