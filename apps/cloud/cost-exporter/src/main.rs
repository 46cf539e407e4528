//! Cloud Cost Exporter
//!
//! Serves hourly AWS resource prices as Prometheus gauges. Price-list data is
//! cached per service and region and refreshed on an interval; S3 unit costs
//! come from billing data instead.

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::FromEnv;
use domain_pricing::PricingClient;
use eyre::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

mod aws;
mod collectors;
mod config;
mod inventory;
mod server;

use aws::{CostExplorerClient, PriceListClient};
use collectors::{
    CollectorRegistry, Discount, EbsCollector, Ec2Collector, ElbCollector, NatGatewayCollector,
    RdsCollector, S3Collector, VpcCollector,
};
use config::{Config, Service};
use inventory::{EmptyInventory, FileInventory, Inventory};
use server::AppState;

#[derive(Parser)]
#[command(name = "cost-exporter")]
#[command(about = "Export AWS resource prices as Prometheus metrics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve /metrics, /status and /healthz
    Serve {
        /// Populate every cache before accepting scrapes
        #[arg(long)]
        warm: bool,

        /// Cron expression for unconditional refreshes (e.g. "0 0 3 * * *")
        #[arg(long)]
        refresh_cron: Option<String>,
    },

    /// Run a single scrape and print the samples as JSON
    Collect,

    /// Print cache status per collector
    Status {
        /// Refresh every cache first
        #[arg(short, long)]
        refresh: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();
    let cli = Cli::parse();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    observability::init_metrics();

    let registry = Arc::new(build_registry(&config).await);

    match cli.command {
        Commands::Serve { warm, refresh_cron } => {
            let (shutdown, cancel) = watch::channel(false);

            if warm {
                info!("Warming pricing caches");
                refresh_all(&registry, &cancel).await;
            }

            // Held for the lifetime of the server
            let _scheduler = match refresh_cron {
                Some(cron) => Some(server::schedule_refresh(&cron, registry.clone(), cancel.clone()).await?),
                None => None,
            };

            let app = server::router(AppState {
                registry: registry.clone(),
                cancel,
            });
            server::serve(app, &config.server, shutdown).await?;
        }

        Commands::Collect => {
            let scrape = registry.scrape(&domain_pricing::never_cancelled()).await;
            info!(
                samples = scrape.samples.len(),
                errors = scrape.errors.len(),
                "Collection complete"
            );
            println!("{}", serde_json::to_string_pretty(&scrape)?);
        }

        Commands::Status { refresh } => {
            if refresh {
                refresh_all(&registry, &domain_pricing::never_cancelled()).await;
            }
            let status = registry.status().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

async fn refresh_all(registry: &CollectorRegistry, cancel: &watch::Receiver<bool>) {
    let failures = registry.refresh_all(cancel).await;
    for (collector, e) in &failures {
        warn!(collector, error = %e, "Initial refresh failed, prices load on first scrape");
    }
}

async fn build_registry(config: &Config) -> CollectorRegistry {
    let sdk_config = aws::load_sdk_config().await;

    let inventory: Arc<dyn Inventory> = match &config.inventory_path {
        Some(path) => {
            info!(path = %path.display(), "Reading resources from inventory file");
            Arc::new(FileInventory::new(path.clone()))
        }
        None => {
            warn!("INVENTORY_PATH not set, no resources will be priced");
            Arc::new(EmptyInventory)
        }
    };

    let price_list = PriceListClient::sdk_client(
        &sdk_config,
        &config.aws.pricing_region,
        config.aws.pricing_endpoint.as_deref(),
    );
    let clients: HashMap<String, Arc<dyn PricingClient>> = config
        .aws
        .regions
        .iter()
        .map(|region| {
            let client: Arc<dyn PricingClient> =
                Arc::new(PriceListClient::new(price_list.clone(), region.clone()));
            (region.clone(), client)
        })
        .collect();

    let regions = config.aws.regions.clone();
    let interval = config.refresh.pricing_interval;
    let concurrency = config.refresh.max_concurrency;
    let discount = Discount::new(config.discount_percent);
    let fallback = config.fallback_rates;

    let mut registry = CollectorRegistry::new(inventory);
    for service in &config.services {
        match service {
            Service::Ec2 => registry.register(Arc::new(Ec2Collector::new(
                regions.clone(),
                clients.clone(),
                interval,
                concurrency,
                discount,
            ))),
            Service::Ebs => registry.register(Arc::new(EbsCollector::new(
                regions.clone(),
                clients.clone(),
                interval,
                concurrency,
                discount,
            ))),
            Service::Elb => registry.register(Arc::new(ElbCollector::new(
                regions.clone(),
                clients.clone(),
                interval,
                concurrency,
                discount,
                fallback,
            ))),
            Service::Natgw => registry.register(Arc::new(NatGatewayCollector::new(
                regions.clone(),
                clients.clone(),
                interval,
                concurrency,
                discount,
                fallback,
            ))),
            Service::Vpc => registry.register(Arc::new(VpcCollector::new(
                regions.clone(),
                clients.clone(),
                interval,
                concurrency,
                discount,
                fallback,
            ))),
            Service::Rds => registry.register(Arc::new(RdsCollector::new(
                regions.clone(),
                clients.clone(),
                interval,
                concurrency,
                discount,
            ))),
            Service::S3 => {
                let billing =
                    CostExplorerClient::connect(&sdk_config, config.aws.cost_explorer_endpoint.as_deref());
                registry.register(Arc::new(S3Collector::new(
                    Arc::new(billing),
                    config.refresh.billing_interval,
                    config.refresh.billing_lookback_days,
                )));
            }
        }
    }

    info!(
        collectors = registry.collectors().len(),
        regions = regions.len(),
        "Collectors registered"
    );
    registry
}
