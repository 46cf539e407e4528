//! Observed resources to price.
//!
//! Collectors only price what the inventory reports. The inventory document is
//! re-read on every scrape so an external job can keep it current.

use async_trait::async_trait;
use domain_pricing::services::LoadBalancerKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Failed to read inventory {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse inventory {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Resources {
    pub instances: Vec<Instance>,
    pub volumes: Vec<Volume>,
    pub load_balancers: Vec<LoadBalancer>,
    pub nat_gateways: Vec<NatGateway>,
    pub vpc_endpoints: Vec<VpcEndpoint>,
    pub transit_gateway_attachments: Vec<TransitGatewayAttachment>,
    pub elastic_ips: Vec<ElasticIp>,
    pub rds_instances: Vec<RdsInstance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub region: String,
    pub instance_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub id: String,
    pub region: String,
    /// API name of the volume type (`gp3`, `io2`, ...)
    pub volume_type: String,
    #[serde(default)]
    pub size_gib: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    pub name: String,
    pub region: String,
    #[serde(rename = "type")]
    pub kind: LoadBalancerKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatGateway {
    pub id: String,
    pub region: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// Interface or gateway endpoint in a consumer VPC
    #[default]
    Standard,
    /// Endpoint service exposed to other accounts
    Service,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcEndpoint {
    pub id: String,
    pub region: String,
    #[serde(default)]
    pub kind: EndpointKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitGatewayAttachment {
    pub id: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElasticIp {
    pub address: String,
    pub region: String,
    /// Associated with a network interface
    #[serde(default)]
    pub in_use: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdsInstance {
    pub id: String,
    pub region: String,
    pub instance_class: String,
    /// Price-list engine name (`PostgreSQL`, `MySQL`, ...)
    pub engine: String,
    /// `Single-AZ` or `Multi-AZ`
    pub deployment: String,
}

/// Source of observed resources
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Inventory: Send + Sync {
    async fn resources(&self) -> Result<Resources, InventoryError>;
}

/// Reads a JSON [`Resources`] document on every call
#[derive(Debug, Clone)]
pub struct FileInventory {
    path: PathBuf,
}

impl FileInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Inventory for FileInventory {
    async fn resources(&self) -> Result<Resources, InventoryError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|source| InventoryError::Io {
            path: self.path.clone(),
            source,
        })?;

        let resources: Resources =
            serde_json::from_slice(&bytes).map_err(|source| InventoryError::Parse {
                path: self.path.clone(),
                source,
            })?;

        debug!(
            path = %self.path.display(),
            instances = resources.instances.len(),
            volumes = resources.volumes.len(),
            "Loaded inventory"
        );

        Ok(resources)
    }
}

/// No resources: used when no inventory is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyInventory;

#[async_trait]
impl Inventory for EmptyInventory {
    async fn resources(&self) -> Result<Resources, InventoryError> {
        Ok(Resources::default())
    }
}
