//! AWS API clients
//!
//! Price List and Cost Explorer clients built on the AWS SDK. Credentials
//! come from the SDK's default chain (environment, web identity, instance
//! profile, shared files). The clients implement the pricing domain's client
//! capabilities and nothing more.

mod cost_explorer;
mod pricing;

pub use cost_explorer::CostExplorerClient;
pub use pricing::PriceListClient;

use aws_config::SdkConfig;
use aws_sdk_pricing::error::{DisplayErrorContext, ProvideErrorMetadata};
use domain_pricing::PricingError;
use thiserror::Error;

/// Shared SDK config from the default provider chain.
///
/// Each client sets its own region on top of it.
pub async fn load_sdk_config() -> SdkConfig {
    aws_config::from_env().load().await
}

/// Error type for AWS API calls
#[derive(Error, Debug, PartialEq)]
pub enum AwsError {
    /// Error code and message returned by the service
    #[error("{code}: {message}")]
    Api { code: String, message: String },

    /// Failure before a service response: credentials, transport, timeout
    #[error("{0}")]
    Sdk(String),

    #[error("Invalid request: {0}")]
    Request(String),
}

impl AwsError {
    /// Keep the service error code when there is one, otherwise the full
    /// error chain.
    pub fn from_sdk<E>(err: E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error,
    {
        match err.code() {
            Some(code) => AwsError::Api {
                code: code.to_string(),
                message: err.message().unwrap_or_default().to_string(),
            },
            None => AwsError::Sdk(DisplayErrorContext(&err).to_string()),
        }
    }

    /// Convert into a regional pricing error
    pub fn into_pricing(self, region: &str) -> PricingError {
        PricingError::Client {
            region: region.to_string(),
            message: self.to_string(),
        }
    }

    /// Convert into a billing error
    pub fn into_billing(self) -> PricingError {
        PricingError::Billing(self.to_string())
    }
}
