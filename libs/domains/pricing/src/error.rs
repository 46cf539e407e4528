use thiserror::Error;

/// Result type for pricing operations
pub type PricingResult<T> = Result<T, PricingError>;

/// Errors that can occur while refreshing or reading pricing data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    /// The region is absent from an up-to-date cache
    #[error("Region not found: {0}")]
    RegionNotFound(String),

    /// The region exists but carries no price for the key (instance type, volume type, ...)
    #[error("No price for {key} in region {region}")]
    KeyNotFound { region: String, key: String },

    /// A configured region has no pricing client
    #[error("No pricing client configured for region {0}")]
    ClientNotFound(String),

    /// Instance attributes needed for cost allocation are missing or non-numeric
    #[error("Cannot parse attributes: {0}")]
    CannotParseAttributes(String),

    /// A regional pricing API call failed
    #[error("Pricing API error in {region}: {message}")]
    Client { region: String, message: String },

    /// A billing (cost and usage) API call failed
    #[error("Billing API error: {0}")]
    Billing(String),

    /// The refresh was cancelled before it completed
    #[error("Refresh cancelled")]
    Cancelled,

    /// A fan-out task panicked or was aborted
    #[error("Refresh task failed: {0}")]
    Task(String),

    /// A price-list document could not be decoded
    #[error("Invalid price document: {0}")]
    InvalidDocument(String),
}

impl PricingError {
    /// Whether the error is a structural "not found" (as opposed to a refresh failure)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PricingError::RegionNotFound(_) | PricingError::KeyNotFound { .. }
        )
    }

    pub fn key_not_found(region: impl Into<String>, key: impl ToString) -> Self {
        PricingError::KeyNotFound {
            region: region.into(),
            key: key.to_string(),
        }
    }
}
