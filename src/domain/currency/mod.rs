//! Exchange-rate provider port

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateProviderError {
    #[error("rate request failed: {0}")]
    Request(String),

    #[error("malformed rate payload: {0}")]
    Malformed(String),
}

/// Source of live exchange rates.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Currency code → units of that currency per 1 USD.
    async fn fetch_units_per_usd(&self) -> Result<HashMap<String, Decimal>, RateProviderError>;
}
