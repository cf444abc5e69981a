//! Rate provider abstractions

use crate::core::error::FetchError;
use crate::core::model::MetalKind;
use async_trait::async_trait;
use std::collections::BTreeMap;

#[async_trait]
pub trait MetalQuoteSource: Send + Sync {
    /// Name recorded in the fetch log.
    fn source_name(&self) -> &str;

    /// Current ask price of `metal` in USD per troy ounce.
    async fn fetch_ask(&self, metal: MetalKind) -> Result<f64, FetchError>;
}

#[async_trait]
pub trait CurrencyRateSource: Send + Sync {
    /// Name recorded in the fetch log.
    fn source_name(&self) -> &str;

    /// Latest rate table keyed by currency code, USD based.
    async fn fetch_rates(&self) -> Result<BTreeMap<String, f64>, FetchError>;
}
