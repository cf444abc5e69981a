//! Records kept by the store and the read views built from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A fiat currency together with its latest rate against the US dollar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: String,
    /// Units of this currency per one USD.
    #[serde(rename = "rateToUSD")]
    pub rate_to_usd: f64,
}

impl Currency {
    /// Rate used for a currency that was never updated from the provider.
    pub const DEFAULT_RATE: f64 = 1.0;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetalKind {
    Gold,
    Silver,
}

impl MetalKind {
    pub const ALL: [MetalKind; 2] = [MetalKind::Gold, MetalKind::Silver];

    /// Key under which the metal is stored.
    pub fn name(&self) -> &'static str {
        match self {
            MetalKind::Gold => "gold",
            MetalKind::Silver => "silver",
        }
    }

    /// Spot instrument code quoted against USD.
    pub fn instrument(&self) -> &'static str {
        match self {
            MetalKind::Gold => "XAU",
            MetalKind::Silver => "XAG",
        }
    }
}

impl Display for MetalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Spot price of a metal per troy ounce in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metal {
    pub name: String,
    #[serde(rename = "priceUSD")]
    pub price_usd: f64,
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
}

/// One audit record per sync cycle. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchLogEntry {
    pub fetched_at: DateTime<Utc>,
    pub metals_source: String,
    pub currency_source: String,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetalPrice {
    pub name: String,
    #[serde(rename = "priceUSD")]
    pub price_usd: f64,
}

/// Combined read view handed to the conversion UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub last_fetch_time: Option<DateTime<Utc>>,
    pub metals: Vec<MetalPrice>,
    pub currencies: Vec<Currency>,
}
