//! Typed access to the three record sets: currencies, metals and the fetch log.
//!
//! All writes go through the upsert operations here, which keep at most one
//! record per currency code and per metal name.

use crate::core::model::{Currency, FetchLogEntry, Metal, MetalPrice, Snapshot};
use crate::core::store::{KeyValueCollection, Store};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub const CURRENCIES: &str = "currencies";
pub const METALS: &str = "metals";
pub const FETCH_LOG: &str = "fetch_log";

/// Result of a rate-only batch update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchUpdateReport {
    pub updated: usize,
    /// Codes with no seeded currency record.
    pub skipped: usize,
    /// Rates that were zero, negative or not finite.
    pub rejected: usize,
}

/// Order-preserving encoding of a timestamp at full nanosecond precision.
/// Flipping the sign bit makes the big-endian bytes of the i64 seconds sort like
/// the number; the sub-second nanoseconds follow.
fn timestamp_key(at: DateTime<Utc>) -> [u8; 12] {
    let mut key = [0u8; 12];
    key[..8].copy_from_slice(&((at.timestamp() as u64) ^ (1 << 63)).to_be_bytes());
    key[8..].copy_from_slice(&at.timestamp_subsec_nanos().to_be_bytes());
    key
}

fn log_key(at: DateTime<Utc>, seq: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&timestamp_key(at));
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

fn decode<T: DeserializeOwned>(collection: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).with_context(|| format!("Corrupt record in {collection}"))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).context("Failed to encode record")
}

fn is_valid_amount(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

pub struct RateRepository {
    store: Arc<dyn Store>,
    currencies: Arc<dyn KeyValueCollection>,
    metals: Arc<dyn KeyValueCollection>,
    fetch_log: Arc<dyn KeyValueCollection>,
}

impl RateRepository {
    pub fn new(store: Arc<dyn Store>) -> Result<Self> {
        Ok(Self {
            currencies: store.collection(CURRENCIES)?,
            metals: store.collection(METALS)?,
            fetch_log: store.collection(FETCH_LOG)?,
            store,
        })
    }

    pub async fn upsert_currency(
        &self,
        code: &str,
        name: &str,
        symbol: &str,
        rate: f64,
    ) -> Result<()> {
        if !is_valid_amount(rate) {
            bail!("Refusing to store non-positive rate {rate} for {code}");
        }

        let record = match self.currency_by_code(code).await? {
            Some(mut existing) => {
                debug!(code, "Currency PATCH");
                existing.name = name.to_string();
                existing.symbol = symbol.to_string();
                existing.rate_to_usd = rate;
                existing
            }
            None => {
                debug!(code, "Currency INSERT");
                Currency {
                    code: code.to_string(),
                    name: name.to_string(),
                    symbol: symbol.to_string(),
                    rate_to_usd: rate,
                }
            }
        };

        self.currencies
            .put(code.as_bytes(), &encode(&record)?)
            .await
            .with_context(|| format!("Failed to store currency {code}"))
    }

    pub async fn upsert_metal(
        &self,
        name: &str,
        price: f64,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        if !is_valid_amount(price) {
            bail!("Refusing to store non-positive price {price} for {name}");
        }

        let record = match self.metal_by_name(name).await? {
            Some(mut existing) => {
                debug!(metal = name, "Metal PATCH");
                existing.price_usd = price;
                existing.last_updated = updated_at;
                existing
            }
            None => {
                debug!(metal = name, "Metal INSERT");
                Metal {
                    name: name.to_string(),
                    price_usd: price,
                    last_updated: updated_at,
                }
            }
        };

        self.metals
            .put(name.as_bytes(), &encode(&record)?)
            .await
            .with_context(|| format!("Failed to store metal {name}"))
    }

    /// Applies rate-only updates to currencies that already exist.
    ///
    /// Never creates a record: currency metadata comes from seeding.
    pub async fn batch_update_rates(
        &self,
        updates: &[(String, f64)],
    ) -> Result<BatchUpdateReport> {
        let mut report = BatchUpdateReport::default();
        if updates.is_empty() {
            return Ok(report);
        }

        let mut existing: HashMap<String, Currency> = self
            .list_currencies()
            .await?
            .into_iter()
            .map(|c| (c.code.clone(), c))
            .collect();

        for (code, rate) in updates {
            let Some(currency) = existing.get_mut(code) else {
                debug!(code = %code, "No seeded currency, skipping rate");
                report.skipped += 1;
                continue;
            };
            if !is_valid_amount(*rate) {
                warn!(code = %code, rate, "Ignoring invalid rate");
                report.rejected += 1;
                continue;
            }

            currency.rate_to_usd = *rate;
            self.currencies
                .put(code.as_bytes(), &encode(&*currency)?)
                .await
                .with_context(|| format!("Failed to update rate for {code}"))?;
            report.updated += 1;
        }

        debug!(?report, "Applied rate batch");
        Ok(report)
    }

    /// Appends an entry to the fetch log. Entries sharing a timestamp keep
    /// their insertion order.
    pub async fn append_log(&self, entry: &FetchLogEntry) -> Result<()> {
        let value = encode(entry)?;
        let mut seq = 0u32;
        loop {
            let key = log_key(entry.fetched_at, seq);
            if self.fetch_log.get(&key).await?.is_none() {
                self.fetch_log
                    .put(&key, &value)
                    .await
                    .context("Failed to append fetch log entry")?;
                return Ok(());
            }
            seq = seq
                .checked_add(1)
                .context("Too many fetch log entries with one timestamp")?;
        }
    }

    /// Deletes every log entry with `fetched_at < cutoff` and returns how many went.
    pub async fn prune_log_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let expired = self.fetch_log.range_before(&timestamp_key(cutoff)).await?;
        for (key, _) in &expired {
            self.fetch_log
                .remove(key)
                .await
                .context("Failed to delete fetch log entry")?;
        }
        Ok(expired.len())
    }

    pub async fn fetch_log(&self) -> Result<Vec<FetchLogEntry>> {
        self.fetch_log
            .scan()
            .await?
            .iter()
            .map(|(_, v)| decode(FETCH_LOG, v))
            .collect()
    }

    pub async fn list_currencies(&self) -> Result<Vec<Currency>> {
        self.currencies
            .scan()
            .await?
            .iter()
            .map(|(_, v)| decode(CURRENCIES, v))
            .collect()
    }

    pub async fn list_metals(&self) -> Result<Vec<Metal>> {
        self.metals
            .scan()
            .await?
            .iter()
            .map(|(_, v)| decode(METALS, v))
            .collect()
    }

    pub async fn currency_by_code(&self, code: &str) -> Result<Option<Currency>> {
        self.currencies
            .get(code.as_bytes())
            .await?
            .map(|v| decode(CURRENCIES, &v))
            .transpose()
    }

    pub async fn metal_by_name(&self, name: &str) -> Result<Option<Metal>> {
        self.metals
            .get(name.as_bytes())
            .await?
            .map(|v| decode(METALS, &v))
            .transpose()
    }

    /// Timestamp of the newest fetch log entry.
    pub async fn last_fetch_time(&self) -> Result<Option<DateTime<Utc>>> {
        let last = self.fetch_log.last().await?;
        Ok(last
            .map(|(_, v)| decode::<FetchLogEntry>(FETCH_LOG, &v))
            .transpose()?
            .map(|entry| entry.fetched_at))
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        let (last_fetch_time, metals, currencies) = tokio::try_join!(
            self.last_fetch_time(),
            self.list_metals(),
            self.list_currencies()
        )?;

        Ok(Snapshot {
            last_fetch_time,
            metals: metals
                .into_iter()
                .map(|m| MetalPrice {
                    name: m.name,
                    price_usd: m.price_usd,
                })
                .collect(),
            currencies,
        })
    }

    pub fn persist(&self) -> Result<()> {
        self.store.persist()
    }
}
