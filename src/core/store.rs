use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub type KeyValuePair = (Vec<u8>, Vec<u8>);

/// An ordered byte-keyed collection. Every call is atomic on its own.
#[async_trait]
pub trait KeyValueCollection: Send + Sync {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Inserts the value, replacing whatever was stored under `key`.
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    async fn remove(&self, key: &[u8]) -> Result<()>;

    /// All pairs in ascending key order.
    async fn scan(&self) -> Result<Vec<KeyValuePair>>;

    /// Pairs whose key sorts strictly before `end`, in ascending key order.
    async fn range_before(&self, end: &[u8]) -> Result<Vec<KeyValuePair>>;

    /// The pair with the greatest key.
    async fn last(&self) -> Result<Option<KeyValuePair>>;
}

/// A set of named collections.
pub trait Store: Send + Sync {
    fn collection(&self, name: &str) -> Result<Arc<dyn KeyValueCollection>>;

    /// Flushes pending writes to durable storage.
    fn persist(&self) -> Result<()> {
        Ok(())
    }
}
