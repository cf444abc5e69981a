use crate::core::store::{KeyValueCollection, KeyValuePair};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory collection backed by a BTreeMap, so scans come back in key order.
#[derive(Default)]
pub struct MemoryCollection {
    inner: Arc<Mutex<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueCollection for MemoryCollection {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let map = self.inner.lock().await;
        Ok(map.get(key).cloned())
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut map = self.inner.lock().await;
        debug!("Memory PUT for key: {:?}", String::from_utf8_lossy(key));
        map.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &[u8]) -> Result<()> {
        let mut map = self.inner.lock().await;
        map.remove(key);
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<KeyValuePair>> {
        let map = self.inner.lock().await;
        Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    async fn range_before(&self, end: &[u8]) -> Result<Vec<KeyValuePair>> {
        let map = self.inner.lock().await;
        Ok(map
            .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(end)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn last(&self) -> Result<Option<KeyValuePair>> {
        let map = self.inner.lock().await;
        Ok(map
            .last_key_value()
            .map(|(k, v)| (k.clone(), v.clone())))
    }
}
