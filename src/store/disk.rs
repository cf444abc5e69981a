use crate::core::store::{KeyValueCollection, KeyValuePair};
use anyhow::Result;
use async_trait::async_trait;
use fjall::PartitionHandle;
use tracing::debug;

/// A collection stored in one fjall partition.
pub struct DiskCollection {
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn new(partition: PartitionHandle) -> Self {
        Self { partition }
    }
}

#[async_trait]
impl KeyValueCollection for DiskCollection {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.partition.get(key)?.map(|value| value.to_vec()))
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.partition.insert(key, value)?;
        debug!("Disk PUT for key: {:?}", String::from_utf8_lossy(key));
        Ok(())
    }

    async fn remove(&self, key: &[u8]) -> Result<()> {
        self.partition.remove(key)?;
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<KeyValuePair>> {
        let mut pairs = Vec::new();
        for item in self.partition.iter() {
            let (key, value) = item?;
            pairs.push((key.to_vec(), value.to_vec()));
        }
        Ok(pairs)
    }

    async fn range_before(&self, end: &[u8]) -> Result<Vec<KeyValuePair>> {
        let mut pairs = Vec::new();
        for item in self.partition.range(..end) {
            let (key, value) = item?;
            pairs.push((key.to_vec(), value.to_vec()));
        }
        Ok(pairs)
    }

    async fn last(&self) -> Result<Option<KeyValuePair>> {
        Ok(self
            .partition
            .last_key_value()?
            .map(|(key, value)| (key.to_vec(), value.to_vec())))
    }
}
