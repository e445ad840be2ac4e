use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use portal_core::error::StorageError;
use portal_core::repository::{ReadRepository, Repository, Result, UrlRecord};
use portal_core::ShortCode;

/// Process-local durable store, for tests and single-node trials.
///
/// Everything is lost on restart. Clones share one map. Inserts claim the
/// code through the map's entry API, so of two racing inserts of one code
/// exactly one wins.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<DashMap<String, UrlRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preallocates room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: Arc::new(DashMap::with_capacity(capacity)),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let found = self.storage.get(code.as_str()).map(|r| r.clone());
        Ok(found)
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, code: &ShortCode, record: UrlRecord) -> Result<()> {
        match self.storage.entry(code.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(code.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }
}
