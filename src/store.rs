use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::StoreError;
use crate::models::CounterRecord;

mod sqlite;
pub use sqlite::SqliteStore;

// identity -> record mapping; last save wins, no compare-and-swap
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn find(&self, identity: &str) -> Result<Option<CounterRecord>, StoreError>;

    // Conflict when the identity already exists
    async fn insert(&self, record: &CounterRecord) -> Result<(), StoreError>;

    // whole-record upsert
    async fn save(&self, record: &CounterRecord) -> Result<(), StoreError>;
}

#[derive(Debug)]
pub struct Loaded {
    pub record: CounterRecord,
    pub created: bool,
}

// On a duplicate-key conflict another request created it first, so re-fetch
pub async fn load_or_create(
    store: &dyn CounterStore,
    identity: &str,
    now: DateTime<Utc>,
) -> Result<Loaded, StoreError> {
    if let Some(record) = store.find(identity).await? {
        return Ok(Loaded { record, created: false });
    }

    let fresh = CounterRecord::new(identity, now);
    match store.insert(&fresh).await {
        Ok(()) => {
            tracing::debug!(identity, "created counter");
            Ok(Loaded { record: fresh, created: true })
        }
        Err(StoreError::Conflict(_)) => {
            tracing::debug!(identity, "lost creation race, re-fetching");
            let record = store.find(identity).await?.ok_or_else(|| {
                StoreError::Unavailable(format!("{identity} conflicted on insert but is missing"))
            })?;
            Ok(Loaded { record, created: false })
        }
        Err(err) => Err(err),
    }
}

// In-process store, lives as long as the server does
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, CounterRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn find(&self, identity: &str) -> Result<Option<CounterRecord>, StoreError> {
        Ok(self.records.get(identity).map(|entry| entry.clone()))
    }

    async fn insert(&self, record: &CounterRecord) -> Result<(), StoreError> {
        match self.records.entry(record.identity.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(record.identity.clone())),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn save(&self, record: &CounterRecord) -> Result<(), StoreError> {
        self.records.insert(record.identity.clone(), record.clone());
        Ok(())
    }
}
