use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::SlotRecord;

#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub records: Vec<SlotRecord>,
    pub version: u64,
    pub stale: bool,
}

#[derive(Debug, Default)]
struct StoreState {
    records: Vec<SlotRecord>,
    version: u64,
    stale: bool,
}

/// In-memory slot set shared by the conflict detector, the generator and the
/// calendar projection.
///
/// Every write takes the lock once for the whole batch, so a reader sees
/// either none or all of a batch.
#[derive(Debug, Clone, Default)]
pub struct SlotStore {
    state: Arc<RwLock<StoreState>>,
}

impl SlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<SlotRecord>) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState {
                records,
                version: 1,
                stale: false,
            })),
        }
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read().await;
        StoreSnapshot {
            records: state.records.clone(),
            version: state.version,
            stale: state.stale,
        }
    }

    pub async fn records(&self) -> Vec<SlotRecord> {
        self.state.read().await.records.clone()
    }

    pub async fn get(&self, id: &str) -> Option<SlotRecord> {
        self.state.read().await.records.iter().find(|r| r.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }

    /// Replace-or-append by id, in one write.
    pub async fn merge_batch(&self, batch: Vec<SlotRecord>) {
        if batch.is_empty() {
            return;
        }
        let mut state = self.state.write().await;
        let count = batch.len();
        for record in batch {
            match state.records.iter_mut().find(|existing| existing.id == record.id) {
                Some(existing) => *existing = record,
                None => state.records.push(record),
            }
        }
        state.version += 1;
        debug!("Merged {} slot records (store version {})", count, state.version);
    }

    /// Drops `removed_ids` and merges `batch` under the same write lock.
    pub async fn apply_replace(&self, removed_ids: &[String], batch: Vec<SlotRecord>) {
        let mut state = self.state.write().await;
        state.records.retain(|record| !removed_ids.contains(&record.id));
        for record in batch {
            match state.records.iter_mut().find(|existing| existing.id == record.id) {
                Some(existing) => *existing = record,
                None => state.records.push(record),
            }
        }
        state.version += 1;
    }

    pub async fn remove(&self, id: &str) -> Option<SlotRecord> {
        let mut state = self.state.write().await;
        let position = state.records.iter().position(|record| record.id == id)?;
        let removed = state.records.remove(position);
        state.version += 1;
        Some(removed)
    }

    /// Full refresh from the boundary. Clears the stale flag.
    pub async fn replace_all(&self, records: Vec<SlotRecord>) {
        let mut state = self.state.write().await;
        state.records = records;
        state.stale = false;
        state.version += 1;
        debug!("Slot store reloaded with {} records (version {})", state.records.len(), state.version);
    }

    pub async fn mark_stale(&self, reason: &str) {
        let mut state = self.state.write().await;
        if !state.stale {
            warn!("Slot store marked stale: {}", reason);
        }
        state.stale = true;
    }

    pub async fn is_stale(&self) -> bool {
        self.state.read().await.stale
    }

    pub async fn version(&self) -> u64 {
        self.state.read().await.version
    }
}
