//! Sync queue with per-write confirmation status
//!
//! - Deduplicates writes to the same row (last-write-wins)
//! - Tracks `Pending` / `Confirmed` / `Failed` per row
//! - Keeps failed writes around until the user retries them

use aix_store_client::RemoteStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One upsert waiting to reach the remote store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncWrite {
    /// Target table
    pub table: String,
    /// Conflict column the upsert merges on
    pub key_column: String,
    /// Value of `key_column` for this row
    pub key: String,
    /// Full row to upsert (JSON)
    pub data: serde_json::Value,
    /// Timestamp when queued (ms since epoch)
    pub queued_at: i64,
}

impl SyncWrite {
    pub fn new(
        table: impl Into<String>,
        key_column: impl Into<String>,
        key: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            table: table.into(),
            key_column: key_column.into(),
            key: key.into(),
            data,
            queued_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Key used for deduplication
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.table, self.key)
    }
}

/// Confirmation state of the latest write for one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum SyncStatus {
    /// Applied locally, not yet acknowledged by the store
    Pending,
    /// The store accepted the latest write
    Confirmed,
    /// The store rejected the latest write; local state was kept
    Failed(String),
}

impl SyncStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, SyncStatus::Failed(_))
    }
}

/// Result of a flush
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Number of writes the store accepted
    pub succeeded: usize,
    /// Number of writes that failed
    pub failed: usize,
    /// `(cache_key, error)` for each failure
    pub errors: Vec<(String, String)>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Queue of optimistic writes awaiting confirmation
#[derive(Debug, Default)]
pub struct SyncQueue {
    /// Writes not yet attempted, by cache key
    pending: BTreeMap<String, SyncWrite>,
    /// Writes that failed, kept for manual retry
    failed: BTreeMap<String, SyncWrite>,
    status: HashMap<String, SyncStatus>,
}

impl SyncQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a write, replacing any unsent or failed write for the same row
    pub fn queue(&mut self, write: SyncWrite) -> String {
        let key = write.cache_key();
        self.failed.remove(&key);
        self.status.insert(key.clone(), SyncStatus::Pending);
        self.pending.insert(key.clone(), write);
        key
    }

    /// Status of the latest write for a cache key
    pub fn status(&self, cache_key: &str) -> Option<&SyncStatus> {
        self.status.get(cache_key)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Cache keys whose latest write failed
    pub fn failed_keys(&self) -> Vec<String> {
        self.failed.keys().cloned().collect()
    }

    /// Move every failed write back to pending
    pub fn requeue_failed(&mut self) -> usize {
        let failed = std::mem::take(&mut self.failed);
        let count = failed.len();
        for (key, write) in failed {
            self.status.insert(key.clone(), SyncStatus::Pending);
            self.pending.insert(key, write);
        }
        count
    }

    /// Send the pending write for one cache key, if any
    pub async fn flush_key(
        &mut self,
        store: &dyn RemoteStore,
        cache_key: &str,
    ) -> Option<SyncStatus> {
        let write = self.pending.remove(cache_key)?;
        Some(self.send(store, write).await)
    }

    /// Send every pending write, one at a time
    pub async fn flush(&mut self, store: &dyn RemoteStore) -> SyncReport {
        let mut report = SyncReport::default();
        let batch = std::mem::take(&mut self.pending);

        for (key, write) in batch {
            match self.send(store, write).await {
                SyncStatus::Failed(reason) => {
                    report.failed += 1;
                    report.errors.push((key, reason));
                }
                _ => report.succeeded += 1,
            }
        }

        report
    }

    async fn send(&mut self, store: &dyn RemoteStore, write: SyncWrite) -> SyncStatus {
        let key = write.cache_key();
        let status = match store
            .upsert(&write.table, write.data.clone(), &write.key_column)
            .await
        {
            Ok(_) => {
                tracing::debug!(%key, "Sync confirmed");
                SyncStatus::Confirmed
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "Sync failed, keeping local state");
                let status = SyncStatus::Failed(e.to_string());
                self.failed.insert(key.clone(), write);
                status
            }
        };
        self.status.insert(key, status.clone());
        status
    }
}
