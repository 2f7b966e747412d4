//! Like/dislike voting
//!
//! Each device keeps a ledger of its own verdicts (at most one per target)
//! in local storage, while the shared like/dislike counters live in the
//! remote store. A toggle updates both: the local side immediately, the
//! remote side through the [`SyncQueue`].

use crate::error::Result;
use crate::local::LocalStorage;
use crate::session::SessionProvider;
use crate::sync::{SyncQueue, SyncReport, SyncStatus, SyncWrite};
use aix_store_client::{Query, RemoteStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Local storage key holding the serialized ledger
pub const LEDGER_KEY: &str = "1aix_votes";

/// A device's recorded choice for one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Like,
    Dislike,
}

/// Shared counters for one target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteAggregate {
    pub likes: u64,
    pub dislikes: u64,
}

impl VoteAggregate {
    pub fn new(likes: u64, dislikes: u64) -> Self {
        Self { likes, dislikes }
    }

    fn counter(&mut self, verdict: Verdict) -> &mut u64 {
        match verdict {
            Verdict::Like => &mut self.likes,
            Verdict::Dislike => &mut self.dislikes,
        }
    }

    fn increment(&mut self, verdict: Verdict) {
        *self.counter(verdict) += 1;
    }

    /// Floored at zero
    fn decrement(&mut self, verdict: Verdict) {
        let counter = self.counter(verdict);
        *counter = counter.saturating_sub(1);
    }

    fn from_row(row: &serde_json::Value) -> Self {
        let count = |name: &str| {
            row.get(name)
                .and_then(|v| v.as_u64().or_else(|| v.as_i64().map(|n| n.max(0) as u64)))
                .unwrap_or(0)
        };
        Self::new(count("likes"), count("dislikes"))
    }
}

/// Per-device verdicts, keyed by target id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteLedger(BTreeMap<String, Verdict>);

impl VoteLedger {
    pub fn get(&self, target_id: &str) -> Option<Verdict> {
        self.0.get(target_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn set(&mut self, target_id: &str, verdict: Option<Verdict>) {
        match verdict {
            Some(v) => {
                self.0.insert(target_id.to_string(), v);
            }
            None => {
                self.0.remove(target_id);
            }
        }
    }

    /// Load from local storage; unreadable data counts as an empty ledger
    pub fn load(storage: &dyn LocalStorage) -> Result<Self> {
        let Some(raw) = storage.get(LEDGER_KEY)? else {
            return Ok(Self::default());
        };
        match serde_json::from_str(&raw) {
            Ok(ledger) => Ok(ledger),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable vote ledger");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, storage: &dyn LocalStorage) -> Result<()> {
        storage.set(LEDGER_KEY, &serde_json::to_string(self)?)
    }
}

/// Apply one toggle to a prior verdict and aggregate.
///
/// Same verdict again retracts it; a different verdict switches; no prior
/// verdict records a new one. Returns the new verdict and counters.
pub fn toggle(
    prior: Option<Verdict>,
    requested: Verdict,
    mut aggregate: VoteAggregate,
) -> (Option<Verdict>, VoteAggregate) {
    match prior {
        Some(previous) if previous == requested => {
            aggregate.decrement(requested);
            (None, aggregate)
        }
        Some(previous) => {
            aggregate.decrement(previous);
            aggregate.increment(requested);
            (Some(requested), aggregate)
        }
        None => {
            aggregate.increment(requested);
            (Some(requested), aggregate)
        }
    }
}

/// Where aggregates live in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTable {
    pub table: String,
    pub key_column: String,
}

impl Default for VoteTable {
    fn default() -> Self {
        Self {
            table: "product_votes".to_string(),
            key_column: "target_id".to_string(),
        }
    }
}

/// Result of [`VoteReconciler::toggle_vote`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// This device's verdict after the toggle
    pub verdict: Option<Verdict>,
    /// Counters shown to the user
    pub aggregate: VoteAggregate,
    /// Whether the remote store has the new counters
    pub sync: SyncStatus,
}

/// Merges the local ledger with the shared aggregates
pub struct VoteReconciler {
    store: Arc<dyn RemoteStore>,
    storage: Arc<dyn LocalStorage>,
    table: VoteTable,
    ledger: VoteLedger,
    aggregates: HashMap<String, VoteAggregate>,
    queue: SyncQueue,
}

impl VoteReconciler {
    /// Create a reconciler, loading this device's ledger from `storage`
    pub fn new(
        store: Arc<dyn RemoteStore>,
        storage: Arc<dyn LocalStorage>,
        table: VoteTable,
    ) -> Result<Self> {
        let ledger = VoteLedger::load(storage.as_ref())?;
        Ok(Self {
            store,
            storage,
            table,
            ledger,
            aggregates: HashMap::new(),
            queue: SyncQueue::new(),
        })
    }

    pub fn ledger(&self) -> &VoteLedger {
        &self.ledger
    }

    pub fn verdict(&self, target_id: &str) -> Option<Verdict> {
        self.ledger.get(target_id)
    }

    /// Counters as currently shown, `{0, 0}` if never loaded
    pub fn aggregate(&self, target_id: &str) -> VoteAggregate {
        self.aggregates.get(target_id).copied().unwrap_or_default()
    }

    /// Sync state of the latest counter write for a target
    pub fn sync_status(&self, target_id: &str) -> Option<&SyncStatus> {
        self.queue.status(&self.cache_key(target_id))
    }

    fn cache_key(&self, target_id: &str) -> String {
        format!("{}:{}", self.table.table, target_id)
    }

    /// Fetch shared counters for a target.
    ///
    /// Counters with an unconfirmed local write are left alone so a stale
    /// read cannot undo the user's own vote on screen.
    pub async fn load_aggregate(&mut self, target_id: &str) -> Result<VoteAggregate> {
        let unconfirmed = matches!(
            self.sync_status(target_id),
            Some(SyncStatus::Pending) | Some(SyncStatus::Failed(_))
        );
        if unconfirmed {
            return Ok(self.aggregate(target_id));
        }

        let query = Query::new()
            .eq(self.table.key_column.as_str(), target_id)
            .limit(1);
        let rows = self.store.select(&self.table.table, &query).await?;

        let aggregate = rows
            .first()
            .map(VoteAggregate::from_row)
            .unwrap_or_default();
        self.aggregates.insert(target_id.to_string(), aggregate);
        Ok(aggregate)
    }

    /// Toggle this device's verdict on a target.
    ///
    /// Needs a signed-in user; without one nothing is changed. Counters
    /// never fetched for this target are loaded first, so the toggle applies
    /// to the shared values rather than to zero. The new counters are
    /// applied locally and the ledger persisted before the
    /// remote upsert is attempted. A failed upsert does not roll anything
    /// back; it is reported through [`ToggleOutcome::sync`].
    pub async fn toggle_vote(
        &mut self,
        session: &SessionProvider,
        target_id: &str,
        verdict: Verdict,
    ) -> Result<ToggleOutcome> {
        session.require()?;

        let current = match self.aggregates.get(target_id) {
            Some(aggregate) => *aggregate,
            None => self.load_aggregate(target_id).await?,
        };

        let prior = self.ledger.get(target_id);
        let (next, aggregate) = toggle(prior, verdict, current);

        let mut ledger = self.ledger.clone();
        ledger.set(target_id, next);
        ledger.save(self.storage.as_ref())?;
        self.ledger = ledger;
        self.aggregates.insert(target_id.to_string(), aggregate);

        tracing::debug!(
            target_id,
            ?prior,
            ?next,
            likes = aggregate.likes,
            dislikes = aggregate.dislikes,
            "Vote toggled"
        );

        let mut row = serde_json::Map::new();
        row.insert(self.table.key_column.clone(), target_id.into());
        row.insert("likes".to_string(), aggregate.likes.into());
        row.insert("dislikes".to_string(), aggregate.dislikes.into());

        let key = self.queue.queue(SyncWrite::new(
            self.table.table.as_str(),
            self.table.key_column.as_str(),
            target_id,
            serde_json::Value::Object(row),
        ));
        let sync = self
            .queue
            .flush_key(self.store.as_ref(), &key)
            .await
            .unwrap_or(SyncStatus::Pending);

        Ok(ToggleOutcome {
            verdict: next,
            aggregate,
            sync,
        })
    }

    /// Re-send every counter write that failed
    pub async fn retry_failed(&mut self) -> SyncReport {
        let requeued = self.queue.requeue_failed();
        if requeued > 0 {
            tracing::info!(count = requeued, "Retrying failed vote syncs");
        }
        self.queue.flush(self.store.as_ref()).await
    }
}
