//! Reconciliation of optimistic local state with the remote store
//!
//! Local mutations are applied first, then queued here as upserts. Each
//! queued write carries a visible status so callers can surface failed
//! syncs instead of losing them.

mod queue;

pub use queue::{SyncQueue, SyncReport, SyncStatus, SyncWrite};
