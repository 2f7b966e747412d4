//! Table-level CRUD abstraction over the hosted store

use crate::error::Result;
use crate::query::Query;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Table-level CRUD against a relational store.
///
/// Rows travel as JSON objects. [`StoreClient`](crate::StoreClient) talks to
/// the hosted service; [`MemoryStore`](crate::MemoryStore) keeps rows in
/// process.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Rows of `table` matching `query`, in the query's order
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>>;

    /// Insert one row and return it as stored (with generated columns)
    async fn insert(&self, table: &str, record: Value) -> Result<Value>;

    /// Patch every row matching `matching`; returns the updated rows
    async fn update(&self, table: &str, patch: Value, matching: &Query) -> Result<Vec<Value>>;

    /// Insert, or merge into the row whose `conflict_key` column matches
    async fn upsert(&self, table: &str, record: Value, conflict_key: &str) -> Result<Value>;

    /// Delete every row matching `matching`; returns how many went away
    async fn delete(&self, table: &str, matching: &Query) -> Result<usize>;
}

/// Typed helpers on top of [`RemoteStore`]
#[async_trait]
pub trait RemoteStoreExt: RemoteStore {
    async fn select_as<T>(&self, table: &str, query: &Query) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        let rows = self.select(table, query).await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(Into::into))
            .collect()
    }

    async fn insert_as<T, R>(&self, table: &str, record: &R) -> Result<T>
    where
        T: DeserializeOwned + Send,
        R: Serialize + Sync,
    {
        let row = self.insert(table, serde_json::to_value(record)?).await?;
        Ok(serde_json::from_value(row)?)
    }
}

impl<S: RemoteStore + ?Sized> RemoteStoreExt for S {}
