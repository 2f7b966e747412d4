//! Catalog rank editing
//!
//! The back office reorders smartphones by hand. Moves happen in memory on
//! whatever subset the filter shows, and are written back as `order_rank`
//! values only when the editor commits.

use crate::error::{Result, SdkError};
use aix_store_client::{Query, RemoteStore, RemoteStoreExt};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// A catalog entry; columns the editor does not use ride along in `extra`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brand: String,
    /// Higher sorts first
    #[serde(default, deserialize_with = "null_as_default")]
    pub order_rank: i64,
    /// RFC 3339 creation time, newer sorts first among equal ranks
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Display order: rank descending, then newest first
pub fn rank_order(a: &CatalogItem, b: &CatalogItem) -> Ordering {
    b.order_rank
        .cmp(&a.order_rank)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

pub fn sort_by_rank(items: &mut [CatalogItem]) {
    items.sort_by(rank_order);
}

/// Narrowing applied to the visible list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    /// Case-insensitive substring of name or brand
    pub search: Option<String>,
    /// Case-insensitive brand name
    pub brand: Option<String>,
}

impl CatalogFilter {
    pub fn is_empty(&self) -> bool {
        self.search.as_deref().map_or(true, |s| s.trim().is_empty())
            && self.brand.as_deref().map_or(true, |b| b.trim().is_empty())
    }

    pub fn matches(&self, item: &CatalogItem) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => {
                let needle = s.to_lowercase();
                item.name.to_lowercase().contains(&needle)
                    || item.brand.to_lowercase().contains(&needle)
            }
            _ => true,
        };
        let brand_ok = match self.brand.as_deref().map(str::trim) {
            Some(b) if !b.is_empty() => item.brand.eq_ignore_ascii_case(b),
            _ => true,
        };
        search_ok && brand_ok
    }
}

/// Direction of a single-step move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// In-memory ordering of the full catalog with a filtered view on top
pub struct RankEditor {
    store: Arc<dyn RemoteStore>,
    table: String,
    items: Vec<CatalogItem>,
    filter: CatalogFilter,
    dirty: bool,
}

impl RankEditor {
    pub fn new(store: Arc<dyn RemoteStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
            items: Vec::new(),
            filter: CatalogFilter::default(),
            dirty: false,
        }
    }

    /// Replace the collection, e.g. with rows fetched elsewhere
    pub fn with_items(mut self, mut items: Vec<CatalogItem>) -> Self {
        sort_by_rank(&mut items);
        self.items = items;
        self.dirty = false;
        self
    }

    /// Full collection in its current in-memory order
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// There are moves not yet committed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn filter(&self) -> &CatalogFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: CatalogFilter) {
        self.filter = filter;
    }

    /// Items passing the filter, in collection order
    pub fn visible(&self) -> Vec<&CatalogItem> {
        self.items
            .iter()
            .filter(|item| self.filter.matches(item))
            .collect()
    }

    /// Fetch the catalog in display order, discarding uncommitted moves
    pub async fn load(&mut self) -> Result<&[CatalogItem]> {
        let query = Query::new()
            .order_desc("order_rank")
            .order_desc("created_at");
        self.items = self.store.select_as::<CatalogItem>(&self.table, &query).await?;
        self.dirty = false;
        tracing::debug!(count = self.items.len(), "Catalog loaded");
        Ok(&self.items)
    }

    /// Swap the visible item at `index` with its visible neighbour.
    ///
    /// The swap is applied to the full collection, located by id, so items
    /// hidden by the filter keep their positions. Returns `false` without
    /// changing anything when there is no neighbour in that direction.
    pub fn move_item(&mut self, index: usize, direction: Direction) -> bool {
        let visible = self.visible();
        let neighbour = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => index.checked_add(1),
        };
        let other = neighbour.and_then(|n| visible.get(n));
        let (Some(current), Some(other)) = (visible.get(index), other) else {
            return false;
        };
        let (current_id, other_id) = (current.id.clone(), other.id.clone());

        let position = |id: &str| self.items.iter().position(|item| item.id == id);
        let (Some(a), Some(b)) = (position(&current_id), position(&other_id)) else {
            return false;
        };

        self.items.swap(a, b);
        self.dirty = true;
        true
    }

    /// Write `order_rank = N - i` for every item in the current order.
    ///
    /// Writes go out concurrently and independently; there is no
    /// transaction. Items whose write succeeded take their new rank in
    /// memory. If any write fails the editor stays dirty and the error names
    /// the items that were not saved.
    pub async fn commit_order(&mut self) -> Result<usize> {
        let total = self.items.len();

        let writes = self.items.iter().enumerate().map(|(i, item)| {
            let store = Arc::clone(&self.store);
            let table = self.table.clone();
            let id = item.id.clone();
            let rank = (total - i) as i64;
            async move {
                let matching = Query::new().eq("id", id.as_str());
                let result = store
                    .update(&table, serde_json::json!({ "order_rank": rank }), &matching)
                    .await;
                (id, rank, result)
            }
        });
        let results = join_all(writes).await;

        let mut failed = Vec::new();
        let mut first_error = None;
        for (id, rank, result) in results {
            let outcome = match result {
                Ok(rows) if rows.is_empty() => Err(format!("{} no longer exists", id)),
                Ok(_) => Ok(()),
                Err(e) => Err(e.to_string()),
            };
            match outcome {
                Ok(()) => {
                    if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
                        item.order_rank = rank;
                    }
                }
                Err(message) => {
                    first_error.get_or_insert(message);
                    failed.push(id);
                }
            }
        }

        if failed.is_empty() {
            self.dirty = false;
            tracing::info!(count = total, "Catalog order saved");
            return Ok(total);
        }

        let message = first_error.unwrap_or_default();
        tracing::error!(
            failed = failed.len(),
            total,
            error = %message,
            "Catalog order partially saved"
        );
        Err(SdkError::Commit {
            failed,
            total,
            message,
        })
    }
}
