//! In-process [`RemoteStore`] for tests and offline use
//!
//! Evaluates [`Query`] filters and ordering the way the hosted store does:
//! NULL sorts after every value, missing columns read as NULL.

use crate::error::{Result, StoreError};
use crate::query::{Filter, FilterOp, Query};
use crate::store::RemoteStore;
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<String, Vec<Value>>,
    next_id: u64,
    last_created: Option<DateTime<Utc>>,
    failures: Vec<FailureRule>,
    read_failures: Vec<String>,
    write_count: usize,
}

/// Injected write failure: every write to `table`, or only writes touching
/// the row whose `id` equals `row_id`
#[derive(Debug, Clone)]
struct FailureRule {
    table: String,
    row_id: Option<Value>,
}

/// Thread-safe in-memory table store
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table with rows, as-is
    pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner
                .rows
                .entry(table.to_string())
                .or_default()
                .extend(rows);
        }
        self
    }

    /// Snapshot of a table in insertion order
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.inner
            .lock()
            .map(|inner| inner.rows.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Make every write to `table` fail with a server error
    pub fn fail_writes(&self, table: &str) {
        self.push_failure(table, None);
    }

    /// Make writes touching the row with this `id` fail
    pub fn fail_row(&self, table: &str, row_id: impl Into<Value>) {
        self.push_failure(table, Some(row_id.into()));
    }

    /// Make every select on `table` fail with a server error
    pub fn fail_reads(&self, table: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.read_failures.push(table.to_string());
        }
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failures.clear();
            inner.read_failures.clear();
        }
    }

    /// Number of successful writes since creation
    pub fn write_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.write_count).unwrap_or(0)
    }

    fn push_failure(&self, table: &str, row_id: Option<Value>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failures.push(FailureRule {
                table: table.to_string(),
                row_id,
            });
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::InvalidResponse("memory store poisoned".to_string()))
    }
}

impl Tables {
    fn check_write(&self, table: &str, ids: &[&Value]) -> Result<()> {
        let blocked = self.failures.iter().any(|rule| {
            rule.table == table
                && match &rule.row_id {
                    None => true,
                    Some(id) => ids.iter().any(|candidate| *candidate == id),
                }
        });
        if blocked {
            return Err(StoreError::Server {
                status: 503,
                message: format!("injected failure writing {}", table),
            });
        }
        Ok(())
    }

    fn fill_generated(&mut self, table: &str, record: &mut Map<String, Value>) {
        if !record.contains_key("id") {
            self.next_id += 1;
            let id = format!("{}-{}", table, self.next_id);
            record.insert("id".to_string(), Value::String(id));
        }
        if !record.contains_key("created_at") {
            let mut now = Utc::now();
            if let Some(last) = self.last_created {
                if now <= last {
                    now = last + Duration::microseconds(1);
                }
            }
            self.last_created = Some(now);
            record.insert(
                "created_at".to_string(),
                Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true)),
            );
        }
    }
}

fn as_object(record: Value) -> Result<Map<String, Value>> {
    match record {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidResponse(format!(
            "expected a JSON object row, got {}",
            other
        ))),
    }
}

/// Eq-filter values on `id`, used to match injected row failures
fn id_filters(query: &Query) -> Vec<&Value> {
    query
        .filters
        .iter()
        .filter(|f| f.column == "id")
        .filter_map(|f| match &f.op {
            FilterOp::Eq(v) => Some(v),
            _ => None,
        })
        .collect()
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        let inner = self.lock()?;
        if inner.read_failures.iter().any(|t| t == table) {
            return Err(StoreError::Server {
                status: 503,
                message: format!("injected failure reading {}", table),
            });
        }
        let mut rows: Vec<Value> = inner
            .rows
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(query, row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        rows.sort_by(|a, b| {
            for order in &query.order {
                let ord = compare(field(a, &order.column), field(b, &order.column));
                let ord = if order.descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        if let Some(limit) = query.limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, record: Value) -> Result<Value> {
        let mut inner = self.lock()?;
        let mut record = as_object(record)?;
        let ids: Vec<&Value> = record.get("id").into_iter().collect();
        inner.check_write(table, &ids)?;
        inner.fill_generated(table, &mut record);

        let row = Value::Object(record);
        inner
            .rows
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        inner.write_count += 1;
        Ok(row)
    }

    async fn update(&self, table: &str, patch: Value, matching: &Query) -> Result<Vec<Value>> {
        let mut inner = self.lock()?;
        let patch = as_object(patch)?;
        inner.check_write(table, &id_filters(matching))?;

        let mut updated = Vec::new();
        if let Some(rows) = inner.rows.get_mut(table) {
            for row in rows.iter_mut().filter(|row| matches(matching, row)) {
                if let Value::Object(map) = row {
                    for (k, v) in &patch {
                        map.insert(k.clone(), v.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        inner.write_count += 1;
        Ok(updated)
    }

    async fn upsert(&self, table: &str, record: Value, conflict_key: &str) -> Result<Value> {
        let mut inner = self.lock()?;
        let record = as_object(record)?;
        let key = record.get(conflict_key).cloned().unwrap_or(Value::Null);
        let ids: Vec<&Value> = record.get("id").into_iter().collect();
        inner.check_write(table, &ids)?;

        let existing = inner.rows.get_mut(table).and_then(|rows| {
            rows.iter_mut()
                .find(|row| !key.is_null() && row.get(conflict_key) == Some(&key))
        });

        let row = match existing {
            Some(Value::Object(map)) => {
                for (k, v) in record {
                    map.insert(k, v);
                }
                Value::Object(map.clone())
            }
            _ => {
                let mut record = record;
                inner.fill_generated(table, &mut record);
                let row = Value::Object(record);
                inner
                    .rows
                    .entry(table.to_string())
                    .or_default()
                    .push(row.clone());
                row
            }
        };
        inner.write_count += 1;
        Ok(row)
    }

    async fn delete(&self, table: &str, matching: &Query) -> Result<usize> {
        let mut inner = self.lock()?;
        inner.check_write(table, &id_filters(matching))?;

        let removed = match inner.rows.get_mut(table) {
            Some(rows) => {
                let before = rows.len();
                rows.retain(|row| !matches(matching, row));
                before - rows.len()
            }
            None => 0,
        };
        inner.write_count += 1;
        Ok(removed)
    }
}

fn field<'a>(row: &'a Value, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&Value::Null)
}

fn matches(query: &Query, row: &Value) -> bool {
    query.filters.iter().all(|filter| matches_filter(filter, row))
}

fn matches_filter(filter: &Filter, row: &Value) -> bool {
    let value = field(row, &filter.column);
    match &filter.op {
        FilterOp::IsNull => value.is_null(),
        FilterOp::NotNull => !value.is_null(),
        // Comparisons against NULL are never true
        _ if value.is_null() => false,
        FilterOp::Eq(v) => compare(value, v) == Ordering::Equal,
        FilterOp::Neq(v) => compare(value, v) != Ordering::Equal,
        FilterOp::Gt(v) => compare(value, v) == Ordering::Greater,
        FilterOp::Gte(v) => compare(value, v) != Ordering::Less,
        FilterOp::Lt(v) => compare(value, v) == Ordering::Less,
        FilterOp::Lte(v) => compare(value, v) != Ordering::Greater,
        FilterOp::In(values) => values
            .iter()
            .any(|v| compare(value, v) == Ordering::Equal),
        FilterOp::ILike(pattern) => value
            .as_str()
            .map(|s| glob_match(&pattern.to_lowercase(), &s.to_lowercase()))
            .unwrap_or(false),
    }
}

/// Total order over JSON scalars; NULL is the greatest value
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        // Mixed types: compare textual forms, e.g. a numeric id filtered as text
        (x, y) => scalar_text(x).cmp(&scalar_text(y)),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `*` matches any run of characters; everything else is literal
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let mut rest = text;
    let first = parts[0];
    if !rest.starts_with(first) {
        return false;
    }
    rest = &rest[first.len()..];

    let last = parts[parts.len() - 1];
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn phones() -> MemoryStore {
        MemoryStore::new().with_rows(
            "smartphones",
            vec![
                json!({"id": "p1", "name": "Galaxy A55", "brand": "Samsung", "order_rank": 3}),
                json!({"id": "p2", "name": "Redmi Note 13", "brand": "Xiaomi", "order_rank": 5}),
                json!({"id": "p3", "name": "Galaxy S24", "brand": "Samsung", "order_rank": null}),
            ],
        )
    }

    #[tokio::test]
    async fn test_select_filter_and_order() {
        let store = phones();
        let rows = store
            .select(
                "smartphones",
                &Query::new().eq("brand", "Samsung").order_desc("order_rank"),
            )
            .await
            .unwrap();

        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        // NULL sorts first when descending
        assert_eq!(ids, vec!["p3", "p1"]);
    }

    #[tokio::test]
    async fn test_ilike_and_limit() {
        let store = phones();
        let rows = store
            .select("smartphones", &Query::new().ilike("name", "*GALAXY*").limit(1))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "p1");
    }

    #[tokio::test]
    async fn test_insert_generates_id_and_timestamp() {
        let store = MemoryStore::new();
        let first = store
            .insert("comments", json!({"text": "a"}))
            .await
            .unwrap();
        let second = store
            .insert("comments", json!({"text": "b"}))
            .await
            .unwrap();

        assert_eq!(first["id"], "comments-1");
        assert!(first["created_at"].as_str().unwrap() < second["created_at"].as_str().unwrap());
    }

    #[tokio::test]
    async fn test_upsert_merges_on_conflict_key() {
        let store = MemoryStore::new();
        store
            .upsert("votes", json!({"target_id": "a1", "likes": 1, "dislikes": 0}), "target_id")
            .await
            .unwrap();
        store
            .upsert("votes", json!({"target_id": "a1", "likes": 0, "dislikes": 1}), "target_id")
            .await
            .unwrap();

        let rows = store.rows("votes");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["dislikes"], 1);
        assert_eq!(rows[0]["likes"], 0);
    }

    #[tokio::test]
    async fn test_injected_row_failure() {
        let store = phones();
        store.fail_row("smartphones", "p2");

        let ok = store
            .update("smartphones", json!({"order_rank": 9}), &Query::new().eq("id", "p1"))
            .await;
        assert!(ok.is_ok());

        let err = store
            .update("smartphones", json!({"order_rank": 9}), &Query::new().eq("id", "p2"))
            .await;
        assert!(matches!(err, Err(StoreError::Server { status: 503, .. })));

        store.clear_failures();
        assert_eq!(
            store
                .delete("smartphones", &Query::new().eq("id", "p2"))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_injected_read_failure() {
        let store = phones();
        store.fail_reads("smartphones");
        assert!(store.select("smartphones", &Query::new()).await.is_err());

        store.clear_failures();
        assert_eq!(store.select("smartphones", &Query::new()).await.unwrap().len(), 3);
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("*note*", "redmi note 13"));
        assert!(glob_match("galaxy*", "galaxy s24"));
        assert!(!glob_match("galaxy*", "the galaxy"));
        assert!(glob_match("a*b*c", "a-b-c"));
        assert!(!glob_match("ab*ba", "aba"));
    }
}
