//! Filter / order / limit queries in the REST dialect of the hosted store
//!
//! A [`Query`] is rendered to query-string pairs such as
//! `target_id=eq.abc&order=created_at.asc&limit=20`.

use serde_json::Value;

/// Comparison operator for a column filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(Value),
    Neq(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    /// Case-insensitive pattern, `*` matches any run of characters
    ILike(String),
    IsNull,
    NotNull,
    In(Vec<Value>),
}

/// A single column filter
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
}

impl Filter {
    fn render(&self) -> String {
        match &self.op {
            FilterOp::Eq(v) => format!("eq.{}", scalar(v)),
            FilterOp::Neq(v) => format!("neq.{}", scalar(v)),
            FilterOp::Gt(v) => format!("gt.{}", scalar(v)),
            FilterOp::Gte(v) => format!("gte.{}", scalar(v)),
            FilterOp::Lt(v) => format!("lt.{}", scalar(v)),
            FilterOp::Lte(v) => format!("lte.{}", scalar(v)),
            FilterOp::ILike(p) => format!("ilike.{}", p),
            FilterOp::IsNull => "is.null".to_string(),
            FilterOp::NotNull => "not.is.null".to_string(),
            FilterOp::In(values) => {
                let items: Vec<String> = values.iter().map(list_item).collect();
                format!("in.({})", items.join(","))
            }
        }
    }
}

/// Sort key
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

/// Select/match query for one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub columns: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned columns (`select=`)
    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    pub fn filter(mut self, column: impl Into<String>, op: FilterOp) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            op,
        });
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Eq(value.into()))
    }

    pub fn is_null(self, column: impl Into<String>) -> Self {
        self.filter(column, FilterOp::IsNull)
    }

    pub fn ilike(self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filter(column, FilterOp::ILike(pattern.into()))
    }

    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order.push(Order {
            column: column.into(),
            descending: false,
        });
        self
    }

    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order.push(Order {
            column: column.into(),
            descending: true,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render as query-string pairs, unencoded
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(ref columns) = self.columns {
            params.push(("select".to_string(), columns.clone()));
        }
        for filter in &self.filters {
            params.push((filter.column.clone(), filter.render()));
        }
        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, if o.descending { "desc" } else { "asc" }))
                .collect();
            params.push(("order".to_string(), order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Render as an encoded query string (without the leading `?`)
    pub fn to_query_string(&self) -> String {
        self.to_params()
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn list_item(value: &Value) -> String {
    let raw = scalar(value);
    if raw.contains([',', '(', ')', '"']) {
        format!("\"{}\"", raw.replace('"', "\\\""))
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_rendering() {
        let query = Query::new()
            .eq("target_id", "a1")
            .is_null("parent_id")
            .order_asc("created_at")
            .limit(20);

        assert_eq!(
            query.to_params(),
            vec![
                ("target_id".to_string(), "eq.a1".to_string()),
                ("parent_id".to_string(), "is.null".to_string()),
                ("order".to_string(), "created_at.asc".to_string()),
                ("limit".to_string(), "20".to_string()),
            ]
        );
    }

    #[test]
    fn test_multi_order_and_in() {
        let query = Query::new()
            .filter("brand", FilterOp::In(vec![json!("Samsung"), json!("Infinix, Inc")]))
            .order_desc("order_rank")
            .order_desc("created_at");

        let params = query.to_params();
        assert_eq!(params[0].1, "in.(Samsung,\"Infinix, Inc\")");
        assert_eq!(params[1].1, "order_rank.desc,created_at.desc");
    }

    #[test]
    fn test_query_string_encoding() {
        let query = Query::new().ilike("name", "*galaxy s*");
        assert_eq!(query.to_query_string(), "name=ilike.%2Agalaxy%20s%2A");
    }
}
