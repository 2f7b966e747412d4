//! Rust client for the 1AIX hosted table store
//!
//! Covers the REST table API (select / insert / update / upsert / delete with
//! filter, order and limit) and the password auth endpoints.
//!
//! # Example
//!
//! ```rust,no_run
//! use aix_store_client::{Query, RemoteStore, StoreClient, StoreConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = StoreClient::new(StoreConfig {
//!     base_url: "https://project.example.co".into(),
//!     anon_key: Some("public-anon-key".into()),
//!     ..Default::default()
//! })?;
//!
//! // Sign in so writes carry the user's token
//! client.sign_in_with_password("editor@1aix.id", "secret").await?;
//!
//! // Top-level comments of an article, oldest first
//! let comments = client
//!     .select(
//!         "comments",
//!         &Query::new().eq("target_id", "a-42").is_null("parent_id").order_asc("created_at"),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod memory;
pub mod query;
pub mod store;
pub mod types;

// Re-export main types
pub use client::StoreClient;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use query::{Filter, FilterOp, Order, Query};
pub use store::{RemoteStore, RemoteStoreExt};
pub use types::*;
