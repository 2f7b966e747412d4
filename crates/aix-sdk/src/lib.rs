//! 1AIX SDK - client logic for the smartphone catalog and news portal
//!
//! The portal is a frontend over a hosted relational store. Most of it is
//! plain CRUD; this crate holds the pieces with state of their own:
//!
//! - **Votes**: per-device like/dislike ledger merged with shared counters,
//!   synced through an explicit queue with per-target status
//! - **Comments**: two-level threads and the posting flow
//! - **Catalog**: manual rank editing over a filtered view
//! - **Categories**, **routes**, **session**, **config**
//!
//! # Example
//!
//! ```rust,ignore
//! use aix_sdk::{CatalogFilter, Direction, Portal, PortalConfig};
//!
//! let portal = Portal::connect(PortalConfig::load("portal.toml")?.apply_env())?;
//!
//! // Move a Samsung phone up within the Samsung-only view, then save
//! let mut editor = portal.rank_editor();
//! editor.load().await?;
//! editor.set_filter(CatalogFilter { brand: Some("Samsung".into()), ..Default::default() });
//! editor.move_item(2, Direction::Up);
//! editor.commit_order().await?;
//! ```

// Remote/local reconciliation
pub mod sync;

// Portal state objects
pub mod catalog;
pub mod categories;
pub mod comments;
pub mod votes;

// Context
pub mod config;
pub mod local;
pub mod portal;
pub mod router;
pub mod session;
pub mod telemetry;

// Error types
pub mod error;

pub use catalog::{CatalogFilter, CatalogItem, Direction, RankEditor};
pub use categories::CategoryStore;
pub use comments::{build_threads, Comment, CommentBoard, CommentThread};
pub use config::PortalConfig;
pub use error::{Result, SdkError};
pub use local::{FileStorage, LocalStorage, MemoryStorage};
pub use portal::Portal;
pub use router::Route;
pub use session::{Identity, SessionProvider};
pub use sync::{SyncQueue, SyncReport, SyncStatus};
pub use votes::{ToggleOutcome, Verdict, VoteAggregate, VoteLedger, VoteReconciler};

// Re-export from the store client
pub use aix_store_client::{MemoryStore, Query, RemoteStore, StoreClient, StoreConfig};
