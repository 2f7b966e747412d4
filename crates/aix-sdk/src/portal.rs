//! Wiring of store, local storage and session for one portal instance

use crate::catalog::RankEditor;
use crate::categories::CategoryStore;
use crate::comments::CommentBoard;
use crate::config::PortalConfig;
use crate::error::Result;
use crate::local::{FileStorage, LocalStorage};
use crate::session::{Identity, SessionProvider};
use crate::votes::VoteReconciler;
use aix_store_client::{RemoteStore, StoreClient};
use std::sync::Arc;

/// Explicit context handed to the portal's state objects
///
/// # Example
///
/// ```rust,no_run
/// use aix_sdk::{Portal, PortalConfig, Verdict};
///
/// # async fn example() -> aix_sdk::Result<()> {
/// let portal = Portal::connect(PortalConfig::default().apply_env())?;
/// portal.sign_in("rina@1aix.id", "rahasia").await?;
///
/// let mut votes = portal.votes()?;
/// votes.load_aggregate("galaxy-a55").await?;
/// let outcome = votes.toggle_vote(portal.session(), "galaxy-a55", Verdict::Like).await?;
/// println!("{} likes", outcome.aggregate.likes);
/// # Ok(())
/// # }
/// ```
pub struct Portal {
    config: PortalConfig,
    client: Option<Arc<StoreClient>>,
    store: Arc<dyn RemoteStore>,
    storage: Arc<dyn LocalStorage>,
    session: SessionProvider,
}

impl Portal {
    /// Connect to the hosted store and open device storage in `data_dir`
    pub fn connect(config: PortalConfig) -> Result<Self> {
        let client = Arc::new(StoreClient::new(config.store.clone())?);
        let storage = Arc::new(FileStorage::open(config.local_storage_path())?);
        tracing::info!(
            base_url = %config.store.base_url,
            data_dir = %config.data_dir.display(),
            "Portal connected"
        );

        Ok(Self {
            config,
            store: client.clone(),
            client: Some(client),
            storage,
            session: SessionProvider::anonymous(),
        })
    }

    /// Build a portal over arbitrary backends, e.g. in-memory ones
    pub fn with_backends(
        config: PortalConfig,
        store: Arc<dyn RemoteStore>,
        storage: Arc<dyn LocalStorage>,
    ) -> Self {
        Self {
            config,
            client: None,
            store,
            storage,
            session: SessionProvider::anonymous(),
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionProvider {
        &self.session
    }

    pub fn store(&self) -> Arc<dyn RemoteStore> {
        Arc::clone(&self.store)
    }

    pub fn storage(&self) -> Arc<dyn LocalStorage> {
        Arc::clone(&self.storage)
    }

    /// Sign in through the hosted auth service
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        match &self.client {
            Some(client) => self.session.sign_in(client, email, password).await,
            None => Err(crate::error::SdkError::Config(
                "sign-in needs a hosted store connection".to_string(),
            )),
        }
    }

    pub async fn sign_out(&self) -> Result<()> {
        match &self.client {
            Some(client) => self.session.sign_out(client).await,
            None => {
                self.session.set(None);
                Ok(())
            }
        }
    }

    pub fn votes(&self) -> Result<VoteReconciler> {
        VoteReconciler::new(self.store(), self.storage(), self.config.vote_table())
    }

    pub fn comment_board(&self, target_id: impl Into<String>) -> CommentBoard {
        CommentBoard::new(self.store(), self.config.comment_table.clone(), target_id)
    }

    pub fn rank_editor(&self) -> RankEditor {
        RankEditor::new(self.store(), self.config.catalog_table.clone())
    }

    pub fn categories(&self) -> Result<CategoryStore> {
        CategoryStore::load(self.storage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::MemoryStorage;
    use crate::votes::Verdict;
    use aix_store_client::MemoryStore;

    fn offline() -> Portal {
        Portal::with_backends(
            PortalConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStorage::new()),
        )
    }

    #[tokio::test]
    async fn test_offline_portal_shares_device_storage() {
        let portal = offline();
        portal.session().set(Some(Identity::new("u-1", "Rina")));

        let mut votes = portal.votes().unwrap();
        votes
            .toggle_vote(portal.session(), "p-1", Verdict::Like)
            .await
            .unwrap();

        // A fresh reconciler reads the same ledger
        assert_eq!(portal.votes().unwrap().verdict("p-1"), Some(Verdict::Like));
        assert_eq!(portal.categories().unwrap().list().len(), 5);
        assert_eq!(portal.comment_board("p-1").target_id(), "p-1");
    }

    #[tokio::test]
    async fn test_offline_sign_in_is_a_config_error() {
        let portal = offline();
        let err = portal.sign_in("rina@1aix.id", "rahasia").await.unwrap_err();
        assert!(matches!(err, crate::error::SdkError::Config(_)));

        portal.session().set(Some(Identity::new("u-1", "Rina")));
        portal.sign_out().await.unwrap();
        assert!(!portal.session().is_authenticated());
    }
}
