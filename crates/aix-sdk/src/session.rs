//! Session provider
//!
//! Holds the current identity as an explicit `Option` and notifies
//! subscribers whenever it changes.

use crate::error::{Result, SdkError};
use aix_store_client::{AuthSession, StoreClient};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// The signed-in user as seen by the portal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    /// Name shown next to comments
    pub display_name: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            email: None,
        }
    }
}

impl From<&AuthSession> for Identity {
    fn from(session: &AuthSession) -> Self {
        Self {
            user_id: session.user.id.clone(),
            display_name: session.user.display_name(),
            email: session.user.email.clone(),
        }
    }
}

/// Supplies the current identity (or none) and broadcasts changes
#[derive(Debug)]
pub struct SessionProvider {
    tx: watch::Sender<Option<Identity>>,
}

impl Default for SessionProvider {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl SessionProvider {
    /// Provider with nobody signed in
    pub fn anonymous() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Provider already holding an identity
    pub fn signed_in(identity: Identity) -> Self {
        let (tx, _rx) = watch::channel(Some(identity));
        Self { tx }
    }

    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// The current identity, or [`SdkError::AuthRequired`]
    pub fn require(&self) -> Result<Identity> {
        self.current().ok_or(SdkError::AuthRequired)
    }

    /// Replace the identity; subscribers see the change
    pub fn set(&self, identity: Option<Identity>) {
        let changed = *self.tx.borrow() != identity;
        if changed {
            tracing::debug!(
                user_id = identity.as_ref().map(|i| i.user_id.as_str()).unwrap_or("-"),
                "Session changed"
            );
            self.tx.send_replace(identity);
        }
    }

    /// Receive identity changes
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }

    /// Sign in against the auth service and adopt the resulting identity
    pub async fn sign_in(
        &self,
        client: &StoreClient,
        email: &str,
        password: &str,
    ) -> Result<Identity> {
        let session = client.sign_in_with_password(email, password).await?;
        let identity = Identity::from(&session);
        self.set(Some(identity.clone()));
        Ok(identity)
    }

    /// Drop the identity locally, then revoke the remote session
    pub async fn sign_out(&self, client: &StoreClient) -> Result<()> {
        self.set(None);
        client.sign_out().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_without_identity() {
        let session = SessionProvider::anonymous();
        assert!(matches!(session.require(), Err(SdkError::AuthRequired)));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let session = SessionProvider::anonymous();
        let mut rx = session.subscribe();

        session.set(Some(Identity::new("u-1", "Rina")));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|i| i.display_name.clone()), Some("Rina".into()));

        session.set(None);
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
        assert!(!session.is_authenticated());
    }
}
