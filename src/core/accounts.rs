use crate::core::orchestrator::SyncCredentials;
use crate::core::{
    AccountIdentity, AccountSlot, AccountStatus, Credential, CredentialStore,
    CredentialValidityChecker, Result, SubscriptionApi,
};
use crate::utils::error::SyncError;
use chrono::Utc;
use std::sync::Arc;

/// Whether a sync can be started, and if not, why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncReadiness {
    Ready { count: usize },
    SourceNotConnected,
    TargetNotConnected,
    NothingSelected,
}

impl SyncReadiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, SyncReadiness::Ready { .. })
    }

    pub fn message(&self) -> String {
        match self {
            SyncReadiness::Ready { count } => format!(
                "Sync {} selected subreddit{} to target account",
                count,
                if *count == 1 { "" } else { "s" }
            ),
            SyncReadiness::SourceNotConnected => {
                "Connect a source account to enable syncing".to_string()
            }
            SyncReadiness::TargetNotConnected => {
                "Connect a target account to enable syncing".to_string()
            }
            SyncReadiness::NothingSelected => "Select at least one subreddit to sync".to_string(),
        }
    }

    /// Turns a not-ready state into the error the CLI exits with.
    pub fn into_result(self) -> Result<usize> {
        match self {
            SyncReadiness::Ready { count } => Ok(count),
            SyncReadiness::SourceNotConnected => Err(SyncError::MissingCredential {
                slot: AccountSlot::Source,
            }),
            SyncReadiness::TargetNotConnected => Err(SyncError::MissingCredential {
                slot: AccountSlot::Target,
            }),
            SyncReadiness::NothingSelected => Err(SyncError::EmptySelection),
        }
    }
}

/// Gatekeeper between the credential store and everything that talks to the API.
///
/// Expired or undecodable credentials are purged from the store as soon as
/// they are seen and never handed out.
pub struct AccountService<S, V, A>
where
    S: CredentialStore,
    V: CredentialValidityChecker,
    A: SubscriptionApi,
{
    store: S,
    checker: V,
    api: Arc<A>,
}

impl<S, V, A> AccountService<S, V, A>
where
    S: CredentialStore,
    V: CredentialValidityChecker,
    A: SubscriptionApi,
{
    pub fn new(store: S, checker: V, api: Arc<A>) -> Self {
        Self {
            store,
            checker,
            api,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a usable credential for `slot`.
    pub async fn load_credential(&self, slot: AccountSlot) -> Result<Credential> {
        let credential = self
            .store
            .get(slot)
            .await?
            .ok_or(SyncError::MissingCredential { slot })?;

        if let Err(e) = self.checker.check(&credential, Utc::now()) {
            tracing::warn!("🔑 Removing unusable {} credential: {}", slot, e);
            self.store.clear(slot).await?;
            return Err(e);
        }

        Ok(credential)
    }

    /// Verifies `token` against the API and stores it only if it works.
    pub async fn connect(&self, slot: AccountSlot, token: &str) -> Result<AccountIdentity> {
        let credential = Credential::new(slot, token.trim());
        self.checker.check(&credential, Utc::now())?;

        let identity = self.api.fetch_identity(&credential.token).await?;
        self.store.set(credential).await?;

        tracing::info!("🔗 {} account connected as {}", slot, identity.username);
        Ok(identity)
    }

    pub async fn disconnect(&self, slot: AccountSlot) -> Result<()> {
        self.store.clear(slot).await?;
        tracing::info!("🔌 {} account disconnected", slot);
        Ok(())
    }

    pub async fn status(&self, slot: AccountSlot) -> AccountStatus {
        let credential = match self.load_credential(slot).await {
            Ok(credential) => credential,
            Err(SyncError::CredentialInvalid { reason, .. }) => {
                return AccountStatus::NotConnected { reason };
            }
            Err(SyncError::MissingCredential { .. }) => {
                return AccountStatus::NotConnected {
                    reason: "No token stored".to_string(),
                };
            }
            Err(e) => {
                return AccountStatus::NotConnected {
                    reason: e.to_string(),
                };
            }
        };

        match self.api.fetch_identity(&credential.token).await {
            Ok(identity) => AccountStatus::Connected { identity },
            Err(e) => AccountStatus::NotConnected {
                reason: format!("Connection failed: {}", e.user_friendly_message()),
            },
        }
    }

    /// Loads both credentials; unusable ones come back as `None`.
    pub async fn sync_credentials(&self) -> Result<SyncCredentials> {
        Ok(SyncCredentials {
            source: self.usable(AccountSlot::Source).await?,
            target: self.usable(AccountSlot::Target).await?,
        })
    }

    /// Fails with `MissingCredential` unless both accounts hold usable
    /// credentials. Never touches the network.
    pub async fn require_connected(&self) -> Result<SyncCredentials> {
        let credentials = self.sync_credentials().await?;
        if credentials.source.is_none() {
            return Err(SyncError::MissingCredential {
                slot: AccountSlot::Source,
            });
        }
        if credentials.target.is_none() {
            return Err(SyncError::MissingCredential {
                slot: AccountSlot::Target,
            });
        }
        Ok(credentials)
    }

    pub async fn sync_readiness(&self, selected: usize) -> Result<SyncReadiness> {
        let credentials = self.sync_credentials().await?;

        Ok(if credentials.source.is_none() {
            SyncReadiness::SourceNotConnected
        } else if credentials.target.is_none() {
            SyncReadiness::TargetNotConnected
        } else if selected == 0 {
            SyncReadiness::NothingSelected
        } else {
            SyncReadiness::Ready { count: selected }
        })
    }

    async fn usable(&self, slot: AccountSlot) -> Result<Option<Credential>> {
        match self.load_credential(slot).await {
            Ok(credential) => Ok(Some(credential)),
            Err(SyncError::MissingCredential { .. }) | Err(SyncError::CredentialInvalid { .. }) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
