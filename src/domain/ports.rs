use crate::domain::model::{AccountIdentity, AccountSlot, CollectionPage, Credential};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

pub trait CredentialStore: Send + Sync {
    fn get(
        &self,
        slot: AccountSlot,
    ) -> impl std::future::Future<Output = Result<Option<Credential>>> + Send;
    fn set(&self, credential: Credential) -> impl std::future::Future<Output = Result<()>> + Send;
    fn clear(&self, slot: AccountSlot) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Decodes the expiry embedded in a credential.
pub trait CredentialValidityChecker: Send + Sync {
    fn expires_at(&self, slot: AccountSlot, token: &str) -> Result<DateTime<Utc>>;

    fn check(&self, credential: &Credential, now: DateTime<Utc>) -> Result<()> {
        let expiry = self.expires_at(credential.slot, &credential.token)?;
        if now < expiry {
            Ok(())
        } else {
            Err(SyncError::CredentialInvalid {
                slot: credential.slot,
                reason: "Token expired".to_string(),
            })
        }
    }
}

#[async_trait]
pub trait SubscriptionApi: Send + Sync {
    async fn fetch_page(
        &self,
        token: &str,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<CollectionPage>;

    async fn subscribe(&self, token: &str, name: &str) -> Result<()>;

    async fn fetch_identity(&self, token: &str) -> Result<AccountIdentity>;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn site_url(&self) -> &str;
    fn user_agent(&self) -> &str;
    fn page_size(&self) -> usize;
    fn request_timeout(&self) -> Option<Duration>;
    fn write_spacing(&self) -> Duration;
    fn credentials_path(&self) -> &str;
}
