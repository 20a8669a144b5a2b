pub mod accounts;
pub mod collation;
pub mod engine;
pub mod fetcher;
pub mod orchestrator;
pub mod selection;

pub use crate::domain::model::{
    AccountIdentity, AccountSlot, AccountStatus, Collection, CollectionItem, CollectionPage,
    Credential,
};
pub use crate::domain::ports::{
    ConfigProvider, CredentialStore, CredentialValidityChecker, SubscriptionApi,
};
pub use crate::utils::error::Result;
