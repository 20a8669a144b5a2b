pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};
pub use config::SyncConfig;

pub use adapters::{FileCredentialStore, JwtExpiryChecker, MemoryCredentialStore, RedditApiClient};
pub use crate::core::{
    engine::{SyncEngine, SyncOutcome},
    orchestrator::{SyncJob, SyncOrchestrator, SyncPhase},
    selection::SelectionSet,
};
pub use utils::error::{Result, SyncError};
