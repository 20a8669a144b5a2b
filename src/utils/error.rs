use crate::domain::model::AccountSlot;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Credential for {slot} account is invalid: {reason}")]
    CredentialInvalid { slot: AccountSlot, reason: String },

    #[error("No credential stored for {slot} account")]
    MissingCredential { slot: AccountSlot },

    #[error("No subscriptions selected for sync")]
    EmptySelection,

    #[error("Remote API returned HTTP {status}")]
    HttpError { status: u16 },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Precondition,
    Remote,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::CredentialInvalid { .. } | SyncError::MissingCredential { .. } => {
                ErrorCategory::Authentication
            }
            SyncError::EmptySelection | SyncError::ValidationError { .. } => {
                ErrorCategory::Precondition
            }
            SyncError::HttpError { .. } | SyncError::NetworkError(_) => ErrorCategory::Remote,
            SyncError::ConfigError { .. } | SyncError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            SyncError::IoError(_) | SyncError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Precondition => ErrorSeverity::Low,
            ErrorCategory::Remote => ErrorSeverity::Medium,
            ErrorCategory::Authentication | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SyncError::CredentialInvalid { slot, reason } => {
                format!("{} account: not connected – {}", slot, reason)
            }
            SyncError::MissingCredential { slot } => {
                format!("{} account: not connected", slot)
            }
            SyncError::EmptySelection => "Please select at least one subreddit to sync.".to_string(),
            SyncError::HttpError { status } => format!("HTTP error! Status: {}", status),
            SyncError::NetworkError(e) => format!("Could not reach the remote API: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SyncError::CredentialInvalid { .. } | SyncError::MissingCredential { .. } => {
                "Reconnect the account with `redalt-sync connect <slot> <token>`"
            }
            SyncError::EmptySelection => "Pass --select <names> or --all",
            SyncError::HttpError { status } if *status == 401 || *status == 403 => {
                "The token was rejected; reconnect the account"
            }
            SyncError::HttpError { status } if *status == 429 => {
                "Rate limited by the remote API; wait a minute and retry"
            }
            SyncError::HttpError { .. } | SyncError::NetworkError(_) => {
                "Check your network connection and retry"
            }
            SyncError::ConfigError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::ValidationError { .. } => "Check the configuration file and arguments",
            SyncError::IoError(_) | SyncError::SerializationError(_) => {
                "Check file permissions and the credentials file contents"
            }
        }
    }
}
