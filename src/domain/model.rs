use crate::core::collation::locale_cmp;
use crate::utils::error::SyncError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 帳號槽位：來源帳號或目標帳號
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountSlot {
    Source,
    Target,
}

impl AccountSlot {
    pub const ALL: [AccountSlot; 2] = [AccountSlot::Source, AccountSlot::Target];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountSlot::Source => "source",
            AccountSlot::Target => "target",
        }
    }
}

impl fmt::Display for AccountSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountSlot {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "source" => Ok(AccountSlot::Source),
            "target" => Ok(AccountSlot::Target),
            other => Err(SyncError::ValidationError {
                message: format!(
                    "Invalid account type '{}'. Must be 'source' or 'target'",
                    other
                ),
            }),
        }
    }
}

/// Bearer token bound to one account slot.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub slot: AccountSlot,
    pub token: String,
}

impl Credential {
    pub fn new(slot: AccountSlot, token: impl Into<String>) -> Self {
        Self {
            slot,
            token: token.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("slot", &self.slot)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionItem {
    pub name: String,
}

impl CollectionItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn display_url(&self, site_url: &str) -> String {
        format!("{}/r/{}", site_url.trim_end_matches('/'), self.name)
    }
}

/// 單次抓取的結果頁
#[derive(Debug, Clone, Default)]
pub struct CollectionPage {
    pub items: Vec<CollectionItem>,
    pub next_cursor: Option<String>,
}

/// One account's subscriptions as of a single fetch, sorted by name.
#[derive(Debug, Clone)]
pub struct Collection {
    slot: AccountSlot,
    items: Vec<CollectionItem>,
}

impl Collection {
    pub fn from_fetched(slot: AccountSlot, mut items: Vec<CollectionItem>) -> Self {
        // sort_by 為穩定排序
        items.sort_by(|a, b| locale_cmp(&a.name, &b.name));
        Self { slot, items }
    }

    pub fn slot(&self) -> AccountSlot {
        self.slot
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectionItem> {
        self.items.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.name == name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentity {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountStatus {
    Connected { identity: AccountIdentity },
    NotConnected { reason: String },
}

impl AccountStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, AccountStatus::Connected { .. })
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Connected { identity } => {
                write!(f, "connected as {}", identity.username)
            }
            AccountStatus::NotConnected { reason } => write!(f, "not connected – {}", reason),
        }
    }
}
