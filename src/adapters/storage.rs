use crate::core::{AccountSlot, Credential, CredentialStore};
use crate::utils::error::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

/// 與瀏覽器版 localStorage 相同的鍵名
pub fn storage_key(slot: AccountSlot) -> String {
    format!("reddit_{}_token", slot.as_str())
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tokens: RwLock<HashMap<AccountSlot, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, slot: AccountSlot) -> Result<Option<Credential>> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .get(&slot)
            .map(|token| Credential::new(slot, token.clone())))
    }

    async fn set(&self, credential: Credential) -> Result<()> {
        let mut tokens = self.tokens.write().await;
        tokens.insert(credential.slot, credential.token);
        Ok(())
    }

    async fn clear(&self, slot: AccountSlot) -> Result<()> {
        let mut tokens = self.tokens.write().await;
        tokens.remove(&slot);
        Ok(())
    }
}

/// JSON file of `reddit_<slot>_token` keys. A missing file is an empty store.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    // 序列化讀改寫，避免同一行程內互相覆蓋
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(data) if data.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(entries)?;
        let temp_path = self.temp_path();
        if let Err(e) = Self::write_private(&temp_path, &json).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }

    /// Sibling of the store file, so the final rename stays on one filesystem.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Writes and flushes `data`; on Unix the file is readable by the owner only.
    async fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(path).await?;
        // 既有的暫存檔不受 mode 影響
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await?;
        }
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    async fn get(&self, slot: AccountSlot) -> Result<Option<Credential>> {
        let entries = self.read_all().await?;
        Ok(entries
            .get(&storage_key(slot))
            .map(|token| Credential::new(slot, token.clone())))
    }

    async fn set(&self, credential: Credential) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(storage_key(credential.slot), credential.token);
        tracing::debug!("💾 Storing {} credential in {}", credential.slot, self.path.display());
        self.persist(&entries).await
    }

    async fn clear(&self, slot: AccountSlot) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(&storage_key(slot)).is_some() {
            tracing::debug!("🗑️ Removed {} credential from {}", slot, self.path.display());
            self.persist(&entries).await?;
        }
        Ok(())
    }
}
