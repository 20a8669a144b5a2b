use crate::adapters::http::{DEFAULT_API_BASE_URL, DEFAULT_USER_AGENT};
use crate::core::fetcher::MAX_PAGE_SIZE;
use crate::core::orchestrator::DEFAULT_WRITE_SPACING;
use crate::core::ConfigProvider;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_SITE_URL: &str = "https://reddit.com";
pub const DEFAULT_CREDENTIALS_PATH: &str = "./.redalt-sync/credentials.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub api: ApiConfig,
    pub sync: SyncSettings,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub site_url: String,
    pub user_agent: String,
    pub page_size: usize,
    pub timeout_seconds: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_size: MAX_PAGE_SIZE,
            timeout_seconds: Some(30),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub write_spacing_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            write_spacing_ms: DEFAULT_WRITE_SPACING.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub credentials_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            credentials_path: DEFAULT_CREDENTIALS_PATH.to_string(),
        }
    }
}

impl SyncConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 檔案不存在時使用預設值
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| SyncError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${REDDIT_API_BASE})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }
}

impl Validate for SyncConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_base_url("api.base_url", &self.api.base_url)?;
        validation::validate_base_url("api.site_url", &self.api.site_url)?;
        validation::validate_user_agent("api.user_agent", &self.api.user_agent)?;
        validation::validate_range("api.page_size", self.api.page_size, 1, MAX_PAGE_SIZE)?;
        if let Some(timeout) = self.api.timeout_seconds {
            validation::validate_range("api.timeout_seconds", timeout, 1, 600)?;
        }
        validation::validate_range("sync.write_spacing_ms", self.sync.write_spacing_ms, 0, 60_000)?;
        validation::validate_credentials_path(
            "storage.credentials_path",
            &self.storage.credentials_path,
        )?;
        Ok(())
    }
}

impl ConfigProvider for SyncConfig {
    fn api_base_url(&self) -> &str {
        &self.api.base_url
    }

    fn site_url(&self) -> &str {
        &self.api.site_url
    }

    fn user_agent(&self) -> &str {
        &self.api.user_agent
    }

    fn page_size(&self) -> usize {
        self.api.page_size
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.api.timeout_seconds.map(Duration::from_secs)
    }

    fn write_spacing(&self) -> Duration {
        Duration::from_millis(self.sync.write_spacing_ms)
    }

    fn credentials_path(&self) -> &str {
        &self.storage.credentials_path
    }
}
