//! Client configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! includes the API base URL, the HTTP timeout, the access-token expiry
//! buffer and where session tokens are persisted.
//!
//! Configuration is stored at `~/.config/storefront/config.json`. Values
//! can be overridden from the environment (or a `.env` file):
//! `STOREFRONT_API_URL`, `STOREFRONT_REQUEST_TIMEOUT_SECS`,
//! `STOREFRONT_EXPIRY_BUFFER_SECS`, `STOREFRONT_TOKEN_STORAGE`.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};
use crate::token::ACCESS_TOKEN_BUFFER_SECS;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "storefront";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default API root when nothing is configured
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where the access and refresh tokens are persisted between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "keyring" => Ok(StorageBackend::Keyring),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown token storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub expiry_buffer_secs: i64,
    pub storage: StorageBackend,
    pub keyring_service: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            expiry_buffer_secs: ACCESS_TOKEN_BUFFER_SECS,
            storage: StorageBackend::default(),
            keyring_service: APP_NAME.to_string(),
        }
    }
}

impl Config {
    /// Load the config file (or defaults) and apply environment overrides
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if not found)
        let _ = dotenvy::dotenv();

        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        debug!(api_base_url = %config.api_base_url, storage = ?config.storage, "Config loaded");
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `STOREFRONT_*` overrides. Unparseable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("STOREFRONT_API_URL").filter(|u| !u.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(raw) = lookup("STOREFRONT_REQUEST_TIMEOUT_SECS") {
            match raw.parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => warn!(value = %raw, "Ignoring invalid STOREFRONT_REQUEST_TIMEOUT_SECS"),
            }
        }
        if let Some(raw) = lookup("STOREFRONT_EXPIRY_BUFFER_SECS") {
            match raw.parse() {
                Ok(secs) => self.expiry_buffer_secs = secs,
                Err(_) => warn!(value = %raw, "Ignoring invalid STOREFRONT_EXPIRY_BUFFER_SECS"),
            }
        }
        if let Some(raw) = lookup("STOREFRONT_TOKEN_STORAGE") {
            match raw.parse() {
                Ok(backend) => self.storage = backend,
                Err(e) => warn!(error = %e, "Ignoring invalid STOREFRONT_TOKEN_STORAGE"),
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Build the configured token persistence backend
    pub fn token_store(&self) -> Result<Arc<dyn TokenStore>> {
        let store: Arc<dyn TokenStore> = match self.storage {
            StorageBackend::File => Arc::new(FileTokenStore::new(self.cache_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringTokenStore::new(&self.keyring_service)),
            StorageBackend::Memory => Arc::new(MemoryTokenStore::default()),
        };
        Ok(store)
    }
}
