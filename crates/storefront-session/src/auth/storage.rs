use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use keyring::Entry;

/// Well-known key for the persisted access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Well-known key for the persisted refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Tokens read back from persistent storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Durable key/value home for the two session tokens.
///
/// Only the session store reads or writes through this trait.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Both tokens, or `None` if either key is absent
    fn load(&self) -> Result<Option<PersistedTokens>> {
        let access = self.get(ACCESS_TOKEN_KEY)?;
        let refresh = self.get(REFRESH_TOKEN_KEY)?;
        Ok(match (access, refresh) {
            (Some(access_token), Some(refresh_token)) => Some(PersistedTokens {
                access_token,
                refresh_token,
            }),
            _ => None,
        })
    }

    fn save(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        self.set(ACCESS_TOKEN_KEY, access_token)?;
        self.set(REFRESH_TOKEN_KEY, refresh_token)
    }

    fn purge(&self) -> Result<()> {
        self.remove(ACCESS_TOKEN_KEY)?;
        self.remove(REFRESH_TOKEN_KEY)
    }
}

/// Tokens kept in `session.json` under the cache directory as a flat JSON object.
pub struct FileTokenStore {
    cache_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        serde_json::from_str(&contents).context("Failed to parse session file")
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let path = self.session_path();
        if values.is_empty() {
            if path.exists() {
                std::fs::remove_file(&path).context("Failed to remove session file")?;
            }
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(values)?;
        write_private(&path, contents.as_bytes()).context("Failed to write session file")?;
        Ok(())
    }
}

/// Write `contents` readable by the owner only; the file holds bearer tokens.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::fs::{OpenOptions, Permissions};
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation; tighten a file left by an older version
    file.set_permissions(Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

/// Tokens kept in the OS keychain, one entry per key under a service name.
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).context("Failed to create keyring entry")
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Failed to store token in keychain")
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

/// Process-local storage; nothing survives a restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    fn values(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_load_requires_both_keys() {
        let store = MemoryTokenStore::default();
        assert!(store.load().expect("load").is_none());

        store.set(ACCESS_TOKEN_KEY, "A1").expect("set");
        assert!(store.load().expect("load").is_none());

        store.set(REFRESH_TOKEN_KEY, "R1").expect("set");
        assert_eq!(
            store.load().expect("load"),
            Some(PersistedTokens {
                access_token: "A1".to_string(),
                refresh_token: "R1".to_string(),
            })
        );

        store.purge().expect("purge");
        assert!(store.get(ACCESS_TOKEN_KEY).expect("get").is_none());
        assert!(store.get(REFRESH_TOKEN_KEY).expect("get").is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().join("nested"));

        assert!(store.load().expect("load").is_none());
        store.save("A1", "R1").expect("save");

        // A fresh handle over the same directory sees the same tokens
        let reopened = FileTokenStore::new(dir.path().join("nested"));
        let tokens = reopened.load().expect("load").expect("tokens present");
        assert_eq!(tokens.access_token, "A1");
        assert_eq!(tokens.refresh_token, "R1");

        let raw = std::fs::read_to_string(dir.path().join("nested").join(SESSION_FILE))
            .expect("read session file");
        let json: serde_json::Value = serde_json::from_str(&raw).expect("parse session file");
        assert_eq!(json, serde_json::json!({ "accessToken": "A1", "refreshToken": "R1" }));
    }

    #[test]
    fn test_file_store_replace_access_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().to_path_buf());
        store.save("A1", "R1").expect("save");
        store.set(ACCESS_TOKEN_KEY, "A2").expect("set");

        let tokens = store.load().expect("load").expect("tokens present");
        assert_eq!(tokens.access_token, "A2");
        assert_eq!(tokens.refresh_token, "R1");
    }

    #[test]
    fn test_file_store_purge_removes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().to_path_buf());
        store.save("A1", "R1").expect("save");
        store.purge().expect("purge");

        assert!(!dir.path().join(SESSION_FILE).exists());
        assert!(store.load().expect("load").is_none());

        // Purging again is a no-op
        store.purge().expect("second purge");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SESSION_FILE);

        // Pre-existing world-readable file gets tightened on the next write
        std::fs::write(&path, "{}").expect("write");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644))
            .expect("chmod");

        let store = FileTokenStore::new(dir.path().to_path_buf());
        store.save("A1", "R1").expect("save");

        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_keyring_store_round_trip() {
        let service = format!("storefront-session-test-{}", std::process::id());
        let store = KeyringTokenStore::new(&service);

        if let Err(e) = store.save("A1", "R1") {
            // No usable keychain on this host (e.g. keyctl blocked in a container)
            eprintln!("skipping keyring round trip: {:#}", e);
            return;
        }

        // A fresh handle must see what the first one wrote
        let reopened = KeyringTokenStore::new(&service);
        let tokens = reopened.load().expect("load").expect("tokens present");
        assert_eq!(tokens.access_token, "A1");
        assert_eq!(tokens.refresh_token, "R1");

        reopened.purge().expect("purge");
        assert!(store.load().expect("load").is_none());
        // Removing missing entries is not an error
        store.purge().expect("second purge");
    }

    #[test]
    fn test_file_store_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(SESSION_FILE), "{not json").expect("write");
        let store = FileTokenStore::new(dir.path().to_path_buf());
        assert!(store.load().is_err());
    }
}
