//! Durable storage for the session token.
//!
//! Each backend is a tiny key-value store; the session only ever uses the
//! `authToken` key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use keyring::Entry;

/// Key the bearer token is stored under
pub const TOKEN_KEY: &str = "authToken";

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Keychain service name
const SERVICE_NAME: &str = "modcandy";

/// Durable key-value storage for the bearer token.
pub trait TokenStore: Send + Sync {
    /// Read the persisted token, if any
    fn load(&self) -> Result<Option<String>>;

    /// Persist the token, replacing any previous value
    fn save(&self, token: &str) -> Result<()>;

    /// Remove the persisted token. Removing a missing token is not an error.
    fn remove(&self) -> Result<()>;
}

// ============================================================================
// File
// ============================================================================

/// Token kept in a JSON object on disk, e.g. `{"authToken": "..."}`.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read session file")?;
        serde_json::from_str(&contents).context("Failed to parse session file")
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.read_map()?.remove(TOKEN_KEY))
    }

    fn save(&self, token: &str) -> Result<()> {
        // A corrupt file is replaced rather than blocking the login
        let mut map = self.read_map().unwrap_or_default();
        map.insert(TOKEN_KEY.to_string(), token.to_string());
        self.write_map(&map)
    }

    fn remove(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let mut map = self.read_map().unwrap_or_default();
        map.remove(TOKEN_KEY);
        if map.is_empty() {
            std::fs::remove_file(&self.path).context("Failed to remove session file")?;
            Ok(())
        } else {
            self.write_map(&map)
        }
    }
}

// ============================================================================
// OS keychain
// ============================================================================

/// Token kept in the OS keychain
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, TOKEN_KEY).context("Failed to create keyring entry")
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        self.entry()?
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn remove(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Process-local store. Clones share the same map, so a clone handed to a
/// second `SessionStore` sees what the first one persisted.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a token already persisted
    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        if let Ok(mut values) = store.values.lock() {
            values.insert(TOKEN_KEY.to_string(), token.to_string());
        }
        store
    }

    /// Current persisted token, bypassing the trait
    pub fn peek(&self) -> Option<String> {
        self.values.lock().ok()?.get(TOKEN_KEY).cloned()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.lock()?.get(TOKEN_KEY).cloned())
    }

    fn save(&self, token: &str) -> Result<()> {
        self.lock()?.insert(TOKEN_KEY.to_string(), token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        self.lock()?.remove(TOKEN_KEY);
        Ok(())
    }
}
