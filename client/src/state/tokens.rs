//! Durable token storage.
//!
//! DESIGN
//! ======
//! The access/refresh pair lives behind a key-value `TokenStore` so the
//! HTTP client and the session store share one source of truth. Reads are
//! infallible (stores keep an in-memory copy); writes report storage
//! failures. Only login, refresh, logout and refresh failure write here.
//!
//! `FileTokenStore` writes the whole map to a sibling temp file and renames
//! it over the store, so a credential pair is never half-written. On unix
//! the file is created with mode 0600.

#[cfg(test)]
#[path = "tokens_test.rs"]
mod tokens_test;

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::ClientError;
use crate::net::types::Credentials;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Key-value storage for session credentials.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Write every entry in one step.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the backing medium rejects the write.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), ClientError>;

    /// Remove every key in one step.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the backing medium rejects the write.
    fn remove_many(&self, keys: &[&str]) -> Result<(), ClientError>;

    /// Stored access token. Empty strings read as absent.
    fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Stored refresh token. Empty strings read as absent.
    fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Persist both tokens together.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on write failure.
    fn save_credentials(&self, credentials: &Credentials) -> Result<(), ClientError> {
        self.set_many(&[
            (ACCESS_TOKEN_KEY, credentials.access_token.as_str()),
            (REFRESH_TOKEN_KEY, credentials.refresh_token.as_str()),
        ])
    }

    /// Replace only the access token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on write failure.
    fn save_access_token(&self, token: &str) -> Result<(), ClientError> {
        self.set_many(&[(ACCESS_TOKEN_KEY, token)])
    }

    /// Remove both tokens.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on write failure.
    fn clear(&self) -> Result<(), ClientError> {
        self.remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])
    }
}

fn lock(entries: &Mutex<HashMap<String, String>>) -> MutexGuard<'_, HashMap<String, String>> {
    entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// =============================================================================
// MEMORY
// =============================================================================

/// Process-lifetime store; the equivalent of one browser tab's storage.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a credential pair.
    #[must_use]
    pub fn with_credentials(credentials: &Credentials) -> Self {
        let store = Self::new();
        {
            let mut entries = lock(&store.entries);
            entries.insert(ACCESS_TOKEN_KEY.to_owned(), credentials.access_token.clone());
            entries.insert(REFRESH_TOKEN_KEY.to_owned(), credentials.refresh_token.clone());
        }
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), ClientError> {
        let mut map = lock(&self.entries);
        for (key, value) in entries {
            map.insert((*key).to_owned(), (*value).to_owned());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), ClientError> {
        let mut map = lock(&self.entries);
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// JSON-file store that survives process restarts.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileTokenStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)
                .map_err(|e| ClientError::Storage(format!("failed to read {}: {e}", path.display())))?;
            if contents.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&contents)
                    .map_err(|e| ClientError::Storage(format!("failed to parse {}: {e}", path.display())))?
            }
        } else {
            HashMap::new()
        };
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ClientError::Storage(format!("failed to create {}: {e}", parent.display())))?;
        }
        let contents = serde_json::to_string_pretty(entries)
            .map_err(|e| ClientError::Storage(format!("failed to serialize tokens: {e}")))?;

        let tmp_path = temp_path(&self.path);
        // Mode only applies on create, so a stale temp file must not be reused.
        match fs::remove_file(&tmp_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ClientError::Storage(format!("failed to remove {}: {e}", tmp_path.display()))),
        }
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&tmp_path)
            .map_err(|e| ClientError::Storage(format!("failed to open {}: {e}", tmp_path.display())))?;
        file.write_all(contents.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| ClientError::Storage(format!("failed to write {}: {e}", tmp_path.display())))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            ClientError::Storage(format!("failed to rename {} to {}: {e}", tmp_path.display(), self.path.display()))
        })
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), ClientError> {
        let mut map = lock(&self.entries);
        let mut next = map.clone();
        for (key, value) in entries {
            next.insert((*key).to_owned(), (*value).to_owned());
        }
        self.persist(&next)?;
        *map = next;
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), ClientError> {
        let mut map = lock(&self.entries);
        let mut next = map.clone();
        for key in keys {
            next.remove(*key);
        }
        self.persist(&next)?;
        *map = next;
        Ok(())
    }
}
