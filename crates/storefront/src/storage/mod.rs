//! Client-local key/value storage.
//!
//! The storefront keeps the guest cart, the recently viewed list and the
//! signed-in user on the shopper's machine. Values are JSON documents stored
//! under short string keys, the same model a browser's local storage offers.
//!
//! - [`FileStorage`] - one `<key>.json` file per key inside a directory
//! - [`MemoryStorage`] - process-local map, used by tests and ephemeral sessions

mod cart_store;
mod recently_viewed;

pub use cart_store::LocalCartStore;
pub use recently_viewed::RecentlyViewed;

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::error::StorageError;

/// Storage keys.
pub mod keys {
    /// Guest cart line items.
    pub const GUEST_CART: &str = "guestCart";

    /// Recently viewed products, most recent first.
    pub const RECENTLY_VIEWED: &str = "recentlyViewed";

    /// Signed-in user.
    pub const SESSION: &str = "session";
}

/// Synchronous string key/value store.
pub trait LocalStorage: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

// =============================================================================
// FileStorage
// =============================================================================

/// Directory-backed storage; each key is a `<key>.json` file.
///
/// Writes go to a temporary sibling file that is renamed over the target, so
/// a crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;

        debug!(key, bytes = value.len(), "Stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-process storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.get("guestCart").unwrap(), None);
        storage.set("guestCart", "[]").unwrap();
        assert_eq!(storage.get("guestCart").unwrap().as_deref(), Some("[]"));

        storage.set("guestCart", "[1]").unwrap();
        assert_eq!(storage.get("guestCart").unwrap().as_deref(), Some("[1]"));
        assert!(storage.dir().join("guestCart.json").exists());

        storage.remove("guestCart").unwrap();
        storage.remove("guestCart").unwrap();
        assert_eq!(storage.get("guestCart").unwrap(), None);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        for key in ["", "../escape", "a/b", "with space"] {
            assert!(matches!(
                storage.set(key, "x"),
                Err(StorageError::InvalidKey(_))
            ));
        }
        assert!(MemoryStorage::new().get("a/b").is_err());
    }

    #[test]
    fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        storage.set("session", "{}").unwrap();
        assert_eq!(storage.get("session").unwrap().as_deref(), Some("{}"));
        storage.remove("session").unwrap();
        assert_eq!(storage.get("session").unwrap(), None);
    }
}
