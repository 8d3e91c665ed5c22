//! Guest cart persistence.

use std::sync::Arc;

use bestie_core::{Cart, CartSource, LineItem};
use tracing::warn;

use super::{LocalStorage, keys};
use crate::error::StorageError;

/// Reads and writes the guest cart in local storage.
#[derive(Clone)]
pub struct LocalCartStore {
    storage: Arc<dyn LocalStorage>,
}

impl std::fmt::Debug for LocalCartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCartStore").finish_non_exhaustive()
    }
}

impl LocalCartStore {
    #[must_use]
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// Load the guest cart.
    ///
    /// Never fails: unreadable, absent or malformed data loads as an empty
    /// cart. Duplicate products are folded and zero quantities lifted to 1.
    #[must_use]
    pub fn load(&self) -> Vec<LineItem> {
        let raw = match self.storage.get(keys::GUEST_CART) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read guest cart, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Option<Vec<LineItem>>>(&raw) {
            Ok(items) => Cart::new(CartSource::Guest, items.unwrap_or_default()).into_items(),
            Err(e) => {
                warn!(error = %e, "Guest cart is not valid JSON, starting empty");
                Vec::new()
            }
        }
    }

    /// Overwrite the stored guest cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be encoded or written.
    pub fn save(&self, items: &[LineItem]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(items)?;
        self.storage.set(keys::GUEST_CART, &raw)
    }

    /// Delete the stored guest cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::GUEST_CART)
    }
}
