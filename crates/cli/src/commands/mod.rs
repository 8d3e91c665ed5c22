//! Command implementations.
//!
//! Each command opens the cart session it needs from an [`App`], performs a
//! single operation and prints the result.

pub mod account;
pub mod cart;
pub mod recent;

use std::sync::Arc;

use bestie_storefront::{
    CartError, CartSession, FileStorage, HttpBackend, LocalStorage, SessionContext,
    StorefrontConfig,
};

/// Shared handles for a single command run.
pub struct App {
    pub config: StorefrontConfig,
    pub storage: Arc<dyn LocalStorage>,
    pub backend: Arc<HttpBackend>,
}

impl App {
    /// Build the storage and backend client described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: StorefrontConfig) -> Result<Self, CartError> {
        let storage: Arc<dyn LocalStorage> = Arc::new(FileStorage::new(&config.storage_dir));
        let backend = Arc::new(HttpBackend::new(&config.backend)?);
        Ok(Self {
            config,
            storage,
            backend,
        })
    }

    /// Open the cart for the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the signed-in cart cannot be fetched.
    pub async fn session(&self) -> Result<CartSession, CartError> {
        let context = SessionContext::load(Arc::clone(&self.storage));
        CartSession::start(context, self.backend.clone()).await
    }

    /// Currency prefix for displayed amounts.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.config.currency_prefix
    }
}
