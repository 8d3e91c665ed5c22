//! Unified error handling for cart operations.
//!
//! Every cart operation returns `Result<T, CartError>`. Errors never escape to
//! a global handler: the front end turns them into an inline message with
//! [`CartError::user_message`].

use thiserror::Error;

/// Errors from the local key/value storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the storage directory failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded.
    #[error("Storage encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Keys are restricted to `[A-Za-z0-9_-]`.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Application-level error type for cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered but reported failure or an unexpected shape.
    #[error("Server error: {0}")]
    Server(String),

    /// The payload or the caller's input could not be used.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Local persistence failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The product has no stock left.
    #[error("Out of stock: {0}")]
    OutOfStock(String),

    /// The requested quantity exceeds the available stock.
    #[error("Only {available} in stock for {product}")]
    StockLimit { product: String, available: u32 },

    /// The pending request was cancelled before it completed.
    #[error("Request cancelled")]
    Cancelled,
}

impl CartError {
    /// Short message suitable for inline display to the shopper.
    ///
    /// Don't expose transport details to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Could not reach the store, please try again".to_string(),
            Self::Server(message) => message.clone(),
            Self::Validation(_) => "Unexpected response from the store".to_string(),
            Self::Storage(_) => "Error saving your cart".to_string(),
            Self::NotFound(_) => "Product not found".to_string(),
            Self::OutOfStock(_) => "Sorry, this product is currently out of stock".to_string(),
            Self::StockLimit { .. } => "Cannot add more items than available in stock".to_string(),
            Self::Cancelled => "Update cancelled".to_string(),
        }
    }
}

impl From<reqwest::Error> for CartError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Validation(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
