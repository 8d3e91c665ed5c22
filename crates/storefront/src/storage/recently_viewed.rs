//! Recently viewed products.

use std::sync::Arc;

use bestie_core::Product;
use tracing::warn;

use super::{LocalStorage, keys};
use crate::error::StorageError;

/// Number of products remembered.
pub const RECENTLY_VIEWED_CAPACITY: usize = 3;

/// Most-recent-first list of product snapshots, unique by product.
#[derive(Clone)]
pub struct RecentlyViewed {
    storage: Arc<dyn LocalStorage>,
}

impl std::fmt::Debug for RecentlyViewed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecentlyViewed").finish_non_exhaustive()
    }
}

impl RecentlyViewed {
    #[must_use]
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// Stored products, most recent first. Malformed data reads as empty.
    #[must_use]
    pub fn list(&self) -> Vec<Product> {
        let raw = match self.storage.get(keys::RECENTLY_VIEWED) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read recently viewed products");
                return Vec::new();
            }
        };

        serde_json::from_str::<Option<Vec<Product>>>(&raw).map_or_else(
            |e| {
                warn!(error = %e, "Recently viewed list is not valid JSON");
                Vec::new()
            },
            Option::unwrap_or_default,
        )
    }

    /// Move `product` to the front, dropping the oldest entries past capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written.
    pub fn record(&self, product: &Product) -> Result<Vec<Product>, StorageError> {
        let mut viewed = self.list();
        viewed.retain(|p| p.product_id != product.product_id);
        viewed.insert(0, product.clone());
        viewed.truncate(RECENTLY_VIEWED_CAPACITY);

        self.storage
            .set(keys::RECENTLY_VIEWED, &serde_json::to_string(&viewed)?)?;
        Ok(viewed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bestie_core::ProductId;

    use super::*;
    use crate::storage::MemoryStorage;

    fn product(id: &str) -> Product {
        serde_json::from_value(serde_json::json!({
            "productId": id,
            "name": format!("Product {id}"),
            "price": "100",
        }))
        .unwrap()
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.product_id.as_str()).collect()
    }

    #[test]
    fn test_most_recent_first_capped_at_three() {
        let viewed = RecentlyViewed::new(Arc::new(MemoryStorage::new()));
        for id in ["a", "b", "c", "d"] {
            viewed.record(&product(id)).unwrap();
        }
        assert_eq!(ids(&viewed.list()), vec!["d", "c", "b"]);
    }

    #[test]
    fn test_revisit_moves_to_front_without_duplicating() {
        let viewed = RecentlyViewed::new(Arc::new(MemoryStorage::new()));
        viewed.record(&product("a")).unwrap();
        viewed.record(&product("b")).unwrap();
        let list = viewed.record(&product("a")).unwrap();

        assert_eq!(ids(&list), vec!["a", "b"]);
        assert_eq!(list[0].product_id, ProductId::new("a"));
    }

    #[test]
    fn test_corrupt_list_is_replaced() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::RECENTLY_VIEWED, "[{broken").unwrap();
        let viewed = RecentlyViewed::new(storage);

        assert!(viewed.list().is_empty());
        viewed.record(&product("a")).unwrap();
        assert_eq!(ids(&viewed.list()), vec!["a"]);
    }
}
