//! Storefront backend client.
//!
//! # Architecture
//!
//! - The backend is the source of truth for signed-in carts, products and coupons
//! - [`CartBackend`] is the seam the cart session talks to; [`HttpBackend`] is
//!   the `reqwest` implementation
//! - The product catalog is cached in memory via `moka` so that enriching a
//!   cart costs one request instead of one per line
//!
//! # Endpoints
//!
//! - `POST /cart/get-cart` - server-held cart lines
//! - `PUT /cart/update-quantity` - set a line quantity
//! - `POST /cart/delete-items` - remove a line
//! - `POST /cart/addtocart` - add units of a product
//! - `POST /:productId` - single product detail
//! - `GET /get-product` - whole catalog
//! - `POST /coupon/verify-coupon` - coupon lookup
//!
//! # Example
//!
//! ```rust,ignore
//! use bestie_storefront::backend::{CartBackend, HttpBackend};
//!
//! let backend = HttpBackend::new(&config.backend)?;
//! let lines = backend.fetch_cart(&user_id).await?;
//! backend.set_quantity(&user_id, &lines[0].product_id, 3).await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::HttpBackend;
pub use types::RemoteCartLine;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use bestie_core::{Product, ProductId, UserId};

use crate::error::CartError;

/// Operations the cart needs from the backend.
#[async_trait]
pub trait CartBackend: Send + Sync {
    // === Cart ===

    /// Lines of the user's server-held cart.
    async fn fetch_cart(&self, user_id: &UserId) -> Result<Vec<RemoteCartLine>, CartError>;

    /// Set the quantity of a product in the user's cart.
    async fn set_quantity(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CartError>;

    /// Remove a product from the user's cart.
    async fn remove_item(&self, user_id: &UserId, product_id: &ProductId)
    -> Result<(), CartError>;

    /// Add units of a product to the user's cart.
    async fn add_item(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CartError>;

    // === Products ===

    /// Look up a single product.
    async fn fetch_product(&self, product_id: &ProductId) -> Result<Product, CartError>;

    /// The whole product catalog.
    async fn fetch_catalog(&self) -> Result<Vec<Product>, CartError>;

    /// Look up many products with a single catalog request. Unknown IDs are
    /// absent from the result.
    async fn fetch_products(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Product>, CartError> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let wanted: HashSet<&ProductId> = product_ids.iter().collect();
        Ok(self
            .fetch_catalog()
            .await?
            .into_iter()
            .filter(|product| wanted.contains(&product.product_id))
            .map(|product| (product.product_id.clone(), product))
            .collect())
    }

    // === Coupons ===

    /// Raw body of the coupon verification response.
    async fn verify_coupon(&self, code: &str) -> Result<serde_json::Value, CartError>;
}
