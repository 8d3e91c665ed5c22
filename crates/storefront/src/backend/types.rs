//! Wire types for the storefront backend.
//!
//! These mirror the JSON bodies the backend sends and expects. Request field
//! names are camelCase; response envelopes carry an optional `success` flag
//! and `message`.

use bestie_core::{CartItemId, Product, ProductId, UserId};
use serde::{Deserialize, Serialize};

// =============================================================================
// Requests
// =============================================================================

/// Body for `POST /cart/get-cart`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCartRequest<'a> {
    pub user_id: &'a UserId,
}

/// Body for `PUT /cart/update-quantity`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest<'a> {
    pub user_id: &'a UserId,
    pub product_id: &'a ProductId,
    pub product_qty: u32,
}

/// Body for `POST /cart/delete-items`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteItemRequest<'a> {
    pub user_id: &'a UserId,
    pub product_id: &'a ProductId,
}

/// Body for `POST /cart/addtocart`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest<'a> {
    pub user_id: &'a UserId,
    pub product_id: &'a ProductId,
    pub quantity: u32,
}

/// Body for `POST /:productId`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest<'a> {
    pub product_id: &'a ProductId,
}

/// Body for `POST /coupon/verify-coupon`.
#[derive(Debug, Serialize)]
pub struct VerifyCouponRequest<'a> {
    pub code: &'a str,
}

// =============================================================================
// Responses
// =============================================================================

/// Minimal envelope shared by every endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `POST /cart/get-cart`.
#[derive(Debug, Deserialize)]
pub struct GetCartResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub cart: Option<RemoteCart>,
}

/// Server-held cart.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCart {
    #[serde(default)]
    pub products_in_cart: Vec<RemoteCartLine>,
}

/// One line of the server-held cart. Product details are not included and
/// must be looked up separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCartLine {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    #[serde(rename = "productQty", default = "default_quantity")]
    pub quantity: u32,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub cart_item_id: Option<CartItemId>,
}

const fn default_quantity() -> u32 {
    1
}

/// Response of `POST /:productId`.
#[derive(Debug, Deserialize)]
pub struct ProductResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub product: Option<Product>,
}

/// Response of `GET /get-product`.
#[derive(Debug, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub products: Vec<Product>,
}
