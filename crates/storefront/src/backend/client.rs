//! HTTP implementation of [`CartBackend`].
//!
//! Uses `reqwest` for HTTP and caches product lookups using `moka`.

use std::sync::Arc;

use async_trait::async_trait;
use bestie_core::{Product, ProductId, UserId};
use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, instrument};
use url::Url;

use super::CartBackend;
use super::cache::{CacheKey, CacheValue};
use super::types::{
    AddToCartRequest, CatalogResponse, DeleteItemRequest, Envelope, GetCartRequest,
    GetCartResponse, ProductRequest, RemoteCartLine, UpdateQuantityRequest, VerifyCouponRequest,
};
use crate::config::BackendConfig;
use crate::error::CartError;

/// Maximum number of characters of a response body copied into logs.
const LOG_BODY_LIMIT: usize = 500;

// =============================================================================
// HttpBackend
// =============================================================================

/// Client for the storefront backend.
///
/// Cheap to clone; clones share the connection pool and cache.
#[derive(Clone)]
pub struct HttpBackend {
    inner: Arc<HttpBackendInner>,
}

struct HttpBackendInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &BackendConfig) -> Result<Self, CartError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(HttpBackendInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// Resolve an endpoint below the base URL, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CartError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CartError::Validation("backend URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and parse the body as JSON.
    ///
    /// The backend reports most failures inside a JSON body, so the body is
    /// parsed whatever the status; the status is returned for the caller to
    /// judge.
    async fn execute(&self, request: RequestBuilder) -> Result<(StatusCode, Value), CartError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        match serde_json::from_str::<Value>(&body) {
            Ok(value) => Ok((status, value)),
            Err(e) => {
                error!(
                    status = %status,
                    error = %e,
                    body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                    "Backend returned a non-JSON body"
                );
                if status.is_success() {
                    Err(CartError::Validation(format!("invalid JSON body: {e}")))
                } else {
                    Err(CartError::Server(format!("HTTP {status}")))
                }
            }
        }
    }

    /// Run a cart mutation and check its envelope.
    async fn mutate(&self, request: RequestBuilder, fallback: &str) -> Result<(), CartError> {
        let (status, body) = self.execute(request).await?;
        let envelope: Envelope = decode(body)?;

        if envelope.success == Some(false) || !status.is_success() {
            error!(
                status = %status,
                message = ?envelope.message,
                "Backend rejected cart mutation"
            );
            return Err(CartError::Server(
                envelope.message.unwrap_or_else(|| fallback.to_string()),
            ));
        }
        Ok(())
    }
}

/// Decode a JSON value into a wire type.
fn decode<T: DeserializeOwned>(value: Value) -> Result<T, CartError> {
    serde_json::from_value(value).map_err(|e| CartError::Validation(e.to_string()))
}

#[async_trait]
impl CartBackend for HttpBackend {
    // =========================================================================
    // Cart Methods
    // =========================================================================

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn fetch_cart(&self, user_id: &UserId) -> Result<Vec<RemoteCartLine>, CartError> {
        let url = self.endpoint(&["cart", "get-cart"])?;
        let (status, body) = self
            .execute(self.inner.client.post(url).json(&GetCartRequest { user_id }))
            .await?;
        let response: GetCartResponse = decode(body)?;

        // Users who never added anything have no cart yet
        if status == StatusCode::NOT_FOUND {
            debug!(message = ?response.message, "No server cart");
            return Ok(Vec::new());
        }
        if !response.success {
            return Err(CartError::Server(
                response
                    .message
                    .unwrap_or_else(|| "Failed to fetch cart".to_string()),
            ));
        }
        if !status.is_success() {
            return Err(CartError::Server(format!("HTTP {status}")));
        }

        let cart = response
            .cart
            .ok_or_else(|| CartError::Server("Cart missing from response".to_string()))?;
        debug!(lines = cart.products_in_cart.len(), "Fetched server cart");
        Ok(cart.products_in_cart)
    }

    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    async fn set_quantity(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        let url = self.endpoint(&["cart", "update-quantity"])?;
        let request = self.inner.client.put(url).json(&UpdateQuantityRequest {
            user_id,
            product_id,
            product_qty: quantity,
        });
        self.mutate(request, "Failed to update quantity").await
    }

    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    async fn remove_item(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<(), CartError> {
        let url = self.endpoint(&["cart", "delete-items"])?;
        let request = self
            .inner
            .client
            .post(url)
            .json(&DeleteItemRequest {
                user_id,
                product_id,
            });
        self.mutate(request, "Failed to remove item").await
    }

    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    async fn add_item(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        let url = self.endpoint(&["cart", "addtocart"])?;
        let request = self.inner.client.post(url).json(&AddToCartRequest {
            user_id,
            product_id,
            quantity,
        });
        self.mutate(request, "Product not saved to cart").await
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn fetch_product(&self, product_id: &ProductId) -> Result<Product, CartError> {
        let cache_key = CacheKey::Product(product_id.clone());

        // Check cache
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&[product_id.as_str()])?;
        let (_, body) = self
            .execute(self.inner.client.post(url).json(&ProductRequest { product_id }))
            .await?;
        let response: super::types::ProductResponse = decode(body)?;

        match response.product {
            Some(product) if response.success => {
                self.inner
                    .cache
                    .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
                    .await;
                Ok(product)
            }
            _ => Err(CartError::NotFound(
                response
                    .message
                    .unwrap_or_else(|| product_id.to_string()),
            )),
        }
    }

    #[instrument(skip(self))]
    async fn fetch_catalog(&self) -> Result<Vec<Product>, CartError> {
        if let Some(CacheValue::Catalog(products)) = self.inner.cache.get(&CacheKey::Catalog).await
        {
            debug!("Cache hit for catalog");
            return Ok(products.as_ref().clone());
        }

        let url = self.endpoint(&["get-product"])?;
        let (status, body) = self.execute(self.inner.client.get(url)).await?;
        let response: CatalogResponse = decode(body)?;

        if !response.success || !status.is_success() {
            return Err(CartError::Server(
                response
                    .message
                    .unwrap_or_else(|| "Failed to fetch products".to_string()),
            ));
        }

        debug!(products = response.products.len(), "Fetched catalog");
        let products = Arc::new(response.products);
        self.inner
            .cache
            .insert(CacheKey::Catalog, CacheValue::Catalog(Arc::clone(&products)))
            .await;
        Ok(products.as_ref().clone())
    }

    // =========================================================================
    // Coupon Methods
    // =========================================================================

    #[instrument(skip(self, code))]
    async fn verify_coupon(&self, code: &str) -> Result<Value, CartError> {
        let url = self.endpoint(&["coupon", "verify-coupon"])?;
        let (status, body) = self
            .execute(self.inner.client.post(url).json(&VerifyCouponRequest { code }))
            .await?;
        debug!(status = %status, "Coupon verification answered");
        Ok(body)
    }
}
