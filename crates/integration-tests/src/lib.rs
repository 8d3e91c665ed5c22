//! Integration tests for the Mera Bestie storefront cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bestie-integration-tests
//! ```
//!
//! The tests need no external services: [`MockBackend`] serves the storefront
//! backend endpoints from an in-process `axum` router on an ephemeral port,
//! and the storefront crate talks to it over real HTTP.
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = MockBackend::start(
//!     MockState::default().with_product(product("p-1", "Teddy", "499", 5)),
//! )
//! .await;
//! let client = HttpBackend::new(&backend.config())?;
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use bestie_storefront::config::BackendConfig;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// One line of a mock server cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockLine {
    pub product_id: String,
    pub quantity: u32,
    pub line_id: String,
}

/// Data served by [`MockBackend`].
#[derive(Debug, Default)]
pub struct MockState {
    /// Server carts by user ID.
    pub carts: HashMap<String, Vec<MockLine>>,
    /// Catalog products, as raw backend JSON.
    pub products: Vec<Value>,
    /// Coupon code to discount percentage body.
    pub coupons: HashMap<String, Value>,
    /// Answer the next quantity update with a 500.
    pub fail_next_update: bool,
    /// Number of catalog requests served.
    pub catalog_requests: usize,
    /// `METHOD /path` of every request served.
    pub requests: Vec<String>,
    next_line: u32,
}

impl MockState {
    #[must_use]
    pub fn with_product(mut self, product: Value) -> Self {
        self.products.push(product);
        self
    }

    #[must_use]
    pub fn with_cart(mut self, user_id: &str, lines: &[(&str, u32)]) -> Self {
        let lines: Vec<MockLine> = lines
            .iter()
            .map(|(product_id, quantity)| self.line(product_id, *quantity))
            .collect();
        self.carts.insert(user_id.to_string(), lines);
        self
    }

    #[must_use]
    pub fn with_coupon(mut self, code: &str, body: Value) -> Self {
        self.coupons.insert(code.to_string(), body);
        self
    }

    /// Quantities of a user's server cart, in order.
    #[must_use]
    pub fn quantities(&self, user_id: &str) -> Vec<(String, u32)> {
        self.carts
            .get(user_id)
            .map(|lines| {
                lines
                    .iter()
                    .map(|line| (line.product_id.clone(), line.quantity))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn line(&mut self, product_id: &str, quantity: u32) -> MockLine {
        self.next_line += 1;
        MockLine {
            product_id: product_id.to_string(),
            quantity,
            line_id: format!("line-{}", self.next_line),
        }
    }
}

/// Backend product JSON as the catalog endpoints return it.
#[must_use]
pub fn product(id: &str, name: &str, price: &str, stock: u32) -> Value {
    json!({
        "_id": format!("oid-{id}"),
        "productId": id,
        "name": name,
        "price": price,
        "img": format!("https://img.example.com/{id}.jpg"),
        "category": "Gifts",
        "inStockValue": stock,
        "soldStockValue": 0,
        "visibility": "on",
    })
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process storefront backend.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    handle: JoinHandle<()>,
}

impl MockBackend {
    /// Serve `state` on an ephemeral local port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start(state: MockState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");

        let app = router(Arc::clone(&state));
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Base URL of the mock.
    ///
    /// # Panics
    ///
    /// Never in practice; the address always forms a valid URL.
    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("Mock backend URL is valid")
    }

    /// Backend configuration pointing at the mock.
    #[must_use]
    pub fn config(&self) -> BackendConfig {
        BackendConfig::new(self.url())
    }

    /// Inspect or change the served data.
    #[must_use]
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.state)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/cart/get-cart", post(get_cart))
        .route("/cart/update-quantity", put(update_quantity))
        .route("/cart/delete-items", post(delete_items))
        .route("/cart/addtocart", post(add_to_cart))
        .route("/coupon/verify-coupon", post(verify_coupon))
        .route("/get-product", get(catalog))
        .route("/{product_id}", post(product_detail))
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartBody {
    user_id: String,
    #[serde(default)]
    product_id: String,
    #[serde(default)]
    product_qty: Option<u32>,
    #[serde(default)]
    quantity: Option<u32>,
}

#[derive(Deserialize)]
struct CouponBody {
    code: String,
}

async fn get_cart(State(state): State<Shared>, Json(body): Json<CartBody>) -> Response {
    let mut state = lock(&state);
    state.requests.push("POST /cart/get-cart".to_string());

    if body.user_id == "broken" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "message": "Error fetching cart"})),
        )
            .into_response();
    }

    let Some(lines) = state.carts.get(&body.user_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "message": "Cart not found"})),
        )
            .into_response();
    };

    let products: Vec<Value> = lines
        .iter()
        .map(|line| {
            json!({
                "productId": line.product_id,
                "productQty": line.quantity,
                "_id": line.line_id,
            })
        })
        .collect();
    Json(json!({
        "success": true,
        "cart": {"userId": body.user_id, "productsInCart": products},
    }))
    .into_response()
}

async fn update_quantity(State(state): State<Shared>, Json(body): Json<CartBody>) -> Response {
    let mut state = lock(&state);
    state.requests.push("PUT /cart/update-quantity".to_string());

    if std::mem::take(&mut state.fail_next_update) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "Error updating quantity"})),
        )
            .into_response();
    }

    let quantity = body.product_qty.unwrap_or(1);
    let updated = state
        .carts
        .get_mut(&body.user_id)
        .and_then(|lines| lines.iter_mut().find(|line| line.product_id == body.product_id))
        .map(|line| line.quantity = quantity)
        .is_some();

    if updated {
        Json(json!({"message": "Quantity updated"})).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "message": "Product not found in cart"})),
        )
            .into_response()
    }
}

async fn delete_items(State(state): State<Shared>, Json(body): Json<CartBody>) -> Response {
    let mut state = lock(&state);
    state.requests.push("POST /cart/delete-items".to_string());

    if let Some(lines) = state.carts.get_mut(&body.user_id) {
        lines.retain(|line| line.product_id != body.product_id);
    }
    Json(json!({"success": true, "message": "Item deleted"})).into_response()
}

async fn add_to_cart(State(state): State<Shared>, Json(body): Json<CartBody>) -> Response {
    let mut state = lock(&state);
    state.requests.push("POST /cart/addtocart".to_string());

    let quantity = body.quantity.unwrap_or(1);
    let line = state.line(&body.product_id, quantity);
    let lines = state.carts.entry(body.user_id).or_default();
    match lines.iter_mut().find(|existing| existing.product_id == line.product_id) {
        Some(existing) => existing.quantity += quantity,
        None => lines.push(line),
    }
    Json(json!({"success": true, "message": "Product added to cart"})).into_response()
}

async fn verify_coupon(State(state): State<Shared>, Json(body): Json<CouponBody>) -> Response {
    let mut state = lock(&state);
    state.requests.push("POST /coupon/verify-coupon".to_string());

    if body.code == "BROKEN" {
        return (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response();
    }
    match state.coupons.get(&body.code) {
        Some(response) => Json(response.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Invalid coupon code"})),
        )
            .into_response(),
    }
}

async fn catalog(State(state): State<Shared>) -> Response {
    let mut state = lock(&state);
    state.requests.push("GET /get-product".to_string());
    state.catalog_requests += 1;

    Json(json!({"success": true, "products": state.products})).into_response()
}

async fn product_detail(
    State(state): State<Shared>,
    Path(product_id): Path<String>,
) -> Response {
    let mut state = lock(&state);
    state.requests.push(format!("POST /{product_id}"));

    let found = state
        .products
        .iter()
        .find(|product| product.get("productId").and_then(Value::as_str) == Some(product_id.as_str()))
        .cloned();
    match found {
        Some(product) => Json(json!({"success": true, "product": product})).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "message": "Product not found"})),
        )
            .into_response(),
    }
}
