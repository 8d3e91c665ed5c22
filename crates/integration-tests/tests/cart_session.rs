//! Integration tests for the cart session over HTTP and file storage.

use std::path::Path;
use std::sync::Arc;

use bestie_core::{CartSource, ProductId, UserId};
use bestie_integration_tests::{MockBackend, MockState, product};
use bestie_storefront::{
    CartBackend, CartError, CartSession, FileStorage, HttpBackend, LocalStorage, SessionContext,
};
use serde_json::json;

fn shop() -> MockState {
    MockState::default()
        .with_product(product("p-1", "Teddy", "₹100", 10))
        .with_product(product("p-2", "Mug", "₹50.5", 5))
        .with_product(product("p-3", "Keychain", "₹20", 2))
        .with_coupon("SAVE10", json!({"discountPercentage": 10}))
}

struct Harness {
    mock: MockBackend,
    backend: Arc<HttpBackend>,
    storage: Arc<dyn LocalStorage>,
    tmp: tempfile::TempDir,
}

impl Harness {
    async fn new(state: MockState) -> Self {
        let mock = MockBackend::start(state).await;
        let backend = Arc::new(HttpBackend::new(&mock.config()).expect("Failed to build client"));
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let storage: Arc<dyn LocalStorage> = Arc::new(FileStorage::new(dir.path()));
        Self {
            mock,
            backend,
            storage,
            tmp: dir,
        }
    }

    fn dir(&self) -> &Path {
        self.tmp.path()
    }

    async fn session(&self) -> CartSession {
        let context = SessionContext::load(Arc::clone(&self.storage));
        CartSession::start(context, self.backend.clone())
            .await
            .expect("Failed to start session")
    }

    async fn add(&self, session: &CartSession, product_id: &str, quantity: u32) -> u32 {
        let product = self
            .backend
            .fetch_product(&ProductId::new(product_id))
            .await
            .expect("Failed to fetch product");
        session
            .add_item(&product, quantity)
            .await
            .expect("Failed to add item")
    }
}

fn quantities(session: &CartSession) -> Vec<(String, u32)> {
    session
        .items()
        .iter()
        .map(|item| (item.product_id.to_string(), item.quantity))
        .collect()
}

fn pairs(expected: &[(&str, u32)]) -> Vec<(String, u32)> {
    expected
        .iter()
        .map(|(id, quantity)| ((*id).to_string(), *quantity))
        .collect()
}

// ============================================================================
// Guest
// ============================================================================

#[tokio::test]
async fn test_guest_cart_survives_restart() {
    let harness = Harness::new(shop()).await;
    let session = harness.session().await;
    assert_eq!(session.source(), CartSource::Guest);

    assert_eq!(harness.add(&session, "p-1", 1).await, 1);
    harness.add(&session, "p-2", 1).await;
    harness.add(&session, "p-3", 1).await;
    session
        .change_quantity("p-1", 1)
        .expect("Failed to change quantity")
        .settle()
        .await
        .expect("Guest change should not hit the backend");
    session
        .remove_item("p-3")
        .expect("Failed to remove item")
        .settle()
        .await
        .expect("Guest removal should not hit the backend");

    assert!(harness.dir().join("guestCart.json").exists());
    let reopened = harness.session().await;
    assert_eq!(quantities(&reopened), pairs(&[("p-1", 2), ("p-2", 1)]));

    let outcome = reopened.apply_coupon("SAVE10").await;
    assert_eq!(outcome.message(), "10% discount applied!");
    let totals = reopened.totals();
    assert_eq!(totals.subtotal.to_string(), "250.50");
    assert_eq!(totals.discount.to_string(), "25.05");
    assert_eq!(totals.total.display_with("Rs."), "Rs. 225.45");
}

#[tokio::test]
async fn test_stock_limits_apply_to_guest_cart() {
    let harness = Harness::new(shop()).await;
    let session = harness.session().await;

    harness.add(&session, "p-3", 2).await;
    let keychain = harness
        .backend
        .fetch_product(&ProductId::new("p-3"))
        .await
        .expect("Failed to fetch product");
    let err = session
        .add_item(&keychain, 1)
        .await
        .expect_err("Third keychain exceeds stock");
    assert!(matches!(err, CartError::StockLimit { available: 2, .. }));
    assert_eq!(
        err.user_message(),
        "Cannot add more items than available in stock"
    );
}

// ============================================================================
// Sign-in
// ============================================================================

#[tokio::test]
async fn test_login_merges_guest_cart_into_server_cart() {
    let harness = Harness::new(shop().with_cart("u-1", &[("p-1", 2), ("p-2", 1)])).await;
    let mut session = harness.session().await;
    harness.add(&session, "p-1", 1).await;
    harness.add(&session, "p-3", 2).await;

    session
        .login(UserId::new("u-1"))
        .await
        .expect("Failed to log in");

    let expected = pairs(&[("p-1", 3), ("p-2", 1), ("p-3", 2)]);
    assert_eq!(quantities(&session), expected);
    assert_eq!(harness.mock.state().quantities("u-1"), expected);
    assert!(!harness.dir().join("guestCart.json").exists());
    assert!(harness.dir().join("session.json").exists());

    // A new session picks the signed-in cart back up from the server
    let restored = harness.session().await;
    assert_eq!(
        restored.source(),
        CartSource::Authenticated(UserId::new("u-1"))
    );
    assert_eq!(quantities(&restored), expected);
    assert!(
        restored
            .items()
            .iter()
            .all(|item| item.cart_item_id.is_some())
    );
}

#[tokio::test]
async fn test_first_login_creates_server_cart() {
    let harness = Harness::new(shop()).await;
    let mut session = harness.session().await;
    harness.add(&session, "p-2", 2).await;

    session
        .login(UserId::new("newcomer"))
        .await
        .expect("Failed to log in");

    assert_eq!(
        harness.mock.state().quantities("newcomer"),
        pairs(&[("p-2", 2)])
    );

    session.logout().expect("Failed to log out");
    assert_eq!(session.source(), CartSource::Guest);
    assert!(session.items().is_empty());
    assert!(!harness.dir().join("session.json").exists());
}

// ============================================================================
// Signed-in mutations
// ============================================================================

#[tokio::test]
async fn test_remote_mutations_and_rollback() {
    let harness = Harness::new(shop().with_cart("u-1", &[("p-1", 2), ("p-2", 1)])).await;
    let mut session = harness.session().await;
    session
        .login(UserId::new("u-1"))
        .await
        .expect("Failed to log in");

    session
        .change_quantity("p-1", 1)
        .expect("Failed to change quantity")
        .settle()
        .await
        .expect("Update should succeed");
    assert_eq!(
        harness.mock.state().quantities("u-1"),
        pairs(&[("p-1", 3), ("p-2", 1)])
    );

    harness.mock.state().fail_next_update = true;
    let mutation = session
        .change_quantity("p-1", 1)
        .expect("Failed to change quantity");
    assert_eq!(quantities(&session), pairs(&[("p-1", 4), ("p-2", 1)]));
    let err = mutation.settle().await.expect_err("Update should fail");
    assert!(matches!(err, CartError::Server(_)));
    assert_eq!(quantities(&session), pairs(&[("p-1", 3), ("p-2", 1)]));

    session
        .remove_item("p-2")
        .expect("Failed to remove item")
        .settle()
        .await
        .expect("Removal should succeed");
    assert_eq!(
        harness.mock.state().quantities("u-1"),
        pairs(&[("p-1", 3)])
    );
    assert_eq!(session.summary().item_count, 3);
}
