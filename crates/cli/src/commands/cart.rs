//! Cart commands.

use bestie_core::ProductId;
use bestie_storefront::{CartBackend, CartError, RecentlyViewed};
use tracing::{info, warn};

use super::App;
use crate::output;

/// Print the cart, applying `coupon` first when given.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded.
pub async fn show(app: &App, coupon: Option<&str>) -> Result<(), CartError> {
    let session = app.session().await?;

    if let Some(code) = coupon {
        let outcome = session.apply_coupon(code).await;
        output::message(outcome.message());
    }

    output::cart(
        &session.items(),
        &session.totals(),
        &session.discount(),
        app.currency(),
    );
    Ok(())
}

/// Add `quantity` units of a product and remember it as recently viewed.
///
/// # Errors
///
/// Returns an error if the product cannot be found or added.
pub async fn add(app: &App, product_id: &str, quantity: u32) -> Result<(), CartError> {
    let product = app
        .backend
        .fetch_product(&ProductId::new(product_id))
        .await?;

    let viewed = RecentlyViewed::new(app.storage.clone());
    if let Err(e) = viewed.record(&product) {
        warn!(error = %e, "Failed to record recently viewed product");
    }

    let session = app.session().await?;
    let total = session.add_item(&product, quantity).await?;
    info!(product_id, quantity = total, "Product added");

    output::message(&format!("{} added to cart ({total} in cart)", product.name));
    output::summary(&session.summary(), app.currency());
    Ok(())
}

/// Change the quantity of the line addressed by `key` by `delta`.
///
/// # Errors
///
/// Returns an error if the change cannot be saved; the line is rolled back.
pub async fn change(app: &App, key: &str, delta: i64) -> Result<(), CartError> {
    let session = app.session().await?;
    let mutation = session.change_quantity(key, delta)?;
    if !mutation.is_changed() {
        output::message("Cart unchanged");
        return Ok(());
    }
    mutation.settle().await?;

    output::summary(&session.summary(), app.currency());
    Ok(())
}

/// Remove the line addressed by `key`.
///
/// # Errors
///
/// Returns an error if the removal cannot be saved; the line is restored.
pub async fn remove(app: &App, key: &str) -> Result<(), CartError> {
    let session = app.session().await?;
    let mutation = session.remove_item(key)?;
    if !mutation.is_changed() {
        output::message("Cart unchanged");
        return Ok(());
    }
    mutation.settle().await?;

    output::message("Item removed from cart");
    output::summary(&session.summary(), app.currency());
    Ok(())
}
