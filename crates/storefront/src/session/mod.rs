//! Cart session.
//!
//! [`CartSession`] owns the cart the shopper sees and routes every change to
//! where the cart lives:
//!
//! - Guest carts are written to local storage synchronously
//! - Signed-in carts are updated optimistically; the backend request runs in
//!   the background and the line is rolled back if it fails
//!
//! Signing in folds the guest cart into the server cart exactly once (see
//! [`CartSession::login`]).

mod context;
mod mutation;

pub use context::SessionContext;
pub use mutation::{Mutation, PendingMutation};

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bestie_core::{
    Cart, CartSource, DiscountInfo, LineItem, MergeAction, Price, Product, ProductId, Totals,
    UserId, compute_totals, merge_carts,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::backend::{CartBackend, RemoteCartLine};
use crate::coupon::{CouponOutcome, CouponValidator};
use crate::error::CartError;
use crate::storage::LocalCartStore;
use mutation::Undo;

/// Mutable session state shared with in-flight mutations.
#[derive(Debug, Default)]
struct CartState {
    cart: Cart,
    discount: DiscountInfo,
    /// Last quantity the backend confirmed per product (signed-in carts).
    confirmed: HashMap<ProductId, u32>,
    /// Products whose backend request has not completed, by revision.
    in_flight: HashMap<u64, ProductId>,
    next_revision: u64,
}

impl CartState {
    /// Swap in a freshly loaded cart. A signed-in cart is, by definition,
    /// what the backend holds.
    fn replace_cart(&mut self, cart: Cart) {
        self.confirmed = if cart.source().user_id().is_some() {
            cart.items()
                .iter()
                .map(|item| (item.product_id.clone(), item.quantity))
                .collect()
        } else {
            HashMap::new()
        };
        self.cart = cart;
    }

    /// Register a backend request for `product_id` and return its revision.
    fn dispatch(&mut self, product_id: &ProductId) -> u64 {
        self.next_revision += 1;
        self.in_flight.insert(self.next_revision, product_id.clone());
        self.next_revision
    }

    fn is_pending(&self, product_id: &ProductId) -> bool {
        self.in_flight.values().any(|pending| pending == product_id)
    }

    /// Record that the backend now holds `quantity` units of `product_id`.
    fn confirm(&mut self, product_id: &ProductId, quantity: Option<u32>) {
        match quantity {
            Some(quantity) => self.confirmed.insert(product_id.clone(), quantity),
            None => self.confirmed.remove(product_id),
        };
    }
}

fn lock(state: &Mutex<CartState>) -> MutexGuard<'_, CartState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Item count and total for a cart badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub item_count: u64,
    pub total: Price,
}

/// The shopper's cart and where its changes go.
pub struct CartSession {
    context: SessionContext,
    backend: Arc<dyn CartBackend>,
    local: LocalCartStore,
    coupons: CouponValidator,
    state: Arc<Mutex<CartState>>,
}

impl std::fmt::Debug for CartSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSession")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl CartSession {
    /// Open the cart for `context`: the server cart when signed in, the
    /// guest cart otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cart cannot be fetched.
    #[instrument(skip_all, fields(user_id = ?context.user_id()))]
    pub async fn start(
        context: SessionContext,
        backend: Arc<dyn CartBackend>,
    ) -> Result<Self, CartError> {
        let local = LocalCartStore::new(context.storage());
        let coupons = CouponValidator::new(Arc::clone(&backend));
        let session = Self {
            context,
            backend,
            local,
            coupons,
            state: Arc::new(Mutex::new(CartState::default())),
        };
        session.reload().await?;
        Ok(session)
    }

    /// Replace the in-memory cart with the stored one.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cart cannot be fetched.
    pub async fn reload(&self) -> Result<(), CartError> {
        let cart = match self.context.user_id() {
            Some(user_id) => Cart::new(
                CartSource::Authenticated(user_id.clone()),
                self.remote_items(user_id).await?,
            ),
            None => Cart::new(CartSource::Guest, self.local.load()),
        };
        debug!(lines = cart.len(), "Loaded cart");
        lock(&self.state).replace_cart(cart);
        Ok(())
    }

    async fn remote_items(&self, user_id: &UserId) -> Result<Vec<LineItem>, CartError> {
        let lines = self.backend.fetch_cart(user_id).await?;
        let ids: Vec<ProductId> = lines.iter().map(|line| line.product_id.clone()).collect();
        let products = self.backend.fetch_products(&ids).await?;
        Ok(enrich(lines, &products))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn context(&self) -> &SessionContext {
        &self.context
    }

    #[must_use]
    pub fn source(&self) -> CartSource {
        lock(&self.state).cart.source().clone()
    }

    /// Current line items.
    #[must_use]
    pub fn items(&self) -> Vec<LineItem> {
        lock(&self.state).cart.items().to_vec()
    }

    /// Last coupon state.
    #[must_use]
    pub fn discount(&self) -> DiscountInfo {
        lock(&self.state).discount.clone()
    }

    /// Totals for the current items and discount.
    #[must_use]
    pub fn totals(&self) -> Totals {
        let state = lock(&self.state);
        compute_totals(state.cart.items(), state.discount.percentage)
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        let totals = self.totals();
        CartSummary {
            item_count: totals.item_count,
            total: totals.total,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Change the quantity of the line addressed by `key` (product ID, then
    /// cart line ID) by `delta`. A result below 1 leaves the cart unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if a guest cart cannot be saved; the change is
    /// reverted.
    ///
    /// # Panics
    ///
    /// Panics if called on a signed-in cart outside a Tokio runtime.
    #[instrument(skip(self))]
    pub fn change_quantity(&self, key: &str, delta: i64) -> Result<Mutation, CartError> {
        let mut state = lock(&self.state);
        let Some(index) = state.cart.position(key) else {
            debug!("No cart line for key");
            return Ok(Mutation::Unchanged);
        };
        let Some(item) = state.cart.items().get(index).cloned() else {
            return Ok(Mutation::Unchanged);
        };
        let previous = item.quantity;
        let product_id = item.product_id.clone();

        let Some(quantity) = i64::from(previous)
            .checked_add(delta)
            .filter(|quantity| *quantity >= 1)
            .map(|quantity| u32::try_from(quantity).unwrap_or(u32::MAX))
        else {
            return Ok(Mutation::Unchanged);
        };
        if quantity == previous {
            return Ok(Mutation::Unchanged);
        }

        state.cart.set_quantity(index, quantity);
        let undo = Undo::Quantity { index, item };

        let Some(user_id) = state.cart.source().user_id().cloned() else {
            self.save_guest(&mut state, &undo)?;
            return Ok(Mutation::Saved);
        };

        let revision = state.dispatch(&product_id);
        drop(state);

        let backend = Arc::clone(&self.backend);
        Ok(Mutation::Pending(PendingMutation::spawn(
            Arc::clone(&self.state),
            revision,
            undo,
            Some(quantity),
            async move { backend.set_quantity(&user_id, &product_id, quantity).await },
        )))
    }

    /// Remove the line addressed by `key`. Unknown keys leave the cart
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if a guest cart cannot be saved; the line is
    /// restored.
    ///
    /// # Panics
    ///
    /// Panics if called on a signed-in cart outside a Tokio runtime.
    #[instrument(skip(self))]
    pub fn remove_item(&self, key: &str) -> Result<Mutation, CartError> {
        let mut state = lock(&self.state);
        let Some((index, item)) = state.cart.remove(key) else {
            debug!("No cart line for key");
            return Ok(Mutation::Unchanged);
        };
        let product_id = item.product_id.clone();
        let undo = Undo::Restore { index, item };

        let Some(user_id) = state.cart.source().user_id().cloned() else {
            self.save_guest(&mut state, &undo)?;
            return Ok(Mutation::Saved);
        };

        let revision = state.dispatch(&product_id);
        drop(state);

        let backend = Arc::clone(&self.backend);
        Ok(Mutation::Pending(PendingMutation::spawn(
            Arc::clone(&self.state),
            revision,
            undo,
            None,
            async move { backend.remove_item(&user_id, &product_id).await },
        )))
    }

    /// Add `quantity` units of `product`, updating the existing line if the
    /// product is already in the cart. Returns the line's new quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfStock`] or [`CartError::StockLimit`] when
    /// the stock does not allow it, or the storage/backend error.
    #[instrument(skip(self, product), fields(product_id = %product.product_id))]
    pub async fn add_item(&self, product: &Product, quantity: u32) -> Result<u32, CartError> {
        let quantity = quantity.max(1);
        let key = product.product_id.as_str();

        let user_id = {
            let mut state = lock(&self.state);
            let existing = state
                .cart
                .position(key)
                .and_then(|index| Some((index, state.cart.items().get(index)?.clone())));
            let current = existing.as_ref().map_or(0, |(_, item)| item.quantity);
            check_stock(product, current, quantity)?;

            match state.cart.source().user_id().cloned() {
                Some(user_id) => user_id,
                None => {
                    let total = state.cart.upsert(product.to_line_item(quantity));
                    let undo = match existing {
                        Some((index, item)) => Undo::Quantity { index, item },
                        None => Undo::Remove {
                            product_id: product.product_id.clone(),
                        },
                    };
                    self.save_guest(&mut state, &undo)?;
                    info!(quantity = total, "Added to guest cart");
                    return Ok(total);
                }
            }
        };

        self.backend
            .add_item(&user_id, &product.product_id, quantity)
            .await?;

        let mut state = lock(&self.state);
        let total = state.cart.upsert(product.to_line_item(quantity));
        let confirmed = state.confirmed.entry(product.product_id.clone()).or_insert(0);
        *confirmed = confirmed.saturating_add(quantity);
        info!(quantity = total, "Added to cart");
        Ok(total)
    }

    /// Persist the guest cart, reverting `undo`'s mutation if the write
    /// fails.
    fn save_guest(&self, state: &mut CartState, undo: &Undo) -> Result<(), CartError> {
        if let Err(e) = self.local.save(state.cart.items()) {
            error!(error = %e, "Failed to save guest cart");
            undo.apply(&mut state.cart);
            return Err(e.into());
        }
        Ok(())
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// Redeem `code` and apply the outcome to the session's discount. An
    /// unrecognized response keeps the previous discount.
    pub async fn apply_coupon(&self, code: &str) -> CouponOutcome {
        let outcome = self.coupons.redeem(code).await;
        let mut state = lock(&self.state);
        let discount = outcome.resolve(&state.discount);
        state.discount = discount;
        outcome
    }

    // =========================================================================
    // Sign-in
    // =========================================================================

    /// Sign in as `user_id`, folding the guest cart into the server cart.
    ///
    /// Quantities of shared products are summed and capped at stock. Each
    /// merged line is pushed to the backend and then dropped from the stored
    /// guest cart, so a retry after a partial failure does not count it
    /// twice. The guest cart is cleared once everything is pushed.
    ///
    /// # Errors
    ///
    /// Returns an error if another user is signed in, or if fetching or
    /// pushing the cart fails. The session stays signed out in that case.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn login(&mut self, user_id: UserId) -> Result<(), CartError> {
        match self.context.user_id() {
            Some(current) if *current == user_id => return Ok(()),
            Some(_) => {
                return Err(CartError::Validation(
                    "Another user is already signed in".to_string(),
                ));
            }
            None => {}
        }

        let guest = self.local.load();
        let server_lines = self.backend.fetch_cart(&user_id).await?;

        let mut seen = HashSet::new();
        let ids: Vec<ProductId> = server_lines
            .iter()
            .map(|line| &line.product_id)
            .chain(guest.iter().map(|item| &item.product_id))
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect();
        let products = self.backend.fetch_products(&ids).await?;

        let server = enrich(server_lines, &products);
        let guest: Vec<LineItem> = guest
            .into_iter()
            .filter_map(|mut item| match products.get(&item.product_id) {
                Some(product) if product.stock() > 0 => {
                    item.stock = product.in_stock;
                    Some(item)
                }
                Some(_) => {
                    warn!(product_id = %item.product_id, "Dropping out-of-stock guest line");
                    None
                }
                None => {
                    warn!(product_id = %item.product_id, "Dropping guest line for unknown product");
                    None
                }
            })
            .collect();

        let merged = merge_carts(&server, &guest);
        let mut remaining = guest;
        for line in &merged {
            let product_id = &line.item.product_id;
            match line.action {
                MergeAction::Keep => continue,
                MergeAction::Update => {
                    self.backend
                        .set_quantity(&user_id, product_id, line.item.quantity)
                        .await?;
                }
                MergeAction::Add => {
                    self.backend
                        .add_item(&user_id, product_id, line.item.quantity)
                        .await?;
                }
            }
            remaining.retain(|item| item.product_id != *product_id);
            self.local.save(&remaining)?;
        }

        self.local.clear()?;
        self.context.sign_in(user_id.clone())?;

        let items: Vec<LineItem> = merged.into_iter().map(|line| line.item).collect();
        info!(lines = items.len(), "Signed in and merged guest cart");
        lock(&self.state).replace_cart(Cart::new(CartSource::Authenticated(user_id), items));
        Ok(())
    }

    /// Sign out and switch back to the (empty after a merge) guest cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored session cannot be removed.
    #[instrument(skip(self))]
    pub fn logout(&mut self) -> Result<(), CartError> {
        self.context.sign_out()?;
        let mut state = lock(&self.state);
        state.replace_cart(Cart::new(CartSource::Guest, self.local.load()));
        state.discount = DiscountInfo::default();
        info!("Signed out");
        Ok(())
    }
}

/// Turn server lines into line items using the looked-up products. Lines
/// whose product is unknown are dropped.
fn enrich(lines: Vec<RemoteCartLine>, products: &HashMap<ProductId, Product>) -> Vec<LineItem> {
    lines
        .into_iter()
        .filter_map(|line| {
            let Some(product) = products.get(&line.product_id) else {
                warn!(product_id = %line.product_id, "Dropping cart line for unknown product");
                return None;
            };
            let mut item = product.to_line_item(line.quantity);
            item.cart_item_id = line.cart_item_id;
            Some(item)
        })
        .collect()
}

fn check_stock(product: &Product, current: u32, quantity: u32) -> Result<(), CartError> {
    let available = product.stock();
    if available == 0 {
        return Err(CartError::OutOfStock(product.name.clone()));
    }
    if current.saturating_add(quantity) > available {
        return Err(CartError::StockLimit {
            product: product.name.clone(),
            available,
        });
    }
    Ok(())
}
