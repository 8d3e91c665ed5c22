//! Optimistic cart mutations.
//!
//! A mutation is applied to the in-memory cart first. For signed-in carts the
//! backend request then runs on a spawned task. When a request fails (or is
//! cancelled) and no other request for the same product is still running,
//! the line is put back to the last quantity the backend confirmed.

use std::future::Future;
use std::sync::{Arc, Mutex};

use bestie_core::{Cart, LineItem, ProductId};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::{CartState, lock};
use crate::error::CartError;

/// How to put a line back after a failed mutation.
#[derive(Debug, Clone)]
pub(super) enum Undo {
    /// Restore the quantity of the line as it was before the change.
    Quantity { index: usize, item: LineItem },
    /// Re-insert a removed line at its former position.
    Restore { index: usize, item: LineItem },
    /// Drop a line that the mutation added.
    Remove { product_id: ProductId },
}

impl Undo {
    fn product_id(&self) -> &ProductId {
        match self {
            Self::Remove { product_id } => product_id,
            Self::Quantity { item, .. } | Self::Restore { item, .. } => &item.product_id,
        }
    }

    /// Revert a local change that could not be saved.
    pub(super) fn apply(&self, cart: &mut Cart) {
        match self {
            Self::Quantity { item, .. } => {
                if let Some(index) = cart.position(item.product_id.as_str()) {
                    cart.set_quantity(index, item.quantity);
                }
            }
            Self::Restore { index, item } => cart.restore(*index, item.clone()),
            Self::Remove { product_id } => {
                cart.remove(product_id.as_str());
            }
        }
    }

    /// Reset the line to the backend's last confirmed quantity after a failed
    /// request. Returns whether the line was reset.
    fn reconcile(&self, state: &mut CartState) -> bool {
        let product_id = self.product_id();
        if state.is_pending(product_id) {
            debug!(product_id = %product_id, "Later request still running, keeping current line");
            return false;
        }

        let confirmed = state.confirmed.get(product_id).copied();
        match (confirmed, state.cart.position(product_id.as_str())) {
            (Some(quantity), Some(index)) => {
                state.cart.set_quantity(index, quantity);
            }
            (Some(quantity), None) => {
                if let Self::Quantity { index, item } | Self::Restore { index, item } = self {
                    let mut item = item.clone();
                    item.quantity = quantity;
                    state.cart.restore(*index, item);
                }
            }
            (None, Some(_)) => {
                state.cart.remove(product_id.as_str());
            }
            (None, None) => {}
        }
        true
    }
}

/// Result of a cart mutation.
#[derive(Debug)]
#[must_use]
pub enum Mutation {
    /// Nothing changed: unknown item, or the quantity would drop below 1.
    Unchanged,
    /// Applied and written to local storage.
    Saved,
    /// Applied in memory; the backend request is running.
    Pending(PendingMutation),
}

impl Mutation {
    /// Whether the cart changed.
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// Wait for the backend request, if any.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the item has been rolled back by then.
    pub async fn settle(self) -> Result<(), CartError> {
        match self {
            Self::Pending(pending) => pending.settle().await,
            Self::Unchanged | Self::Saved => Ok(()),
        }
    }
}

/// Handle to a backend request dispatched by an optimistic mutation.
///
/// Dropping the handle detaches the request; it still rolls the item back on
/// failure.
pub struct PendingMutation {
    handle: JoinHandle<Result<(), CartError>>,
    state: Arc<Mutex<CartState>>,
    revision: u64,
    undo: Undo,
}

impl std::fmt::Debug for PendingMutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingMutation")
            .field("product_id", self.undo.product_id())
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl PendingMutation {
    /// Spawn `request` for the mutation registered at `revision` (see
    /// `CartState::dispatch`). On success the backend holds `target` units of
    /// the product, `None` meaning the line is gone.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub(super) fn spawn<F>(
        state: Arc<Mutex<CartState>>,
        revision: u64,
        undo: Undo,
        target: Option<u32>,
        request: F,
    ) -> Self
    where
        F: Future<Output = Result<(), CartError>> + Send + 'static,
    {
        let task_state = Arc::clone(&state);
        let task_undo = undo.clone();
        let handle = tokio::spawn(async move {
            let result = request.await;

            let mut state = lock(&task_state);
            state.in_flight.remove(&revision);
            let product_id = task_undo.product_id();
            match &result {
                Ok(()) => state.confirm(product_id, target),
                Err(e) => {
                    error!(error = %e, product_id = %product_id, "Cart update failed");
                    if task_undo.reconcile(&mut state) {
                        warn!(product_id = %product_id, "Rolled back cart line");
                    }
                }
            }
            result
        });

        Self {
            handle,
            state,
            revision,
            undo,
        }
    }

    /// Whether the request has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the request to complete.
    ///
    /// # Errors
    ///
    /// Returns the backend error, or [`CartError::Cancelled`] if the task was
    /// aborted before it completed.
    pub async fn settle(self) -> Result<(), CartError> {
        let Self {
            handle,
            state,
            revision,
            undo,
        } = self;

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Cart update task did not complete");
                let mut state = lock(&state);
                if state.in_flight.remove(&revision).is_some() {
                    undo.reconcile(&mut state);
                }
                Err(CartError::Cancelled)
            }
        }
    }

    /// Abort the request and roll the item back if it had not completed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Cancelled`] when the abort took effect, otherwise
    /// the request's own result.
    pub async fn cancel(self) -> Result<(), CartError> {
        self.handle.abort();
        self.settle().await
    }
}
