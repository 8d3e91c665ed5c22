//! Guest cart merge at sign-in.
//!
//! When a guest signs in, the lines they collected anonymously are folded into
//! the cart the backend already holds for them. Lines are matched by product;
//! quantities are summed and capped at the known stock. Server lines keep
//! their order, guest-only lines follow in guest order.

use std::collections::HashMap;

use crate::types::{LineItem, ProductId};

/// What the backend must be told about a merged line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// Server line untouched by the guest cart.
    Keep,
    /// Server line whose quantity changed; push the new quantity.
    Update,
    /// Guest-only line; add it to the server cart.
    Add,
}

/// A line of the merged cart and how it was derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedLine {
    pub item: LineItem,
    pub action: MergeAction,
}

/// Merge `guest` lines into `server` lines.
///
/// Stock known on the server line wins over the guest snapshot. A quantity is
/// never capped below 1.
#[must_use]
pub fn merge_carts(server: &[LineItem], guest: &[LineItem]) -> Vec<MergedLine> {
    let mut guest_quantities: HashMap<&ProductId, (u32, Option<u32>)> = HashMap::new();
    let mut guest_order: Vec<&LineItem> = Vec::new();
    for item in guest {
        let entry = guest_quantities
            .entry(&item.product_id)
            .or_insert_with(|| {
                guest_order.push(item);
                (0, item.stock)
            });
        entry.0 = entry.0.saturating_add(item.quantity.max(1));
    }

    let mut merged: Vec<MergedLine> = Vec::with_capacity(server.len() + guest_order.len());
    for line in server {
        let Some((guest_quantity, guest_stock)) = guest_quantities.remove(&line.product_id) else {
            merged.push(MergedLine {
                item: line.clone(),
                action: MergeAction::Keep,
            });
            continue;
        };

        let stock = line.stock.or(guest_stock);
        let quantity = cap(line.quantity.saturating_add(guest_quantity), stock);
        let mut item = line.clone();
        item.stock = stock;
        let action = if quantity == line.quantity {
            MergeAction::Keep
        } else {
            MergeAction::Update
        };
        item.quantity = quantity;
        merged.push(MergedLine { item, action });
    }

    for line in guest_order {
        let Some((quantity, stock)) = guest_quantities.remove(&line.product_id) else {
            continue;
        };
        let mut item = line.clone();
        item.quantity = cap(quantity, stock);
        item.cart_item_id = None;
        merged.push(MergedLine {
            item,
            action: MergeAction::Add,
        });
    }

    merged
}

fn cap(quantity: u32, stock: Option<u32>) -> u32 {
    stock.map_or(quantity, |stock| quantity.min(stock)).max(1)
}
