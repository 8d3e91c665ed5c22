//! Cart and line item types.
//!
//! A cart holds at most one line per product. Lines are addressed by
//! `productId`, with the server-assigned `cartItemId` as a fallback key.

use serde::{Deserialize, Serialize};

use super::id::{CartItemId, ProductId, UserId};
use super::price::Price;

/// A single product line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// External product identifier; the line's stable key.
    pub product_id: ProductId,
    /// Display name, copied from the product at add-time.
    #[serde(default)]
    pub name: String,
    /// Image URL, copied from the product at add-time.
    #[serde(default)]
    pub img: String,
    /// Description, copied from the product at add-time.
    #[serde(default)]
    pub description: String,
    /// Unit price.
    #[serde(default)]
    pub price: Price,
    /// Number of units, never below 1.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Server-side cart line identifier, only for authenticated carts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_item_id: Option<CartItemId>,
    /// Stock available when the line was added or last refreshed.
    #[serde(
        default,
        deserialize_with = "super::product::lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub stock: Option<u32>,
    /// Product category, display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

impl LineItem {
    /// Line total (`price × quantity`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }

    /// Whether `key` addresses this line by product or cart line ID.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.product_id.as_str() == key
            || self
                .cart_item_id
                .as_ref()
                .is_some_and(|id| id.as_str() == key)
    }
}

/// Which backing store receives a cart's mutations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CartSource {
    /// Anonymous visitor; the cart lives in local storage.
    #[default]
    Guest,
    /// Signed-in user; the cart lives on the backend.
    Authenticated(UserId),
}

impl CartSource {
    /// The signed-in user, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Guest => None,
            Self::Authenticated(user_id) => Some(user_id),
        }
    }
}

/// An ordered set of line items, unique by product.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cart {
    items: Vec<LineItem>,
    source: CartSource,
}

impl Cart {
    /// Build a cart, folding duplicate products into the first occurrence
    /// and lifting zero quantities to 1.
    #[must_use]
    pub fn new(source: CartSource, items: Vec<LineItem>) -> Self {
        let mut cart = Self {
            items: Vec::with_capacity(items.len()),
            source,
        };
        for mut item in items {
            item.quantity = item.quantity.max(1);
            cart.upsert(item);
        }
        cart
    }

    /// Empty guest cart.
    #[must_use]
    pub fn guest() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub const fn source(&self) -> &CartSource {
        &self.source
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Index of the line addressed by `key`: product ID first, then cart
    /// line ID.
    #[must_use]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.product_id.as_str() == key)
            .or_else(|| {
                self.items.iter().position(|item| {
                    item.cart_item_id
                        .as_ref()
                        .is_some_and(|id| id.as_str() == key)
                })
            })
    }

    /// The line addressed by `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&LineItem> {
        self.position(key).and_then(|index| self.items.get(index))
    }

    /// Set the quantity of the line at `index`. Returns the previous
    /// quantity, or `None` if the index is out of range or `quantity` is 0.
    pub fn set_quantity(&mut self, index: usize, quantity: u32) -> Option<u32> {
        if quantity == 0 {
            return None;
        }
        let item = self.items.get_mut(index)?;
        Some(std::mem::replace(&mut item.quantity, quantity))
    }

    /// Remove the line addressed by `key`, returning it with its former index.
    pub fn remove(&mut self, key: &str) -> Option<(usize, LineItem)> {
        let index = self.position(key)?;
        Some((index, self.items.remove(index)))
    }

    /// Re-insert a previously removed line at `index` (clamped to the end).
    /// Does nothing if the product is already present.
    pub fn restore(&mut self, index: usize, item: LineItem) {
        if self.position(item.product_id.as_str()).is_some() {
            return;
        }
        let index = index.min(self.items.len());
        self.items.insert(index, item);
    }

    /// Add a line, or add its quantity to the existing line for the same
    /// product. Returns the resulting quantity.
    pub fn upsert(&mut self, item: LineItem) -> u32 {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|existing| existing.product_id == item.product_id)
        {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            if existing.cart_item_id.is_none() {
                existing.cart_item_id = item.cart_item_id;
            }
            if item.stock.is_some() {
                existing.stock = item.stock;
            }
            return existing.quantity;
        }
        let quantity = item.quantity;
        self.items.push(item);
        quantity
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Consume the cart, returning its lines.
    #[must_use]
    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn item(product_id: &str, quantity: u32) -> LineItem {
        LineItem {
            product_id: ProductId::new(product_id),
            name: format!("Product {product_id}"),
            img: String::new(),
            description: String::new(),
            price: Price::from_minor(1_000),
            quantity,
            cart_item_id: None,
            stock: None,
            category: None,
        }
    }

    #[test]
    fn test_new_folds_duplicates_and_lifts_zero() {
        let cart = Cart::new(
            CartSource::Guest,
            vec![item("a", 1), item("b", 0), item("a", 2)],
        );
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.get("a").unwrap().quantity, 3);
        assert_eq!(cart.get("b").unwrap().quantity, 1);
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn test_position_falls_back_to_cart_item_id() {
        let mut server_line = item("a", 1);
        server_line.cart_item_id = Some(CartItemId::new("line-9"));
        let cart = Cart::new(
            CartSource::Authenticated(UserId::new("u")),
            vec![item("b", 1), server_line],
        );

        assert_eq!(cart.position("a"), Some(1));
        assert_eq!(cart.position("line-9"), Some(1));
        assert_eq!(cart.position("missing"), None);
        assert!(cart.get("line-9").unwrap().matches("a"));
    }

    #[test]
    fn test_set_quantity_rejects_zero() {
        let mut cart = Cart::new(CartSource::Guest, vec![item("a", 2)]);
        assert_eq!(cart.set_quantity(0, 0), None);
        assert_eq!(cart.set_quantity(0, 5), Some(2));
        assert_eq!(cart.set_quantity(3, 5), None);
        assert_eq!(cart.get("a").unwrap().quantity, 5);
    }

    #[test]
    fn test_remove_and_restore_keep_order() {
        let mut cart = Cart::new(
            CartSource::Guest,
            vec![item("a", 1), item("b", 1), item("c", 1)],
        );
        let (index, removed) = cart.remove("b").unwrap();
        assert_eq!(index, 1);
        assert!(cart.remove("b").is_none());

        cart.restore(index, removed.clone());
        let ids: Vec<&str> = cart.items().iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        // Restoring a product that is already present is a no-op
        cart.restore(0, removed);
        assert_eq!(cart.len(), 3);
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let mut cart = Cart::guest();
        assert_eq!(cart.upsert(item("a", 1)), 1);
        assert_eq!(cart.upsert(item("a", 2)), 3);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_line_item_defaults_when_fields_missing() {
        let parsed: LineItem = serde_json::from_str(r#"{"productId": "x", "price": "₹10"}"#).unwrap();
        assert_eq!(parsed.quantity, 1);
        assert_eq!(parsed.price, Price::from_minor(1_000));
        assert_eq!(parsed.line_total(), Price::from_minor(1_000));
    }

    #[test]
    fn test_line_item_accepts_string_stock() {
        let items: Vec<LineItem> = serde_json::from_str(
            r#"[
                {"productId": "a", "price": "₹100", "quantity": 2, "stock": "12"},
                {"productId": "b", "price": 50, "stock": 5},
                {"productId": "c", "price": 50, "stock": "n/a"}
            ]"#,
        )
        .unwrap();

        assert_eq!(items[0].stock, Some(12));
        assert_eq!(items[1].stock, Some(5));
        assert_eq!(items[2].stock, None);
        assert_eq!(serde_json::to_value(&items[0]).unwrap()["stock"], 12);
    }
}
