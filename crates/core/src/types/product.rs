//! Catalog product snapshot as returned by the backend.

use serde::{Deserialize, Deserializer, Serialize};

use super::cart::LineItem;
use super::id::ProductId;
use super::price::Price;

/// A product as listed by the catalog endpoints.
///
/// Only the fields the cart needs are modelled; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// External product identifier.
    pub product_id: ProductId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Unit price.
    #[serde(default)]
    pub price: Price,
    /// Primary image URL.
    #[serde(default)]
    pub img: String,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Catalog category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Units currently available.
    #[serde(
        rename = "inStockValue",
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub in_stock: Option<u32>,
}

impl Product {
    /// Units available; a missing stock value counts as none.
    #[must_use]
    pub fn stock(&self) -> u32 {
        self.in_stock.unwrap_or(0)
    }

    /// Snapshot this product into a cart line.
    #[must_use]
    pub fn to_line_item(&self, quantity: u32) -> LineItem {
        LineItem {
            product_id: self.product_id.clone(),
            name: self.name.clone(),
            img: self.img.clone(),
            description: self.description.clone(),
            price: self.price,
            quantity: quantity.max(1),
            cart_item_id: None,
            stock: self.in_stock,
            category: self.category.clone(),
        }
    }
}

/// Stock counts are entered through an admin form and come back as either
/// numbers or numeric strings. Guest carts store the same value verbatim.
pub(super) fn lenient_count<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Float(f64),
        Text(String),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value {
        Raw::Int(n) => Some(u32::try_from(n).unwrap_or(u32::MAX)),
        Raw::Float(f) if f.is_finite() && f >= 0.0 => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped above
            let n = f.min(f64::from(u32::MAX)) as u32;
            Some(n)
        }
        Raw::Float(_) => None,
        Raw::Text(s) => s.trim().parse::<u32>().ok(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserializes_backend_shape() {
        let product: Product = serde_json::from_str(
            r#"{
                "_id": "66f0",
                "productId": "p-1",
                "name": "Teddy",
                "price": "₹499",
                "img": "https://img/teddy.jpg",
                "category": "Soft Toys",
                "inStockValue": "12",
                "soldStockValue": 3,
                "visibility": "on"
            }"#,
        )
        .unwrap();

        assert_eq!(product.product_id, ProductId::new("p-1"));
        assert_eq!(product.price, Price::from_minor(49_900));
        assert_eq!(product.stock(), 12);
        assert!(product.description.is_empty());
    }

    #[test]
    fn test_missing_stock_is_zero() {
        let product: Product =
            serde_json::from_str(r#"{"productId": "p-2", "inStockValue": null}"#).unwrap();
        assert_eq!(product.in_stock, None);
        assert_eq!(product.stock(), 0);
    }

    #[test]
    fn test_to_line_item_copies_snapshot() {
        let product: Product = serde_json::from_str(
            r#"{"productId": "p-3", "name": "Mug", "price": 250, "inStockValue": 4}"#,
        )
        .unwrap();

        let item = product.to_line_item(2);
        assert_eq!(item.product_id, product.product_id);
        assert_eq!(item.name, "Mug");
        assert_eq!(item.price, Price::from_minor(25_000));
        assert_eq!(item.quantity, 2);
        assert_eq!(item.stock, Some(4));
        assert_eq!(product.to_line_item(0).quantity, 1);
    }
}
