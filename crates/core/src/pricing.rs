//! Cart pricing.
//!
//! Totals are a pure function of the line items and the applied discount
//! percentage. Amounts are summed in minor units, so the subtotal does not
//! depend on line order. Shipping is currently always free.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{LineItem, Price};

/// Derived cart totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    pub subtotal: Price,
    pub discount: Price,
    pub shipping: Price,
    pub total: Price,
    /// Sum of quantities.
    pub item_count: u64,
}

/// Sum of `price × quantity` over all lines.
#[must_use]
pub fn subtotal(items: &[LineItem]) -> Price {
    items.iter().map(LineItem::line_total).sum()
}

/// Discount for `percentage` (clamped to 0–100) of `subtotal`.
#[must_use]
pub fn discount_amount(subtotal: Price, percentage: Decimal) -> Price {
    let percentage = percentage.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    if percentage.is_zero() {
        return Price::ZERO;
    }

    subtotal
        .to_decimal()
        .checked_mul(percentage)
        .and_then(|amount| amount.checked_div(Decimal::ONE_HUNDRED))
        .map_or(Price::ZERO, Price::from_decimal)
}

/// Compute totals for a cart.
#[must_use]
pub fn compute_totals(items: &[LineItem], discount_percentage: Decimal) -> Totals {
    let subtotal = subtotal(items);
    let discount = discount_amount(subtotal, discount_percentage);
    let shipping = Price::ZERO;

    Totals {
        subtotal,
        discount,
        shipping,
        total: subtotal - discount + shipping,
        item_count: items.iter().map(|item| u64::from(item.quantity)).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductId;

    fn item(product_id: &str, price: &str, quantity: u32) -> LineItem {
        LineItem {
            product_id: ProductId::new(product_id),
            name: String::new(),
            img: String::new(),
            description: String::new(),
            price: Price::parse(price),
            quantity,
            cart_item_id: None,
            stock: None,
            category: None,
        }
    }

    #[test]
    fn test_totals_with_ten_percent_discount() {
        let items = vec![item("a", "₹100", 2), item("b", "₹50.5", 1)];
        let totals = compute_totals(&items, Decimal::from(10));

        assert_eq!(totals.subtotal.to_string(), "250.50");
        assert_eq!(totals.discount.to_string(), "25.05");
        assert_eq!(totals.shipping, Price::ZERO);
        assert_eq!(totals.total.to_string(), "225.45");
        assert_eq!(totals.item_count, 3);
    }

    #[test]
    fn test_subtotal_is_order_independent() {
        let items = vec![
            item("a", "19.99", 3),
            item("b", "0.01", 7),
            item("c", "₹1,234.5", 1),
            item("d", "0.1", 10),
        ];
        let mut reversed = items.clone();
        reversed.reverse();
        let mut rotated = items.clone();
        rotated.rotate_left(2);

        let expected = Price::from_minor(5_997 + 7 + 123_450 + 100);
        assert_eq!(subtotal(&items), expected);
        assert_eq!(subtotal(&reversed), expected);
        assert_eq!(subtotal(&rotated), expected);
    }

    #[test]
    fn test_unparseable_prices_count_as_zero() {
        let items = vec![item("a", "", 2), item("b", "call us", 1), item("c", "5", 1)];
        let totals = compute_totals(&items, Decimal::ZERO);
        assert_eq!(totals.subtotal, Price::from_minor(500));
        assert_eq!(totals.total, Price::from_minor(500));
    }

    #[test]
    fn test_discount_percentage_is_clamped() {
        let subtotal = Price::from_minor(10_000);
        assert_eq!(discount_amount(subtotal, Decimal::from(150)), subtotal);
        assert_eq!(discount_amount(subtotal, Decimal::from(-5)), Price::ZERO);
        assert_eq!(
            discount_amount(subtotal, Decimal::new(125, 1)),
            Price::from_minor(1_250)
        );
    }

    #[test]
    fn test_empty_cart_totals_are_zero() {
        let totals = compute_totals(&[], Decimal::from(20));
        assert_eq!(totals, Totals::default());
    }
}
