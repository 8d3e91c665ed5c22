//! Terminal output.

use bestie_core::{DiscountInfo, LineItem, Product, Totals};
use bestie_storefront::CartSummary;

/// Print a plain line.
#[allow(clippy::print_stdout)]
pub fn message(text: &str) {
    println!("{text}");
}

/// Print an error for the shopper.
#[allow(clippy::print_stderr)]
pub fn failure(text: &str) {
    eprintln!("error: {text}");
}

/// Print the cart lines followed by its totals.
#[allow(clippy::print_stdout)]
pub fn cart(items: &[LineItem], totals: &Totals, discount: &DiscountInfo, currency: &str) {
    if items.is_empty() {
        println!("Your cart is empty");
        return;
    }

    for item in items {
        println!(
            "{:>3} x {:<32} {:>14}  [{}]",
            item.quantity,
            item.name,
            item.line_total().display_with(currency),
            item.product_id
        );
    }

    println!();
    println!("Subtotal  {:>14}", totals.subtotal.display_with(currency));
    if discount.is_applied() {
        println!(
            "Discount  {:>14}  ({} {}%)",
            format!("-{}", totals.discount.display_with(currency)),
            discount.code,
            discount.percentage
        );
    }
    println!("Shipping  {:>14}", "Free");
    println!("Total     {:>14}", totals.total.display_with(currency));
}

/// Print the cart badge line.
#[allow(clippy::print_stdout)]
pub fn summary(summary: &CartSummary, currency: &str) {
    println!(
        "Cart: {} item(s), {}",
        summary.item_count,
        summary.total.display_with(currency)
    );
}

/// Print a product list.
#[allow(clippy::print_stdout)]
pub fn products(products: &[Product], currency: &str) {
    if products.is_empty() {
        println!("No recently viewed products");
        return;
    }
    for product in products {
        println!(
            "{:<32} {:>14}  [{}]",
            product.name,
            product.price.display_with(currency),
            product.product_id
        );
    }
}
