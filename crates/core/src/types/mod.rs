//! Core types for the Mera Bestie storefront cart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod discount;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{Cart, CartSource, LineItem};
pub use discount::DiscountInfo;
pub use id::*;
pub use price::Price;
pub use product::Product;
