//! Mera Bestie Core - Cart domain types and pricing.
//!
//! This crate provides the types shared by the storefront cart library and
//! the command-line front end:
//! - `storefront` - Local storage, backend client, coupon validation, cart session
//! - `cli` - Command-line front end over the cart session
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no storage. Pricing and the guest-cart merge live here so they
//! can be tested without a backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, fixed-point prices, line items, products, discounts
//! - [`pricing`] - Subtotal, discount and total computation
//! - [`merge`] - Guest cart to server cart merge at login

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod merge;
pub mod pricing;
pub mod types;

pub use merge::{MergeAction, MergedLine, merge_carts};
pub use pricing::{Totals, compute_totals};
pub use types::*;
