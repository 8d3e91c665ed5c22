//! Mera Bestie Storefront cart library.
//!
//! Keeps the shopper's cart consistent between local storage (guests) and the
//! storefront backend (signed-in users), prices it and redeems coupons.
//!
//! # Modules
//!
//! - [`storage`] - Local key/value storage, guest cart and recently viewed
//! - [`backend`] - Backend trait and its `reqwest` implementation
//! - [`coupon`] - Coupon verification
//! - [`session`] - Cart session: optimistic mutations and sign-in merge
//! - [`config`] - Environment configuration
//! - [`error`] - Error types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod coupon;
pub mod error;
pub mod session;
pub mod storage;

pub use backend::{CartBackend, HttpBackend};
pub use config::StorefrontConfig;
pub use coupon::{CouponOutcome, CouponValidator};
pub use error::{CartError, StorageError};
pub use session::{CartSession, CartSummary, Mutation, PendingMutation, SessionContext};
pub use storage::{FileStorage, LocalCartStore, LocalStorage, MemoryStorage, RecentlyViewed};
