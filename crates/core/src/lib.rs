//! Tienda Core - Shared domain types and checkout rules.
//!
//! This crate provides the types used across all Tienda components:
//! - `storefront` - JSON API for catalog, cart, checkout and orders
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. The checkout rules live here so they can be tested without
//! a running database; the storefront runs them inside a store transaction.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, quantities, emails, names and statuses
//! - [`checkout`] - Validation and totalling of a cart about to become an order

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod types;

pub use checkout::{CheckoutLine, CheckoutPlan, CheckoutRejection, plan_checkout};
pub use types::*;
