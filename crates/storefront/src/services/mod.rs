//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Customer registration and password login
//! - `checkout` - Converting a cart into an order in one transaction

pub mod auth;
pub mod checkout;

pub use auth::{AuthError, AuthService, Registration};
pub use checkout::{CheckoutError, CheckoutReceipt, CheckoutService};
