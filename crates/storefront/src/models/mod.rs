//! Domain models for the storefront.
//!
//! Row types double as response bodies: every model derives both
//! `sqlx::FromRow` and `Serialize`.

pub mod cart;
pub mod customer;
pub mod order;
pub mod product;
pub mod session;

pub use cart::{Cart, CartLine};
pub use customer::{Customer, CustomerCredentials, NewCustomer};
pub use order::{Order, OrderDetail, OrderLine};
pub use product::{Category, Product};
pub use session::{CurrentCustomer, keys as session_keys};
