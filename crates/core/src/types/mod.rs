//! Core types for Tienda.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod name;
pub mod price;
pub mod quantity;
pub mod size;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use name::{CustomerName, NameError};
pub use price::{Price, PriceError};
pub use quantity::{Quantity, QuantityError};
pub use size::{Size, SizeError};
pub use status::OrderStatus;
