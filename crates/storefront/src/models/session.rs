//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use tienda_core::{CustomerId, Email};

use super::Customer;

/// Session-stored customer identity.
///
/// Minimal data stored in the session to identify the logged-in customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Customer's database ID.
    pub id: CustomerId,
    /// Customer's email address.
    pub email: Email,
}

impl From<&Customer> for CurrentCustomer {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            email: customer.email.clone(),
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";
}
