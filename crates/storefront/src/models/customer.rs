//! Customer accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tienda_core::{CustomerId, CustomerName, Email};

/// A registered customer.
///
/// The password hash never leaves the repository except through
/// [`CustomerCredentials`].
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Customer {
    pub id: CustomerId,
    pub name: CustomerName,
    pub email: Email,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A customer together with the stored password hash, used by login.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerCredentials {
    #[sqlx(flatten)]
    pub customer: Customer,
    pub password_hash: String,
}

/// Validated registration data.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: CustomerName,
    pub email: Email,
    pub phone: Option<String>,
    pub address: Option<String>,
}
