//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] tienda_core::EmailError),

    /// Name is not in "First Last" form.
    #[error("invalid name: {0}")]
    InvalidName(#[from] tienda_core::NameError),

    /// Invalid credentials (wrong password or customer not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Customer not found.
    #[error("customer not found")]
    CustomerNotFound,

    /// A customer with this email already exists.
    #[error("customer already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
