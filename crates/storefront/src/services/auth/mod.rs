//! Authentication service.
//!
//! Provides customer registration and password login. Passwords are hashed
//! with Argon2id; the session layer keeps the logged-in identity.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use tienda_core::{CustomerId, CustomerName, Email};

use crate::db::{CustomerRepository, RepositoryError};
use crate::models::{Customer, NewCustomer};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Raw registration input.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Authentication service.
pub struct AuthService<'a> {
    customers: CustomerRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            customers: CustomerRepository::new(pool),
        }
    }

    /// Register a new customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidName` or `AuthError::InvalidEmail` for
    /// malformed input, `AuthError::WeakPassword` if the password is too
    /// short, and `AuthError::UserAlreadyExists` if the email is taken.
    pub async fn register(&self, registration: Registration) -> Result<Customer, AuthError> {
        let name = CustomerName::parse(&registration.name)?;
        let email = Email::parse(&registration.email)?;
        validate_password(&registration.password)?;

        let password_hash = hash_password(&registration.password)?;

        let new_customer = NewCustomer {
            name,
            email,
            phone: non_blank(registration.phone),
            address: non_blank(registration.address),
        };

        let customer = self
            .customers
            .create(&new_customer, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(customer_id = %customer.id, "Customer registered");
        Ok(customer)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown,
    /// malformed, or the password does not match.
    pub async fn login(&self, email: &str, password: &str) -> Result<Customer, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let credentials = self
            .customers
            .get_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &credentials.password_hash)?;

        Ok(credentials.customer)
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CustomerNotFound` if the customer no longer exists.
    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, AuthError> {
        self.customers
            .get_by_id(id)
            .await?
            .ok_or(AuthError::CustomerNotFound)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
