//! Customer repository for database operations.

use sqlx::PgPool;

use tienda_core::{CustomerId, Email};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Customer, CustomerCredentials, NewCustomer};

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, address, created_at, updated_at";

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a customer with an already hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        customer: &NewCustomer,
        password_hash: &str,
    ) -> Result<Customer, RepositoryError> {
        let sql = format!(
            "INSERT INTO customers (name, email, phone, address, password_hash) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CUSTOMER_COLUMNS}"
        );

        sqlx::query_as::<_, Customer>(&sql)
            .bind(&customer.name)
            .bind(&customer.email)
            .bind(customer.phone.as_deref())
            .bind(customer.address.as_deref())
            .bind(password_hash)
            .fetch_one(self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "email already exists"))
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, including
    /// rows whose name or email no longer validate.
    pub async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");

        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(customer)
    }

    /// Get a customer and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<CustomerCredentials>, RepositoryError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS}, password_hash FROM customers WHERE email = $1");

        let credentials = sqlx::query_as::<_, CustomerCredentials>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        Ok(credentials)
    }
}
