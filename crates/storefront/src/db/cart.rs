//! Cart repository.
//!
//! A cart is the set of `cart` rows owned by one customer. Lines are unique
//! per (customer, product, size); adding an existing combination increases
//! its quantity instead of inserting a second row.

use sqlx::{PgConnection, PgPool};

use tienda_core::{CartLineId, CheckoutLine, CustomerId, Price, ProductId, Quantity, Size};

use super::{RepositoryError, conflict_on_unique, invalid_on_overflow};
use crate::models::CartLine;

/// Repository for a customer's cart.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The customer's cart lines in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, customer: CustomerId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT c.id, c.product_id, p.name AS product_name, p.image,
                   c.size, c.quantity, p.price AS unit_price
            FROM cart c
            JOIN products p ON p.id = c.product_id
            WHERE c.customer_id = $1
            ORDER BY c.id
            ",
        )
        .bind(customer)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// Add `quantity` units of an active product in `size`.
    ///
    /// Increments the existing line for (customer, product, size) if there
    /// is one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist or
    /// is inactive. Returns `RepositoryError::InvalidInput` if the merged
    /// quantity overflows. Returns `RepositoryError::Database` if the query
    /// fails.
    pub async fn add(
        &self,
        customer: CustomerId,
        product: ProductId,
        quantity: Quantity,
        size: &Size,
    ) -> Result<CartLineId, RepositoryError> {
        let id: Option<CartLineId> = sqlx::query_scalar(
            r"
            INSERT INTO cart (customer_id, product_id, quantity, size)
            SELECT $1, p.id, $3, $4
            FROM products p
            WHERE p.id = $2 AND p.is_active
            ON CONFLICT (customer_id, product_id, size)
            DO UPDATE SET quantity = cart.quantity + EXCLUDED.quantity,
                          updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(customer)
        .bind(product)
        .bind(quantity)
        .bind(size)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| invalid_on_overflow(e, "cart quantity is too large"))?;

        id.ok_or(RepositoryError::NotFound)
    }

    /// Replace the quantity of one of the customer's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist or
    /// belongs to another customer.
    pub async fn set_quantity(
        &self,
        customer: CustomerId,
        line: CartLineId,
        quantity: Quantity,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE cart SET quantity = $3, updated_at = NOW() \
             WHERE id = $1 AND customer_id = $2",
        )
        .bind(line)
        .bind(customer)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Change the size of one of the customer's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist or
    /// belongs to another customer. Returns `RepositoryError::Conflict` if
    /// the cart already has this product in `size`.
    pub async fn set_size(
        &self,
        customer: CustomerId,
        line: CartLineId,
        size: &Size,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE cart SET size = $3, updated_at = NOW() \
             WHERE id = $1 AND customer_id = $2",
        )
        .bind(line)
        .bind(customer)
        .bind(size)
        .execute(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "the cart already has this product in that size"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove one of the customer's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist or
    /// belongs to another customer.
    pub async fn remove(&self, customer: CustomerId, line: CartLineId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart WHERE id = $1 AND customer_id = $2")
            .bind(line)
            .bind(customer)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct CheckoutRow {
    cart_line_id: CartLineId,
    product_id: ProductId,
    product_name: String,
    size: Size,
    quantity: Quantity,
    unit_price: Price,
    stock: i32,
}

impl From<CheckoutRow> for CheckoutLine {
    fn from(row: CheckoutRow) -> Self {
        Self {
            cart_line_id: row.cart_line_id,
            product_id: row.product_id,
            product_name: row.product_name,
            size: row.size,
            quantity: row.quantity,
            unit_price: row.unit_price,
            stock: row.stock,
        }
    }
}

/// Read the customer's cart with current price and stock, locking the cart
/// rows and their products until the transaction ends.
///
/// Rows are locked in product order so concurrent checkouts that share
/// products queue up instead of deadlocking.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_for_checkout(
    conn: &mut PgConnection,
    customer: CustomerId,
) -> Result<Vec<CheckoutLine>, RepositoryError> {
    let rows = sqlx::query_as::<_, CheckoutRow>(
        r"
        SELECT c.id AS cart_line_id, c.product_id, p.name AS product_name,
               c.size, c.quantity, p.price AS unit_price, p.stock
        FROM cart c
        JOIN products p ON p.id = c.product_id
        WHERE c.customer_id = $1
        ORDER BY p.id, c.size
        FOR UPDATE OF c, p
        ",
    )
    .bind(customer)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(CheckoutLine::from).collect())
}

/// Delete every line of the customer's cart. Returns the number removed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn clear(conn: &mut PgConnection, customer: CustomerId) -> Result<u64, RepositoryError> {
    let result = sqlx::query("DELETE FROM cart WHERE customer_id = $1")
        .bind(customer)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
