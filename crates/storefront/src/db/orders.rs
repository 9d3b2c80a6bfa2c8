//! Order repository.
//!
//! Orders are written only by checkout, inside its transaction; this module
//! exposes those writes as free functions over a connection and the read
//! side through [`OrderRepository`].

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use tienda_core::{CheckoutLine, CustomerId, OrderId};

use super::RepositoryError;
use crate::models::{Order, OrderDetail, OrderLine};

/// Repository for a customer's order history.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, customer: CustomerId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT id, total, status, created_at
            FROM orders
            WHERE customer_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(customer)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// One of the customer's orders with its lines.
    ///
    /// Orders of other customers are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(
        &self,
        customer: CustomerId,
        id: OrderId,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            SELECT id, total, status, created_at
            FROM orders
            WHERE id = $1 AND customer_id = $2
            ",
        )
        .bind(id)
        .bind(customer)
        .fetch_optional(self.pool)
        .await?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, OrderLine>(
            r"
            SELECT l.id, l.product_id, p.name AS product_name,
                   l.size, l.quantity, l.unit_price
            FROM order_lines l
            JOIN products p ON p.id = l.product_id
            WHERE l.order_id = $1
            ORDER BY l.id
            ",
        )
        .bind(order.id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(OrderDetail { order, lines }))
    }
}

/// Insert a pending order header.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    customer: CustomerId,
    total: Decimal,
) -> Result<OrderId, RepositoryError> {
    let id: OrderId = sqlx::query_scalar(
        "INSERT INTO orders (customer_id, total) VALUES ($1, $2) RETURNING id",
    )
    .bind(customer)
    .bind(total)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// Insert one order line per checkout line, snapshotting its unit price.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if an insert fails.
pub async fn insert_lines(
    conn: &mut PgConnection,
    order: OrderId,
    lines: &[CheckoutLine],
) -> Result<(), RepositoryError> {
    for line in lines {
        sqlx::query(
            r"
            INSERT INTO order_lines (order_id, product_id, quantity, unit_price, size)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(order)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(&line.size)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
