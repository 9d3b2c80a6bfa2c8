//! Checkout: turning a customer's cart into an order.
//!
//! The whole conversion runs as one `SERIALIZABLE` unit of work through
//! [`Store::transaction`]:
//!
//! 1. lock the cart rows and their products, reading current price and stock
//! 2. validate with [`plan_checkout`] (empty cart, stock per product)
//! 3. insert the order header and one order line per cart line
//! 4. take the purchased units from stock
//! 5. delete the cart
//!
//! Any error before commit rolls everything back. Serialization conflicts
//! and deadlocks restart the unit from step 1, so the loser of a race sees
//! the winner's writes and fails validation instead of overselling.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use tienda_core::{CheckoutRejection, CustomerId, OrderId, plan_checkout};

use crate::db::{IsolationLevel, RepositoryError, Store, TransactionFailure, cart, orders, products};

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    /// The new order.
    pub order_id: OrderId,
    /// Order total at checkout-time prices.
    pub total: Decimal,
    /// Number of order lines written.
    #[serde(skip)]
    pub line_count: usize,
}

/// Why a checkout failed. Every variant leaves the store unchanged.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no lines.
    #[error("the cart is empty")]
    EmptyCart,

    /// A product cannot cover the requested quantity.
    #[error("not enough stock for {product_name}: {available} available")]
    InsufficientStock {
        product_name: String,
        available: i32,
    },

    /// The store kept reporting conflicts or could not be reached; the
    /// whole checkout may be retried.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] sqlx::Error),

    /// Any other store failure.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<CheckoutRejection> for CheckoutError {
    fn from(rejection: CheckoutRejection) -> Self {
        match rejection {
            CheckoutRejection::EmptyCart => Self::EmptyCart,
            CheckoutRejection::InsufficientStock {
                product_name,
                available,
                ..
            } => Self::InsufficientStock {
                product_name,
                available,
            },
        }
    }
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

impl TransactionFailure for CheckoutError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Repository(err) => err.is_transient(),
            _ => false,
        }
    }
}

impl CheckoutError {
    /// Reclassify exhausted conflicts and connection failures as
    /// `StoreUnavailable`.
    fn into_caller_error(self) -> Self {
        match self {
            Self::Repository(RepositoryError::Database(err)) if is_unavailable(&err) => {
                Self::StoreUnavailable(err)
            }
            other => other,
        }
    }
}

fn is_unavailable(err: &sqlx::Error) -> bool {
    crate::db::is_transient(err)
        || matches!(
            err,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
        )
}

/// Checkout service.
pub struct CheckoutService<'a> {
    store: &'a Store,
    max_attempts: u32,
}

impl<'a> CheckoutService<'a> {
    /// Create a checkout service that tries each checkout up to
    /// `max_attempts` times on transient conflicts.
    #[must_use]
    pub const fn new(store: &'a Store, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts,
        }
    }

    /// Convert the customer's cart into a pending order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` or `CheckoutError::InsufficientStock`
    /// when the cart cannot be bought, `CheckoutError::StoreUnavailable` when
    /// conflicts persist past the attempt limit or the store is unreachable,
    /// and `CheckoutError::Repository` for other store errors.
    #[instrument(skip(self), fields(customer_id = %customer))]
    pub async fn checkout(&self, customer: CustomerId) -> Result<CheckoutReceipt, CheckoutError> {
        let result = self
            .store
            .transaction(IsolationLevel::Serializable, self.max_attempts, move |conn| {
                Box::pin(async move {
                    let lines = cart::lock_for_checkout(&mut *conn, customer).await?;
                    let plan = plan_checkout(lines)?;

                    let order_id = orders::insert_order(&mut *conn, customer, plan.total()).await?;
                    orders::insert_lines(&mut *conn, order_id, plan.lines()).await?;

                    for (product, units) in plan.stock_decrements() {
                        products::take_stock(&mut *conn, product, units).await?;
                    }

                    cart::clear(&mut *conn, customer).await?;

                    Ok::<_, CheckoutError>(CheckoutReceipt {
                        order_id,
                        total: plan.total(),
                        line_count: plan.lines().len(),
                    })
                })
            })
            .await
            .map_err(CheckoutError::into_caller_error);

        match &result {
            Ok(receipt) => tracing::info!(
                order_id = %receipt.order_id,
                total = %receipt.total,
                lines = receipt.line_count,
                "Checkout completed"
            ),
            Err(err @ (CheckoutError::EmptyCart | CheckoutError::InsufficientStock { .. })) => {
                tracing::info!(reason = %err, "Checkout rejected");
            }
            Err(err) => tracing::warn!(error = %err, "Checkout failed"),
        }

        result
    }
}
