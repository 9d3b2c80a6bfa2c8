//! `Store::transaction` commit, rollback and retry against a real database.
//!
//! Run with `TEST_DATABASE_URL` set and `--ignored`; see the crate docs.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use rust_decimal::Decimal;

use tienda_core::{OrderId, Quantity, Size};
use tienda_integration_tests::{Fixture, test_store, unique};
use tienda_storefront::db::{
    CartRepository, IsolationLevel, OrderRepository, RepositoryError, TransactionFailure, orders,
};

/// Fails the current statement the way a lost serialization race does.
const RAISE_SERIALIZATION_FAILURE: &str = "DO $$ BEGIN \
     RAISE EXCEPTION 'serialization conflict' USING ERRCODE = 'serialization_failure'; \
     END $$";

// =============================================================================
// Rollback
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_error_after_write_rolls_back() {
    let fx = Fixture::new(test_store().await).await;
    let customer = fx.customer().await;

    let result = fx
        .store
        .transaction(IsolationLevel::Serializable, 3, move |conn| {
            Box::pin(async move {
                orders::insert_order(&mut *conn, customer, Decimal::new(1000, 2)).await?;
                Err::<OrderId, _>(RepositoryError::NotFound)
            })
        })
        .await;

    assert!(matches!(result, Err(RepositoryError::NotFound)));
    assert_eq!(fx.orders(customer).await, 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_success_commits_every_write() {
    let fx = Fixture::new(test_store().await).await;
    let customer = fx.customer().await;

    let order = fx
        .store
        .transaction(IsolationLevel::ReadCommitted, 1, move |conn| {
            Box::pin(async move {
                let id = orders::insert_order(&mut *conn, customer, Decimal::new(2500, 2)).await?;
                Ok::<_, RepositoryError>(id)
            })
        })
        .await
        .unwrap();

    let detail = OrderRepository::new(fx.pool())
        .get(customer, order)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.order.total, Decimal::new(2500, 2));
    assert!(detail.lines.is_empty());
}

// =============================================================================
// Retry
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_transient_failure_reruns_the_whole_unit() {
    let fx = Fixture::new(test_store().await).await;
    let customer = fx.customer().await;
    let attempts = Arc::new(AtomicU32::new(0));

    let counter = Arc::clone(&attempts);
    let order = fx
        .store
        .transaction(IsolationLevel::Serializable, 3, move |conn| {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                let id = orders::insert_order(&mut *conn, customer, Decimal::new(1000, 2)).await?;
                if attempt == 1 {
                    sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(RAISE_SERIALIZATION_FAILURE))
                        .await?;
                }
                Ok::<_, RepositoryError>(id)
            })
        })
        .await
        .unwrap();

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    // The first attempt's order was rolled back; only the retry's remains.
    assert_eq!(fx.orders(customer).await, 1);
    assert!(
        OrderRepository::new(fx.pool())
            .get(customer, order)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_retries_stop_at_max_attempts() {
    let fx = Fixture::new(test_store().await).await;
    let customer = fx.customer().await;
    let attempts = Arc::new(AtomicU32::new(0));

    let counter = Arc::clone(&attempts);
    let err = fx
        .store
        .transaction(IsolationLevel::Serializable, 3, move |conn| {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                orders::insert_order(&mut *conn, customer, Decimal::new(1000, 2)).await?;
                sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(RAISE_SERIALIZATION_FAILURE))
                    .await?;
                Ok::<_, RepositoryError>(())
            })
        })
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(fx.orders(customer).await, 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_permanent_failure_is_not_retried() {
    let fx = Fixture::new(test_store().await).await;
    let attempts = Arc::new(AtomicU32::new(0));

    let counter = Arc::clone(&attempts);
    let result = fx
        .store
        .transaction(IsolationLevel::Serializable, 5, move |_conn| {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(RepositoryError::Conflict("taken".to_owned()))
            })
        })
        .await;

    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Cart Quantity Overflow
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_merged_quantity_overflow_is_invalid_input() {
    let fx = Fixture::new(test_store().await).await;
    let product = fx.product(&unique("Bota"), "19.99", 10).await;
    let customer = fx.customer().await;
    let size = Size::parse("38").unwrap();
    let cart = CartRepository::new(fx.pool());

    cart.add(customer, product, Quantity::new(i64::from(i32::MAX)).unwrap(), &size)
        .await
        .unwrap();
    let err = cart
        .add(customer, product, Quantity::ONE, &size)
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::InvalidInput(_)));
    let lines = cart.lines(customer).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity.get(), i32::MAX);
}
