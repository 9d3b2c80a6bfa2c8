//! Cart route handlers.
//!
//! Every mutation returns the updated cart so clients can re-render from a
//! single response.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use tienda_core::{CartLineId, CustomerId, ProductId, Quantity, Size};

use super::JsonBody;
use crate::db::{CartRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Cart;
use crate::services::{CheckoutReceipt, CheckoutService};
use crate::state::AppState;

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    /// Defaults to 1.
    pub quantity: Option<i64>,
    /// Defaults to [`Size::DEFAULT`].
    pub size: Option<String>,
}

/// Set-quantity request body.
#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

/// Change-size request body.
#[derive(Debug, Deserialize)]
pub struct SetSizeRequest {
    pub size: String,
}

/// The customer's cart.
pub async fn show(
    RequireAuth(customer): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Cart>> {
    load_cart(&state, customer.id).await
}

/// Add a product to the cart.
#[instrument(skip_all, fields(customer_id = %customer.id, product_id = %body.product_id))]
pub async fn add_item(
    RequireAuth(customer): RequireAuth,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<AddItemRequest>,
) -> Result<Json<Cart>> {
    let quantity = parse_quantity(body.quantity.unwrap_or(1))?;
    let size = match body.size.as_deref() {
        Some(raw) => parse_size(raw)?,
        None => Size::default(),
    };

    CartRepository::new(state.pool())
        .add(customer.id, body.product_id, quantity, &size)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::NotFound(format!("product {} not found", body.product_id))
            }
            other => other.into(),
        })?;

    load_cart(&state, customer.id).await
}

/// Replace the quantity of a cart line.
#[instrument(skip_all, fields(customer_id = %customer.id, line_id = %line_id))]
pub async fn set_quantity(
    RequireAuth(customer): RequireAuth,
    State(state): State<AppState>,
    Path(line_id): Path<CartLineId>,
    JsonBody(body): JsonBody<SetQuantityRequest>,
) -> Result<Json<Cart>> {
    let quantity = parse_quantity(body.quantity)?;

    CartRepository::new(state.pool())
        .set_quantity(customer.id, line_id, quantity)
        .await
        .map_err(|e| line_error(e, line_id))?;

    load_cart(&state, customer.id).await
}

/// Change the size of a cart line.
#[instrument(skip_all, fields(customer_id = %customer.id, line_id = %line_id))]
pub async fn set_size(
    RequireAuth(customer): RequireAuth,
    State(state): State<AppState>,
    Path(line_id): Path<CartLineId>,
    JsonBody(body): JsonBody<SetSizeRequest>,
) -> Result<Json<Cart>> {
    let size = parse_size(&body.size)?;

    CartRepository::new(state.pool())
        .set_size(customer.id, line_id, &size)
        .await
        .map_err(|e| line_error(e, line_id))?;

    load_cart(&state, customer.id).await
}

/// Remove a cart line.
#[instrument(skip_all, fields(customer_id = %customer.id, line_id = %line_id))]
pub async fn remove_item(
    RequireAuth(customer): RequireAuth,
    State(state): State<AppState>,
    Path(line_id): Path<CartLineId>,
) -> Result<Json<Cart>> {
    CartRepository::new(state.pool())
        .remove(customer.id, line_id)
        .await
        .map_err(|e| line_error(e, line_id))?;

    load_cart(&state, customer.id).await
}

/// Convert the cart into an order.
pub async fn checkout(
    RequireAuth(customer): RequireAuth,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CheckoutReceipt>)> {
    let receipt = CheckoutService::new(state.store(), state.config().checkout_max_attempts)
        .checkout(customer.id)
        .await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn load_cart(state: &AppState, customer: CustomerId) -> Result<Json<Cart>> {
    let lines = CartRepository::new(state.pool()).lines(customer).await?;
    Ok(Json(Cart::from(lines)))
}

fn parse_quantity(raw: i64) -> Result<Quantity> {
    Quantity::new(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn parse_size(raw: &str) -> Result<Size> {
    Size::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn line_error(err: RepositoryError, line_id: CartLineId) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(format!("cart line {line_id} not found")),
        RepositoryError::Conflict(msg) => AppError::Conflict(msg),
        other => other.into(),
    }
}
