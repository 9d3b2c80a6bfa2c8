//! Order history route handlers.

use axum::{
    Json,
    extract::{Path, State},
};

use tienda_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderDetail};
use crate::state::AppState;

/// The customer's orders, newest first.
pub async fn index(
    RequireAuth(customer): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool()).list(customer.id).await?;
    Ok(Json(orders))
}

/// One of the customer's orders with its lines.
pub async fn show(
    RequireAuth(customer): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    OrderRepository::new(state.pool())
        .get(customer.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))
}
