//! Order models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use tienda_core::{OrderId, OrderLineId, OrderStatus, Price, ProductId, Quantity, Size};

/// An order header.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// One purchased line, with the unit price paid at checkout.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub product_id: ProductId,
    pub product_name: String,
    pub size: Size,
    pub quantity: Quantity,
    pub unit_price: Price,
}

/// An order with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}
