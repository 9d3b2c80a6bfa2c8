//! Checkout rules: turning a cart snapshot into an order plan.
//!
//! The storefront loads the customer's cart joined with each product's current
//! stock and price inside a store transaction, then hands the rows to
//! [`plan_checkout`]. Nothing is written until a plan comes back, so every
//! rejection leaves the store untouched.
//!
//! # Rules
//!
//! - An empty cart is rejected with [`CheckoutRejection::EmptyCart`].
//! - Lines are checked in (product, size) order. Stock is tracked per product,
//!   so two sizes of one product draw from the same stock; the first line
//!   whose running demand exceeds stock is reported.
//! - The total uses the product's current price, not the price seen when the
//!   item was added to the cart.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::types::{CartLineId, Price, ProductId, Quantity, Size};

/// One cart line joined with its product's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    /// Cart line being purchased.
    pub cart_line_id: CartLineId,
    /// Product the line refers to.
    pub product_id: ProductId,
    /// Product name, used in rejection messages.
    pub product_name: String,
    /// Size label chosen by the customer.
    pub size: Size,
    /// Requested quantity.
    pub quantity: Quantity,
    /// Current unit price of the product.
    pub unit_price: Price,
    /// Current stock of the product.
    pub stock: i32,
}

impl CheckoutLine {
    /// Price of this line at the current unit price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.times(self.quantity)
    }
}

/// Why a cart cannot become an order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutRejection {
    /// The cart has no lines.
    #[error("the cart is empty")]
    EmptyCart,

    /// A product does not have enough stock for the requested quantity.
    #[error("not enough stock for {product_name}: {available} available")]
    InsufficientStock {
        /// Product that ran short.
        product_id: ProductId,
        /// Name of the product that ran short.
        product_name: String,
        /// Units of the product requested across the cart up to this line.
        requested: i64,
        /// Units currently in stock.
        available: i32,
    },
}

/// A validated checkout, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    lines: Vec<CheckoutLine>,
    total: Decimal,
}

impl CheckoutPlan {
    /// Lines to turn into order lines, in (product, size) order.
    #[must_use]
    pub fn lines(&self) -> &[CheckoutLine] {
        &self.lines
    }

    /// Order total at current prices.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// Units to take from each product's stock, in product order.
    #[must_use]
    pub fn stock_decrements(&self) -> Vec<(ProductId, i32)> {
        let mut decrements: Vec<(ProductId, i32)> = Vec::new();
        for line in &self.lines {
            match decrements.last_mut() {
                Some((product_id, units)) if *product_id == line.product_id => {
                    *units = units.saturating_add(line.quantity.get());
                }
                _ => decrements.push((line.product_id, line.quantity.get())),
            }
        }
        decrements
    }
}

/// Validate a cart snapshot and compute its total.
///
/// # Errors
///
/// Returns [`CheckoutRejection::EmptyCart`] when `lines` is empty and
/// [`CheckoutRejection::InsufficientStock`] for the first line whose product
/// cannot cover the demand.
pub fn plan_checkout(mut lines: Vec<CheckoutLine>) -> Result<CheckoutPlan, CheckoutRejection> {
    if lines.is_empty() {
        return Err(CheckoutRejection::EmptyCart);
    }

    lines.sort_by(|a, b| {
        a.product_id
            .cmp(&b.product_id)
            .then_with(|| a.size.cmp(&b.size))
    });

    let mut demand: HashMap<ProductId, i64> = HashMap::new();
    for line in &lines {
        let requested = demand.entry(line.product_id).or_insert(0);
        *requested += i64::from(line.quantity.get());

        if *requested > i64::from(line.stock) {
            return Err(CheckoutRejection::InsufficientStock {
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                requested: *requested,
                available: line.stock,
            });
        }
    }

    let total = lines.iter().map(CheckoutLine::line_total).sum();

    Ok(CheckoutPlan { lines, total })
}
