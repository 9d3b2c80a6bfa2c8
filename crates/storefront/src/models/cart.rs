//! Cart models.

use rust_decimal::Decimal;
use serde::Serialize;

use tienda_core::{CartLineId, Price, ProductId, Quantity, Size};

/// One line of a customer's cart, priced at the product's current price.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub product_name: String,
    pub image: Option<String>,
    pub size: Size,
    pub quantity: Quantity,
    pub unit_price: Price,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.times(self.quantity)
    }
}

/// A customer's cart with its subtotal.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub lines: Vec<CartLineView>,
    pub item_count: i64,
    pub subtotal: Decimal,
}

/// A cart line as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub line_total: Decimal,
}

impl From<Vec<CartLine>> for Cart {
    fn from(lines: Vec<CartLine>) -> Self {
        let subtotal = lines.iter().map(CartLine::line_total).sum();
        let item_count = lines.iter().map(|l| i64::from(l.quantity.get())).sum();
        let lines = lines
            .into_iter()
            .map(|line| CartLineView {
                line_total: line.line_total(),
                line,
            })
            .collect();

        Self {
            lines,
            item_count,
            subtotal,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, qty: i64, price: &str) -> CartLine {
        CartLine {
            id: CartLineId::new(id),
            product_id: ProductId::new(id),
            product_name: format!("Zapato {id}"),
            image: None,
            size: Size::default(),
            quantity: Quantity::new(qty).unwrap(),
            unit_price: Price::new(price.parse().unwrap()).unwrap(),
        }
    }

    #[test]
    fn test_cart_totals() {
        let cart = Cart::from(vec![line(1, 3, "30.00"), line(2, 1, "12.50")]);

        assert_eq!(cart.subtotal, "102.50".parse::<Decimal>().unwrap());
        assert_eq!(cart.item_count, 4);
        assert_eq!(cart.lines[0].line_total, "90.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::from(Vec::new());
        assert!(cart.lines.is_empty());
        assert_eq!(cart.subtotal, Decimal::ZERO);
        assert_eq!(cart.item_count, 0);
    }

    #[test]
    fn test_line_view_serializes_flat() {
        let cart = Cart::from(vec![line(7, 2, "10.00")]);
        let json = serde_json::to_value(&cart).unwrap();

        assert_eq!(json["lines"][0]["product_id"], 7);
        assert_eq!(json["lines"][0]["size"], "38");
        assert_eq!(json["lines"][0]["quantity"], 2);
        assert_eq!(json["lines"][0]["line_total"], "20.00");
    }
}
