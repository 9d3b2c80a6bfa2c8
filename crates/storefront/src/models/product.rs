//! Catalog models.

use serde::Serialize;

use tienda_core::{CategoryId, Price, ProductId};

/// A product as shown in the catalog, joined with its category name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: Option<String>,
    pub category_id: CategoryId,
    pub category: String,
    pub price: Price,
    pub stock: i32,
    /// Image path relative to the static image root.
    pub image: Option<String>,
    pub is_active: bool,
}

/// A product category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}
