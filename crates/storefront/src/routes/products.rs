//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use tienda_core::{CategoryId, ProductId};

use crate::db::products::FEATURED_LIMIT;
use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Category, Product};
use crate::state::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// All active products.
pub async fn index(
    RequireAuth(_): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list_active().await?;
    Ok(Json(products))
}

/// Search products by name, brand or category.
pub async fn search(
    RequireAuth(_): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Product>>> {
    let term = query.q.as_deref().map(str::trim).unwrap_or_default();
    if term.is_empty() {
        return Err(AppError::BadRequest("search term `q` is required".to_string()));
    }

    let products = ProductRepository::new(state.pool()).search(term).await?;
    Ok(Json(products))
}

/// The featured shelf.
pub async fn featured(
    RequireAuth(_): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .featured(FEATURED_LIMIT)
        .await?;
    Ok(Json(products))
}

/// A single active product.
pub async fn show(
    RequireAuth(_): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_active(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id} not found")))
}

/// All categories.
pub async fn categories(
    RequireAuth(_): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>> {
    let categories = ProductRepository::new(state.pool()).categories().await?;
    Ok(Json(categories))
}

/// Active products of one category.
pub async fn by_category(
    RequireAuth(_): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Vec<Product>>> {
    match ProductRepository::new(state.pool()).by_category(id).await {
        Ok(products) => Ok(Json(products)),
        Err(RepositoryError::NotFound) => {
            Err(AppError::NotFound(format!("category {id} not found")))
        }
        Err(e) => Err(e.into()),
    }
}
