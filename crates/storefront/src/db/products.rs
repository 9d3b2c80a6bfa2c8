//! Catalog queries and stock updates.

use sqlx::{PgConnection, PgPool};

use tienda_core::{CategoryId, ProductId};

use super::RepositoryError;
use crate::models::{Category, Product};

/// Number of products on the featured shelf.
pub const FEATURED_LIMIT: i64 = 8;

const PRODUCT_SELECT: &str = "\
    SELECT p.id, p.name, p.brand, p.category_id, c.name AS category, \
           p.price, p.stock, p.image, p.is_active \
    FROM products p \
    JOIN categories c ON c.id = p.category_id";

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All active products, by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.is_active ORDER BY p.id");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// Active products whose name, brand or category contains `term`,
    /// ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, term: &str) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "{PRODUCT_SELECT} \
             WHERE p.is_active \
               AND (p.name ILIKE $1 ESCAPE '\\' \
                    OR p.brand ILIKE $1 ESCAPE '\\' \
                    OR c.name ILIKE $1 ESCAPE '\\') \
             ORDER BY p.name, p.id"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(contains_pattern(term))
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// The most expensive active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.is_active ORDER BY p.price DESC, p.id LIMIT $1");
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// A single active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.id = $1 AND p.is_active");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(product)
    }

    /// All categories, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Active products of one category, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_category(&self, category: CategoryId) -> Result<Vec<Product>, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
                .bind(category)
                .fetch_one(self.pool)
                .await?;
        if !exists {
            return Err(RepositoryError::NotFound);
        }

        let sql = format!("{PRODUCT_SELECT} WHERE p.category_id = $1 AND p.is_active ORDER BY p.name");
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(category)
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }
}

/// Take `units` from a product's stock.
///
/// Callers hold the product row lock and have already checked the stock.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the product has fewer than `units`
/// in stock. Returns `RepositoryError::Database` if the update fails.
pub async fn take_stock(
    conn: &mut PgConnection,
    product: ProductId,
    units: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
    )
    .bind(product)
    .bind(units)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(format!(
            "stock of product {product} is below {units}"
        )));
    }
    Ok(())
}

/// Build an `ILIKE` pattern matching `term` anywhere, with wildcards escaped.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_wraps_term() {
        assert_eq!(contains_pattern("bota"), "%bota%");
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
