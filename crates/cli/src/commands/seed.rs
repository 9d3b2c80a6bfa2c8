//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! categories:
//!   - name: Zapatos
//!     description: Calzado de vestir
//! products:
//!   - name: Zapato 1
//!     brand: Tienda
//!     category: Zapatos
//!     price: "30.00"
//!     stock: 5
//!     image: /img/zapato1.jpg
//! ```
//!
//! Categories are matched by name and products by (name, category); existing
//! rows are updated in place. With `--replace`, active products that are not
//! in the file are deactivated. Products are never deleted because order
//! lines reference them.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};

use tienda_core::{CategoryId, Price};
use tienda_storefront::config::StorefrontConfig;
use tienda_storefront::db::{IsolationLevel, RepositoryError, Store};

/// A catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
    #[serde(default)]
    pub products: Vec<ProductEntry>,
}

/// A category in the catalog file.
#[derive(Debug, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    pub description: Option<String>,
}

/// A product in the catalog file.
#[derive(Debug, Deserialize)]
pub struct ProductEntry {
    pub name: String,
    pub brand: Option<String>,
    pub category: String,
    pub price: Decimal,
    pub stock: i32,
    pub image: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

/// Counts reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
    pub deactivated: u64,
}

/// Seed categories and products from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or the database write fails. Nothing is written unless the whole file
/// applies.
pub async fn catalog(path: &Path, replace: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    info!(path = %path.display(), "Loading catalog from file");

    // Read and validate before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let file: CatalogFile = serde_yaml::from_str(&content)?;

    info!(
        categories = file.categories.len(),
        products = file.products.len(),
        "Parsed catalog"
    );

    let errors = validate_catalog(&file);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let config = StorefrontConfig::from_env()?;
    let store = Store::connect(&config.database).await?;
    info!("Connected to database");

    let file = Arc::new(file);
    let summary = store
        .transaction(IsolationLevel::ReadCommitted, 1, move |conn| {
            let file = Arc::clone(&file);
            Box::pin(async move { apply(conn, &file, replace).await })
        })
        .await?;

    store.close().await;

    info!("Seeding complete!");
    info!("  Categories upserted: {}", summary.categories);
    info!("  Products upserted: {}", summary.products);
    if replace {
        info!("  Products deactivated: {}", summary.deactivated);
    }

    Ok(())
}

/// Check a catalog file, returning one message per problem.
#[must_use]
pub fn validate_catalog(file: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();

    let mut category_names = HashSet::new();
    for category in &file.categories {
        if category.name.trim().is_empty() {
            errors.push("Category with empty name".to_string());
        } else if !category_names.insert(category.name.trim()) {
            errors.push(format!("Duplicate category: {}", category.name));
        }
    }

    let mut product_keys = HashSet::new();
    for product in &file.products {
        let name = product.name.trim();
        if name.is_empty() {
            errors.push("Product with empty name".to_string());
            continue;
        }

        if !category_names.contains(product.category.trim()) {
            errors.push(format!(
                "Unknown category '{}' for product '{name}'",
                product.category
            ));
        }

        if let Err(e) = Price::new(product.price) {
            errors.push(format!("Invalid price for product '{name}': {e}"));
        }

        if product.stock < 0 {
            errors.push(format!("Negative stock for product '{name}'"));
        }

        if !product_keys.insert((name, product.category.trim())) {
            errors.push(format!(
                "Duplicate product '{name}' in category '{}'",
                product.category
            ));
        }
    }

    errors
}

/// Write the catalog inside the seeding transaction.
async fn apply(
    conn: &mut sqlx::PgConnection,
    file: &CatalogFile,
    replace: bool,
) -> Result<SeedSummary, RepositoryError> {
    let mut summary = SeedSummary::default();

    for category in &file.categories {
        sqlx::query(
            r"
            INSERT INTO categories (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
            ",
        )
        .bind(category.name.trim())
        .bind(category.description.as_deref())
        .execute(&mut *conn)
        .await?;
        summary.categories += 1;
    }

    let mut seeded: Vec<i32> = Vec::with_capacity(file.products.len());
    for product in &file.products {
        let category: CategoryId = sqlx::query_scalar("SELECT id FROM categories WHERE name = $1")
            .bind(product.category.trim())
            .fetch_one(&mut *conn)
            .await?;

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO products (name, brand, category_id, price, stock, image, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name, category_id) DO UPDATE
            SET brand = EXCLUDED.brand,
                price = EXCLUDED.price,
                stock = EXCLUDED.stock,
                image = EXCLUDED.image,
                is_active = EXCLUDED.is_active
            RETURNING id
            ",
        )
        .bind(product.name.trim())
        .bind(product.brand.as_deref())
        .bind(category)
        .bind(product.price)
        .bind(product.stock)
        .bind(product.image.as_deref())
        .bind(product.active)
        .fetch_one(&mut *conn)
        .await?;

        seeded.push(id);
        summary.products += 1;
    }

    if replace {
        let result = sqlx::query(
            "UPDATE products SET is_active = FALSE WHERE is_active AND NOT (id = ANY($1))",
        )
        .bind(&seeded)
        .execute(&mut *conn)
        .await?;
        summary.deactivated = result.rows_affected();
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
categories:
  - name: Zapatos
    description: Calzado de vestir
  - name: Sandalias
products:
  - name: Zapato 1
    brand: Tienda
    category: Zapatos
    price: "30.00"
    stock: 5
    image: /img/zapato1.jpg
  - name: Sandalia Playa
    category: Sandalias
    price: "12.50"
    stock: 0
    active: false
"#;

    #[test]
    fn test_parse_sample_catalog() {
        let file: CatalogFile = serde_yaml::from_str(SAMPLE).unwrap();

        assert_eq!(file.categories.len(), 2);
        assert_eq!(file.products.len(), 2);
        assert_eq!(file.products[0].price, Decimal::new(3000, 2));
        assert!(file.products[0].active);
        assert!(!file.products[1].active);
        assert!(validate_catalog(&file).is_empty());
    }

    #[test]
    fn test_validation_reports_every_problem() {
        let file = CatalogFile {
            categories: vec![
                CategoryEntry {
                    name: "Botas".to_string(),
                    description: None,
                },
                CategoryEntry {
                    name: "Botas".to_string(),
                    description: None,
                },
            ],
            products: vec![
                ProductEntry {
                    name: "Bota Alta".to_string(),
                    brand: None,
                    category: "Tacones".to_string(),
                    price: Decimal::new(-100, 2),
                    stock: -1,
                    image: None,
                    active: true,
                },
                ProductEntry {
                    name: "  ".to_string(),
                    brand: None,
                    category: "Botas".to_string(),
                    price: Decimal::ONE,
                    stock: 1,
                    image: None,
                    active: true,
                },
            ],
        };

        let errors = validate_catalog(&file);
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("Duplicate category")));
        assert!(errors.iter().any(|e| e.contains("Unknown category 'Tacones'")));
        assert!(errors.iter().any(|e| e.contains("Invalid price")));
        assert!(errors.iter().any(|e| e.contains("Negative stock")));
        assert!(errors.iter().any(|e| e.contains("empty name")));
    }

    #[test]
    fn test_duplicate_products_are_rejected() {
        let file: CatalogFile = serde_yaml::from_str(
            r#"
categories:
  - name: Zapatos
products:
  - { name: Zapato 1, category: Zapatos, price: "1.00", stock: 1 }
  - { name: Zapato 1, category: Zapatos, price: "2.00", stock: 1 }
"#,
        )
        .unwrap();

        let errors = validate_catalog(&file);
        assert_eq!(errors, vec!["Duplicate product 'Zapato 1' in category 'Zapatos'"]);
    }
}
