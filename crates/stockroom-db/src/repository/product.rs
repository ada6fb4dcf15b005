//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - List in creation order
//! - CRUD operations
//! - Atomic partial updates
//!
//! ## Partial Update
//! ```text
//! PUT /api/products/{id}  { "price_cents": 149 }
//!       │
//!       ▼
//! ProductInput::normalized_update()   ← validate + trim (stockroom-core)
//!       │
//!       ▼
//! UPDATE products SET price_cents = COALESCE(?5, price_cents), ...
//! WHERE id = ?1 RETURNING ...          ← one statement, no lost updates
//! ```
//!
//! A single statement means an update can never overwrite a stock
//! deduction committed by a concurrent sale with a stale quantity.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::PRODUCT_COLUMNS;
use crate::error::{DbError, DbResult};
use stockroom_core::{NewProduct, Product, ProductInput, GENERATED_SKU_LEN, GENERATED_SKU_PREFIX};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists all products, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at, rowid");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a validated product.
    ///
    /// Generates the id, the creation timestamp and, when the caller gave
    /// none, a SKU.
    pub async fn insert(&self, new: NewProduct) -> DbResult<Product> {
        let product = Product {
            id: generate_product_id(),
            name: new.name,
            sku: new.sku.unwrap_or_else(generate_sku),
            category: new.category,
            price_cents: new.price_cents,
            quantity: new.quantity,
            image_url: new.image_url,
            created_at: Utc::now(),
        };

        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, sku, category, price_cents, quantity, image_url, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.quantity)
        .bind(&product.image_url)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Applies a partial update and returns the stored product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Updated product
    /// * `Err(DbError::Core)` - A supplied field failed validation
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, id: &str, changes: &ProductInput) -> DbResult<Product> {
        let changes = changes.normalized_update()?;

        debug!(id = %id, "Updating product");

        let sql = format!(
            r#"
            UPDATE products SET
                name        = COALESCE(?2, name),
                sku         = COALESCE(?3, sku),
                category    = COALESCE(?4, category),
                price_cents = COALESCE(?5, price_cents),
                quantity    = COALESCE(?6, quantity),
                image_url   = COALESCE(?7, image_url)
            WHERE id = ?1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.sku)
            .bind(changes.category)
            .bind(changes.price_cents)
            .bind(changes.quantity)
            .bind(changes.image_url)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product and returns the removed record.
    ///
    /// Sale items keep their snapshot; `sale_items.product_id` has no
    /// foreign key.
    pub async fn delete(&self, id: &str) -> DbResult<Product> {
        debug!(id = %id, "Deleting product");

        let sql = format!("DELETE FROM products WHERE id = ?1 RETURNING {PRODUCT_COLUMNS}");
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Counts total products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a SKU such as `SKU-7QK2ZD`.
pub fn generate_sku() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    let random = Uuid::new_v4();
    let suffix: String = random
        .as_bytes()
        .iter()
        .take(GENERATED_SKU_LEN)
        .map(|b| ALPHABET[*b as usize % ALPHABET.len()] as char)
        .collect();

    format!("{GENERATED_SKU_PREFIX}{suffix}")
}

// =============================================================================
// Unit Tests
// =============================================================================
