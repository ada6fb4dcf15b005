//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Sale Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   │                                                                     │
//! │   ├── INSERT sales (total 0)          ← first statement takes the      │
//! │   │                                     write lock; other sales wait   │
//! │   ├── SELECT referenced products      ← stock as of this transaction   │
//! │   ├── plan_sale(lines, products)      ← pure validation (core)         │
//! │   │        └── any failure → drop tx → ROLLBACK, nothing changed       │
//! │   ├── UPDATE products                                                   │
//! │   │     SET quantity = quantity - n                                     │
//! │   │     WHERE id = ? AND quantity >= n   ← 0 rows → ROLLBACK           │
//! │   ├── INSERT sale_items (snapshots, position)                          │
//! │   └── UPDATE sales SET total_cents                                      │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Because the write lock is held from the first statement, two sales on
//! the same product are serialized and can never jointly overdraw stock.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::PRODUCT_COLUMNS;
use crate::error::DbResult;
use stockroom_core::{plan_sale, CoreError, Product, Sale, SaleItem, SaleLineRequest, StaffIdentity};

const SALE_COLUMNS: &str = "id, total_cents, staff_id, staff_username, created_at";
const SALE_ITEM_COLUMNS: &str =
    "id, sale_id, position, product_id, name, sku, unit_price_cents, quantity, line_total_cents";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale and deducts stock, all or nothing.
    ///
    /// ## Returns
    /// * `Ok(Sale)` - The committed sale with its items
    /// * `Err(DbError::Core(..))` - Empty sale, bad quantity, unknown
    ///   product or insufficient stock; no stock was changed
    pub async fn create_sale(
        &self,
        lines: &[SaleLineRequest],
        staff: &StaffIdentity,
    ) -> DbResult<Sale> {
        if lines.is_empty() {
            return Err(CoreError::EmptySale.into());
        }

        let sale_id = generate_sale_id();
        let created_at = Utc::now();

        debug!(sale_id = %sale_id, lines = lines.len(), "Starting sale transaction");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (id, total_cents, staff_id, staff_username, created_at)
            VALUES (?1, 0, ?2, ?3, ?4)
            "#,
        )
        .bind(&sale_id)
        .bind(&staff.user_id)
        .bind(&staff.username)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        let product_sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let mut products: Vec<Product> = Vec::new();
        for line in lines {
            if products.iter().any(|p| p.id == line.product_id) {
                continue;
            }
            if let Some(product) = sqlx::query_as::<_, Product>(&product_sql)
                .bind(&line.product_id)
                .fetch_optional(&mut *tx)
                .await?
            {
                products.push(product);
            }
        }

        let plan = plan_sale(lines, &products)?;

        for deduction in plan.deductions() {
            let result = sqlx::query(
                "UPDATE products SET quantity = quantity - ?2 WHERE id = ?1 AND quantity >= ?2",
            )
            .bind(&deduction.product_id)
            .bind(deduction.quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
                        .bind(&deduction.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                warn!(
                    sale_id = %sale_id,
                    product_id = %deduction.product_id,
                    "Conditional stock deduction matched no row, rolling back"
                );

                let err = match available {
                    Some(available) => CoreError::InsufficientStock {
                        product_id: deduction.product_id,
                        name: deduction.name,
                        available,
                        requested: deduction.quantity,
                    },
                    None => CoreError::ProductNotFound(deduction.product_id),
                };
                return Err(err.into());
            }
        }

        let mut items = Vec::with_capacity(plan.lines.len());
        for (position, line) in plan.lines.iter().enumerate() {
            let item = SaleItem {
                id: generate_sale_item_id(),
                sale_id: sale_id.clone(),
                position: position as i64,
                product_id: line.product_id.clone(),
                name: line.name.clone(),
                sku: line.sku.clone(),
                unit_price_cents: line.unit_price.cents(),
                quantity: line.quantity,
                line_total_cents: line.line_total.cents(),
            };

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, position, product_id, name, sku,
                    unit_price_cents, quantity, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(item.position)
            .bind(&item.product_id)
            .bind(&item.name)
            .bind(&item.sku)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .execute(&mut *tx)
            .await?;

            items.push(item);
        }

        sqlx::query("UPDATE sales SET total_cents = ?2 WHERE id = ?1")
            .bind(&sale_id)
            .bind(plan.total.cents())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            total = %plan.total,
            items = items.len(),
            staff = %staff.username,
            "Sale recorded"
        );

        Ok(Sale {
            id: sale_id,
            items,
            total_cents: plan.total.cents(),
            staff_id: staff.user_id.clone(),
            staff_username: staff.username.clone(),
            created_at,
        })
    }

    /// Gets a sale with its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let Some(mut sale) = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        sale.items = self.get_items(id).await?;
        Ok(Some(sale))
    }

    /// Lists all sales, newest first, each with its items in line order.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC, rowid DESC");
        let mut sales = sqlx::query_as::<_, Sale>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let item_sql =
            format!("SELECT {SALE_ITEM_COLUMNS} FROM sale_items ORDER BY sale_id, position");
        let all_items = sqlx::query_as::<_, SaleItem>(&item_sql)
            .fetch_all(&self.pool)
            .await?;

        let mut by_sale: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for item in all_items {
            by_sale.entry(item.sale_id.clone()).or_default().push(item);
        }
        for sale in &mut sales {
            sale.items = by_sale.remove(&sale.id).unwrap_or_default();
        }

        debug!(count = sales.len(), "Listed sales");
        Ok(sales)
    }

    /// Gets all items for a sale in line order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let sql =
            format!("SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY position");
        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }
}

/// Generates a sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a sale item ID.
pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
