//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Lookup by id and by name (the external product collaborator)
//! - Name search with `LIKE`
//! - Insert / update / tombstone inside a catalog transaction
//! - Deactivation cascade from a category
//!
//! Outside of catalog edits (an admin setting an absolute count), stock
//! only moves through the [`StockLedger`](super::stock::StockLedger).
//!
//! ## Name Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cashier types: "geprek"                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  pattern = "%geprek%"   (%, _ and \ in the input are escaped)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  WHERE name LIKE ? ESCAPE '\' AND deleted_at IS NULL                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Ayam Geprek, Geprek Jumbo                (ORDER BY name)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use kasir_core::Product;

const SELECT_PRODUCT: &str = r#"
    SELECT
        id, name, category_id, description,
        normal_price, cost_price, discount_type, discount_amount,
        stock, active, available,
        created_at, updated_at, deleted_at
    FROM products
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let results = repo.list(Some("geprek"), 20, 0).await?;
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

    /// Gets a live product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_id_in(&mut conn, id).await
    }

    /// Same as [`ProductRepository::get_by_id`], on an open transaction.
    pub async fn get_by_id_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_PRODUCT} WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Gets a live product by its exact name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_name_in(&mut conn, name).await
    }

    pub async fn get_by_name_in(
        conn: &mut SqliteConnection,
        name: &str,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_PRODUCT} WHERE name = ? AND deleted_at IS NULL"
        ))
        .bind(name.trim())
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Lists live products, optionally filtered by a name substring.
    ///
    /// ## Arguments
    /// * `search` - Substring of the name; `None` or blank lists everything
    /// * `limit` / `offset` - Page window, ordered by name
    pub async fn list(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Product>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        debug!(search = ?search, limit, offset, "Listing products");

        let products = match search {
            Some(term) => {
                sqlx::query_as::<_, Product>(&format!(
                    r#"{SELECT_PRODUCT}
                    WHERE deleted_at IS NULL AND name LIKE ? ESCAPE '\'
                    ORDER BY name
                    LIMIT ? OFFSET ?"#
                ))
                .bind(like_pattern(term))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Product>(&format!(
                    r#"{SELECT_PRODUCT}
                    WHERE deleted_at IS NULL
                    ORDER BY name
                    LIMIT ? OFFSET ?"#
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        debug!(count = products.len(), "List returned products");
        Ok(products)
    }

    /// Gets the current stock of a live product.
    pub async fn stock_of(&self, id: &str) -> DbResult<Option<i64>> {
        let stock = sqlx::query_scalar::<_, i64>(
            "SELECT stock FROM products WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stock)
    }

    /// Inserts a fully-built product row.
    pub async fn insert_in(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category_id, description,
                normal_price, cost_price, discount_type, discount_amount,
                stock, active, available,
                created_at, updated_at, deleted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category_id)
        .bind(&product.description)
        .bind(product.normal_price)
        .bind(product.cost_price)
        .bind(product.discount_type)
        .bind(product.discount_amount)
        .bind(product.stock)
        .bind(product.active)
        .bind(product.available)
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product.deleted_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Rewrites the editable fields of a live product, stock included.
    pub async fn update_in(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?,
                category_id = ?,
                description = ?,
                normal_price = ?,
                cost_price = ?,
                discount_type = ?,
                discount_amount = ?,
                stock = ?,
                active = ?,
                available = ?,
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&product.name)
        .bind(&product.category_id)
        .bind(&product.description)
        .bind(product.normal_price)
        .bind(product.cost_price)
        .bind(product.discount_type)
        .bind(product.discount_amount)
        .bind(product.stock)
        .bind(product.active)
        .bind(product.available)
        .bind(product.updated_at)
        .bind(&product.id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Tombstones a product. Returns false when no live product matched.
    pub async fn soft_delete_in(
        conn: &mut SqliteConnection,
        id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, "Soft deleting product");

        let result = sqlx::query(
            "UPDATE products SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(at)
        .bind(at)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets `active = false` on every live product of a category.
    ///
    /// ## Returns
    /// Number of products deactivated.
    pub async fn deactivate_by_category_in(
        conn: &mut SqliteConnection,
        category_id: &str,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE products SET active = 0, updated_at = ?
            WHERE category_id = ? AND deleted_at IS NULL AND active = 1
            "#,
        )
        .bind(Utc::now())
        .bind(category_id)
        .execute(&mut *conn)
        .await?;

        debug!(category_id = %category_id, count = result.rows_affected(), "Deactivated products");
        Ok(result.rows_affected())
    }

    /// Counts live products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// `%term%` with LIKE metacharacters escaped by `\`.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
