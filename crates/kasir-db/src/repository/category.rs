//! # Category Repository
//!
//! Product categories and their denormalized `total_product` counter.
//!
//! ## Counter Maintenance
//! ```text
//! create_product      ──► increment_count_in(category)
//! delete_product      ──► decrement_count_in(category)
//! move product A → B  ──► decrement_count_in(A) + increment_count_in(B)
//! ```
//! All three run inside the same transaction as the product write. The
//! decrement is floored at zero.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use kasir_core::ProductCategory;

const SELECT_CATEGORY: &str = r#"
    SELECT id, name, total_product, status, created_at, updated_at, deleted_at
    FROM product_categories
"#;

/// Repository for product category operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Gets a live category by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ProductCategory>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_id_in(&mut conn, id).await
    }

    pub async fn get_by_id_in(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<ProductCategory>> {
        let category = sqlx::query_as::<_, ProductCategory>(&format!(
            "{SELECT_CATEGORY} WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(category)
    }

    /// Gets a live category by its (already normalized) name.
    pub async fn get_by_name_in(
        conn: &mut SqliteConnection,
        name: &str,
    ) -> DbResult<Option<ProductCategory>> {
        let category = sqlx::query_as::<_, ProductCategory>(&format!(
            "{SELECT_CATEGORY} WHERE name = ? AND deleted_at IS NULL"
        ))
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(category)
    }

    /// Lists live categories ordered by name.
    pub async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<ProductCategory>> {
        let categories = sqlx::query_as::<_, ProductCategory>(&format!(
            "{SELECT_CATEGORY} WHERE deleted_at IS NULL ORDER BY name LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn insert_in(conn: &mut SqliteConnection, category: &ProductCategory) -> DbResult<()> {
        debug!(id = %category.id, name = %category.name, "Inserting category");

        sqlx::query(
            r#"
            INSERT INTO product_categories (
                id, name, total_product, status, created_at, updated_at, deleted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(category.total_product)
        .bind(category.status)
        .bind(category.created_at)
        .bind(category.updated_at)
        .bind(category.deleted_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Rewrites name and status of a live category.
    pub async fn update_in(conn: &mut SqliteConnection, category: &ProductCategory) -> DbResult<()> {
        debug!(id = %category.id, status = category.status, "Updating category");

        sqlx::query(
            r#"
            UPDATE product_categories SET name = ?, status = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&category.name)
        .bind(category.status)
        .bind(category.updated_at)
        .bind(&category.id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Tombstones a category. Returns false when no live category matched.
    pub async fn soft_delete_in(
        conn: &mut SqliteConnection,
        id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE product_categories SET deleted_at = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(at)
        .bind(at)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn increment_count_in(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE product_categories
            SET total_product = total_product + 1, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Decrements the product counter, never below zero.
    pub async fn decrement_count_in(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE product_categories
            SET total_product = MAX(total_product - 1, 0), updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
