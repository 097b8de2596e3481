//! # Stock Ledger
//!
//! The only writer of `products.stock` after a product is created.
//!
//! ## Conditional Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line items: [P1 x2, P2 x1, P1 x3]                                     │
//! │       │                                                                 │
//! │       ▼  aggregate_quantities (BTreeMap, sorted by product id)         │
//! │  { P1: 5, P2: 1 }                                                      │
//! │       │                                                                 │
//! │       ▼  one guarded UPDATE per product                                │
//! │  UPDATE products SET stock = stock - 5                                 │
//! │  WHERE id = 'P1' AND deleted_at IS NULL AND stock >= 5                 │
//! │       │                                                                 │
//! │       ├── 1 row  ──► next product                                      │
//! │       │                                                                 │
//! │       └── 0 rows ──► re-read P1 in the same transaction                │
//! │                      ├── missing  ──► ProductNotFound                  │
//! │                      └── present  ──► InsufficientStock {              │
//! │                                         product, available, requested }│
//! │                                                                         │
//! │  Any error leaves earlier UPDATEs in the caller's open transaction,    │
//! │  which the caller drops: nothing is applied.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guard lives in the `WHERE` clause so the database, not this code,
//! decides whether stock suffices at the instant of the write.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::product::ProductRepository;
use crate::service::{ServiceError, ServiceResult};
use kasir_core::stock::{aggregate_quantities, StockLine};
use kasir_core::CoreError;

/// Stock adjustments for a batch of line items.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    /// Reserves stock for a batch of line items.
    ///
    /// Must run inside the caller's write transaction; the batch is
    /// all-or-nothing only because the caller rolls back on error.
    ///
    /// ## Errors
    /// - `CoreError::InvalidQuantity` for a qty ≤ 0
    /// - `CoreError::ProductNotFound` for a missing or deleted product
    /// - `CoreError::InsufficientStock` naming the first product that
    ///   cannot cover its aggregated quantity
    pub async fn decrement<L: StockLine>(
        conn: &mut SqliteConnection,
        items: &[L],
    ) -> ServiceResult<()> {
        let totals = aggregate_quantities(items)?;
        let now = Utc::now();

        for (product_id, qty) in &totals {
            let result = sqlx::query(
                r#"
                UPDATE products SET stock = stock - ?, updated_at = ?
                WHERE id = ? AND deleted_at IS NULL AND stock >= ?
                "#,
            )
            .bind(qty)
            .bind(now)
            .bind(product_id)
            .bind(qty)
            .execute(&mut *conn)
            .await
            .map_err(DbError::from)?;

            if result.rows_affected() == 0 {
                return Err(Self::decrement_failure(conn, product_id, *qty).await);
            }

            debug!(product_id = %product_id, qty, "Stock decremented");
        }

        Ok(())
    }

    /// Releases stock previously reserved for a batch of line items.
    ///
    /// No upper bound applies. Deleted products still receive their stock
    /// back so a restored product carries the correct count.
    ///
    /// ## Errors
    /// `CoreError::ProductNotFound` when the product row does not exist.
    pub async fn increment<L: StockLine>(
        conn: &mut SqliteConnection,
        items: &[L],
    ) -> ServiceResult<()> {
        let totals = aggregate_quantities(items)?;
        let now = Utc::now();

        for (product_id, qty) in &totals {
            let result = sqlx::query(
                "UPDATE products SET stock = stock + ?, updated_at = ? WHERE id = ?",
            )
            .bind(qty)
            .bind(now)
            .bind(product_id)
            .execute(&mut *conn)
            .await
            .map_err(DbError::from)?;

            if result.rows_affected() == 0 {
                return Err(CoreError::ProductNotFound(product_id.clone()).into());
            }

            debug!(product_id = %product_id, qty, "Stock released");
        }

        Ok(())
    }

    /// Explains a zero-row decrement from inside the same transaction.
    async fn decrement_failure(
        conn: &mut SqliteConnection,
        product_id: &str,
        requested: i64,
    ) -> ServiceError {
        match ProductRepository::get_by_id_in(conn, product_id).await {
            Ok(Some(product)) => {
                warn!(
                    product = %product.name,
                    available = product.stock,
                    requested,
                    "Insufficient stock"
                );
                CoreError::insufficient_stock(product.name, product.stock, requested).into()
            }
            Ok(None) => CoreError::ProductNotFound(product_id.to_string()).into(),
            Err(e) => e.into(),
        }
    }

    /// Current stock of a live product, outside any transaction.
    pub async fn available(&self, product_id: &str) -> DbResult<Option<i64>> {
        ProductRepository::new(self.pool.clone()).stock_of(product_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{begin_write, Database, DbConfig};
    use crate::service::fixtures::{line, seed_category, seed_product};

    #[tokio::test]
    async fn test_decrement_aggregates_per_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let cat = seed_category(&db, "minuman").await;
        let teh = seed_product(&db, &cat, "Es Teh Manis", 10).await;

        let mut tx = begin_write(db.pool()).await.unwrap();
        let items = [line(&teh.product.id, 2), line(&teh.product.id, 3)];
        StockLedger::decrement(&mut tx, &items).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(db.stock().available(&teh.product.id).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_insufficient_stock_names_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let cat = seed_category(&db, "minuman").await;
        let teh = seed_product(&db, &cat, "Es Teh Manis", 3).await;

        let mut tx = begin_write(db.pool()).await.unwrap();
        let err = StockLedger::decrement(&mut tx, &[line(&teh.product.id, 5)])
            .await
            .unwrap_err();
        drop(tx);

        match err {
            ServiceError::Core(CoreError::InsufficientStock {
                product,
                available,
                requested,
            }) => {
                assert_eq!(product, "Es Teh Manis");
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(db.stock().available(&teh.product.id).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing_after_rollback() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let cat = seed_category(&db, "makanan").await;
        let nasi = seed_product(&db, &cat, "Nasi Goreng", 10).await;
        let ayam = seed_product(&db, &cat, "Ayam Geprek", 1).await;

        let mut tx = begin_write(db.pool()).await.unwrap();
        let items = [line(&nasi.product.id, 4), line(&ayam.product.id, 2)];
        let result = StockLedger::decrement(&mut tx, &items).await;
        assert!(result.is_err());
        tx.rollback().await.unwrap();

        assert_eq!(db.stock().available(&nasi.product.id).await.unwrap(), Some(10));
        assert_eq!(db.stock().available(&ayam.product.id).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut tx = begin_write(db.pool()).await.unwrap();
        let err = StockLedger::decrement(&mut tx, &[line("missing", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::ProductNotFound(_))));

        let err = StockLedger::increment(&mut tx, &[line("missing", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_increment_releases() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let cat = seed_category(&db, "minuman").await;
        let kopi = seed_product(&db, &cat, "Kopi Susu", 0).await;

        let mut tx = begin_write(db.pool()).await.unwrap();
        StockLedger::increment(&mut tx, &[line(&kopi.product.id, 7)]).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(db.stock().available(&kopi.product.id).await.unwrap(), Some(7));
    }
}
