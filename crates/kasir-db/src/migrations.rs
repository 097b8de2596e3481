//! # Database Migrations
//!
//! Embedded SQL migrations for the Kasir schema, applied by
//! [`Database::new`](crate::pool::Database::new) when `run_migrations` is set.
//!
//! ## What the Schema Enforces
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products.stock                CHECK (stock >= 0)                      │
//! │       backstop under StockLedger's conditional decrement               │
//! │                                                                         │
//! │  transaction_line_items.qty    CHECK (qty > 0)                         │
//! │                                                                         │
//! │  idx_transactions_open_cart    UNIQUE (user_id)                        │
//! │       WHERE transaction_type = 'cart' AND deleted_at IS NULL           │
//! │       surfaces as "transactions.user_id" → OpenCartConflict            │
//! │                                                                         │
//! │  idx_*_name_live               UNIQUE (name) among live rows           │
//! │       a tombstoned name can be reused                                  │
//! │                                                                         │
//! │  sequence_counters             PRIMARY KEY (prefix, date_key)          │
//! │       target of the next-code upsert                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Schema changes go in a new `migrations/sqlite/NNN_*.sql` file.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies pending migrations. Already-applied files are skipped.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// `(embedded, successfully applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // The bookkeeping table doesn't exist until the first run.
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    Ok((total, applied as usize))
}
