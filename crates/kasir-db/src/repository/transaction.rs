//! # Transaction Repository
//!
//! Headers and line items for both carts and finalized transactions.
//!
//! ## Header Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   CART (transaction_type = 'cart', ORD-... code)                       │
//! │     insert_header_in ──► update_cart_header_in ──► ... (same row)      │
//! │     items: delete_items_in + insert_items_in on every save             │
//! │     soft_delete_in on discard                                          │
//! │                                                                         │
//! │   TRANSACTION (transaction_type = 'transaction', TRX-... code)         │
//! │     insert_header_in + insert_items_in, once                           │
//! │     update_in (payment / customer fields only)                         │
//! │     soft_delete_in (stock is never returned)                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line items are owned by their header: they are only ever written
//! together with it, in the same database transaction.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use kasir_core::{
    LineItemDetail, NewLineItem, Transaction, TransactionFilter, TransactionLineItem,
    TransactionType,
};

const SELECT_TRANSACTION: &str = r#"
    SELECT
        id, code, transaction_type, user_id, created_by, transaction_date,
        customer_name, delivery_type, table_number,
        payment_type, payment_method, payment_status,
        subtotal, total_discount, ppn, bill, payment,
        created_at, updated_at, deleted_at
    FROM transactions
"#;

/// Whether a user currently holds a draft cart.
///
/// ```text
///            submit_cart                     submit_cart
///  NoOpenCart ─────────────► OpenCart(row) ◄────────────┐
///      ▲                         │                      │
///      └──────── discard_cart ───┘──────────────────────┘
/// ```
#[derive(Debug, Clone)]
pub enum CartState {
    NoOpenCart,
    OpenCart(Transaction),
}

impl CartState {
    pub fn into_open(self) -> Option<Transaction> {
        match self {
            CartState::OpenCart(cart) => Some(cart),
            CartState::NoOpenCart => None,
        }
    }
}

/// Repository for transaction headers and line items.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a live header (cart or transaction) by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_id_in(&mut conn, id).await
    }

    pub async fn get_by_id_in(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Transaction>> {
        let header = sqlx::query_as::<_, Transaction>(&format!(
            "{SELECT_TRANSACTION} WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(header)
    }

    /// Gets a header by code, tombstoned or not.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Transaction>> {
        let header = sqlx::query_as::<_, Transaction>(&format!(
            "{SELECT_TRANSACTION} WHERE code = ?"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(header)
    }

    /// Resolves the user's cart state.
    ///
    /// Run inside the write transaction that acts on the result; the
    /// partial unique index `idx_transactions_open_cart` guarantees at
    /// most one row can match.
    pub async fn find_open_cart_in(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> DbResult<CartState> {
        let cart = sqlx::query_as::<_, Transaction>(&format!(
            r#"{SELECT_TRANSACTION}
            WHERE user_id = ? AND transaction_type = 'cart' AND deleted_at IS NULL"#
        ))
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        debug!(user_id = %user_id, open = cart.is_some(), "Resolved cart state");
        Ok(match cart {
            Some(cart) => CartState::OpenCart(cart),
            None => CartState::NoOpenCart,
        })
    }

    pub async fn find_open_cart(&self, user_id: &str) -> DbResult<CartState> {
        let mut conn = self.pool.acquire().await?;
        Self::find_open_cart_in(&mut conn, user_id).await
    }

    /// Line items of a header, in insertion order.
    pub async fn items_in(
        conn: &mut SqliteConnection,
        transaction_id: &str,
    ) -> DbResult<Vec<TransactionLineItem>> {
        let items = sqlx::query_as::<_, TransactionLineItem>(
            r#"
            SELECT id, transaction_id, product_id, qty, discount, subtotal, notes, created_at
            FROM transaction_line_items
            WHERE transaction_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    /// Line items joined with the product name, in insertion order.
    ///
    /// Tombstoned products keep their name here: a sale stays readable
    /// after its product is removed from the catalog.
    pub async fn item_details(&self, transaction_id: &str) -> DbResult<Vec<LineItemDetail>> {
        let items = sqlx::query_as::<_, LineItemDetail>(
            r#"
            SELECT
                li.id, li.transaction_id, li.product_id, li.qty,
                li.discount, li.subtotal, li.notes, li.created_at,
                p.name AS product_name
            FROM transaction_line_items li
            INNER JOIN products p ON p.id = li.product_id
            WHERE li.transaction_id = ?
            ORDER BY li.rowid
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists live finalized transactions, newest first.
    ///
    /// ## Filters
    /// - `payment_status` - exact match
    /// - `date` - calendar day of `transaction_date` (UTC)
    /// - `search` - substring of code or customer name
    pub async fn list(&self, filter: &TransactionFilter) -> DbResult<Vec<Transaction>> {
        let date = filter.date.map(|d| d.format("%Y-%m-%d").to_string());
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        debug!(
            status = ?filter.payment_status,
            date = ?date,
            search = ?search,
            limit = filter.limit,
            offset = filter.offset,
            "Listing transactions"
        );

        let rows = sqlx::query_as::<_, Transaction>(&format!(
            r#"{SELECT_TRANSACTION}
            WHERE transaction_type = 'transaction'
              AND deleted_at IS NULL
              AND (?1 IS NULL OR payment_status = ?1)
              AND (?2 IS NULL OR substr(transaction_date, 1, 10) = ?2)
              AND (?3 IS NULL OR code LIKE ?3 OR customer_name LIKE ?3)
            ORDER BY transaction_date DESC, code DESC
            LIMIT ?4 OFFSET ?5"#
        ))
        .bind(filter.payment_status)
        .bind(date)
        .bind(search)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // =========================================================================
    // Writes (always inside the caller's transaction)
    // =========================================================================

    pub async fn insert_header_in(conn: &mut SqliteConnection, header: &Transaction) -> DbResult<()> {
        debug!(
            id = %header.id,
            code = %header.code,
            transaction_type = header.transaction_type.as_str(),
            "Inserting transaction header"
        );

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, code, transaction_type, user_id, created_by, transaction_date,
                customer_name, delivery_type, table_number,
                payment_type, payment_method, payment_status,
                subtotal, total_discount, ppn, bill, payment,
                created_at, updated_at, deleted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&header.id)
        .bind(&header.code)
        .bind(header.transaction_type)
        .bind(&header.user_id)
        .bind(&header.created_by)
        .bind(header.transaction_date)
        .bind(&header.customer_name)
        .bind(header.delivery_type)
        .bind(header.table_number)
        .bind(header.payment_type)
        .bind(&header.payment_method)
        .bind(header.payment_status)
        .bind(header.subtotal)
        .bind(header.total_discount)
        .bind(header.ppn)
        .bind(header.bill)
        .bind(header.payment)
        .bind(header.created_at)
        .bind(header.updated_at)
        .bind(header.deleted_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Overwrites the draft fields of an open cart. Code, owner and
    /// creation time never change.
    pub async fn update_cart_header_in(
        conn: &mut SqliteConnection,
        cart: &Transaction,
    ) -> DbResult<()> {
        debug!(id = %cart.id, code = %cart.code, "Overwriting cart header");

        sqlx::query(
            r#"
            UPDATE transactions SET
                transaction_date = ?,
                delivery_type = ?,
                subtotal = ?,
                total_discount = ?,
                ppn = ?,
                bill = ?,
                updated_at = ?
            WHERE id = ? AND transaction_type = 'cart' AND deleted_at IS NULL
            "#,
        )
        .bind(cart.transaction_date)
        .bind(cart.delivery_type)
        .bind(cart.subtotal)
        .bind(cart.total_discount)
        .bind(cart.ppn)
        .bind(cart.bill)
        .bind(cart.updated_at)
        .bind(&cart.id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Rewrites the mutable fields of a finalized transaction.
    pub async fn update_in(conn: &mut SqliteConnection, header: &Transaction) -> DbResult<()> {
        debug!(id = %header.id, status = ?header.payment_status, "Updating transaction");

        sqlx::query(
            r#"
            UPDATE transactions SET
                customer_name = ?,
                table_number = ?,
                payment_type = ?,
                payment_method = ?,
                payment_status = ?,
                payment = ?,
                updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&header.customer_name)
        .bind(header.table_number)
        .bind(header.payment_type)
        .bind(&header.payment_method)
        .bind(header.payment_status)
        .bind(header.payment)
        .bind(header.updated_at)
        .bind(&header.id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Tombstones a header. Returns false when no live header matched.
    pub async fn soft_delete_in(
        conn: &mut SqliteConnection,
        id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, "Soft deleting transaction");

        let result = sqlx::query(
            "UPDATE transactions SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(at)
        .bind(at)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Physically removes a header's line items (used when a cart is
    /// re-saved; the header itself is never physically deleted).
    pub async fn delete_items_in(conn: &mut SqliteConnection, transaction_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM transaction_line_items WHERE transaction_id = ?")
            .bind(transaction_id)
            .execute(&mut *conn)
            .await?;

        debug!(transaction_id = %transaction_id, count = result.rows_affected(), "Deleted line items");
        Ok(result.rows_affected())
    }

    /// Inserts line items for a header and returns the stored rows.
    pub async fn insert_items_in(
        conn: &mut SqliteConnection,
        transaction_id: &str,
        items: &[NewLineItem],
        at: DateTime<Utc>,
    ) -> DbResult<Vec<TransactionLineItem>> {
        let mut stored = Vec::with_capacity(items.len());

        for item in items {
            let row = TransactionLineItem {
                id: Uuid::new_v4().to_string(),
                transaction_id: transaction_id.to_string(),
                product_id: item.product_id.clone(),
                qty: item.qty,
                discount: item.discount,
                subtotal: item.subtotal,
                notes: item.notes.clone(),
                created_at: at,
            };

            sqlx::query(
                r#"
                INSERT INTO transaction_line_items (
                    id, transaction_id, product_id, qty, discount, subtotal, notes, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&row.id)
            .bind(&row.transaction_id)
            .bind(&row.product_id)
            .bind(row.qty)
            .bind(row.discount)
            .bind(row.subtotal)
            .bind(&row.notes)
            .bind(row.created_at)
            .execute(&mut *conn)
            .await?;

            stored.push(row);
        }

        debug!(transaction_id = %transaction_id, count = stored.len(), "Inserted line items");
        Ok(stored)
    }

    /// Counts live headers of one type.
    pub async fn count(&self, transaction_type: TransactionType) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE transaction_type = ? AND deleted_at IS NULL",
        )
        .bind(transaction_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
