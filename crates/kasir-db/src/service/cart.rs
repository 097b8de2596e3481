//! # Order (Cart) Service
//!
//! Turns a user's draft cart into a persisted order, replacing any prior
//! open cart and moving only the stock delta.
//!
//! ## submit_cart
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate payload (non-empty, qty 1..=999, ≤ 100 lines)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN IMMEDIATE                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  user live? ── no ──► UserNotFound                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  find_open_cart_in(user)                                               │
//! │       │                                                                 │
//! │       ├── OpenCart(row)                                                │
//! │       │     increment(old items)      release what the cart held       │
//! │       │     delete_items_in(row)                                       │
//! │       │     update_cart_header_in     same id, same code               │
//! │       │     insert_items_in(new)                                       │
//! │       │     decrement(new items)      reserve against full stock       │
//! │       │                                                                 │
//! │       └── NoOpenCart                                                   │
//! │             next_code_in(ORD)                                          │
//! │             insert_header_in          unique index: one cart per user  │
//! │             insert_items_in(new)                                       │
//! │             decrement(new items)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ──► code          any error ──► ROLLBACK, nothing changed      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Releasing before reserving means a cart's own reservation never counts
//! against itself: shrinking a cart always succeeds, growing it succeeds
//! only if the extra quantity is available.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::pool::{begin_write, commit};
use crate::repository::sequence::{today, SequenceRepository};
use crate::repository::stock::StockLedger;
use crate::repository::transaction::{CartState, TransactionRepository};
use crate::repository::user::UserRepository;
use crate::service::{ServiceError, ServiceResult};
use kasir_core::validation::validate_line_items;
use kasir_core::{
    CartPayload, CoreError, Money, Transaction, TransactionDetail, TransactionTotals,
    TransactionType,
};

const OPEN_CART_INDEX_TARGET: &str = "transactions.user_id";

/// Cart reconciliation.
#[derive(Debug, Clone)]
pub struct OrderService {
    pool: SqlitePool,
    prefix: String,
}

impl OrderService {
    pub fn new(pool: SqlitePool, prefix: impl Into<String>) -> Self {
        OrderService {
            pool,
            prefix: prefix.into(),
        }
    }

    /// Saves the user's cart, creating it on first use.
    ///
    /// ## Returns
    /// The cart code: freshly issued for a new cart, unchanged for an
    /// overwritten one.
    ///
    /// ## Errors
    /// - `EmptyOrder`, `CartTooLarge`, `InvalidQuantity`, `QuantityTooLarge`
    /// - `UserNotFound`, `ProductNotFound`
    /// - `InsufficientStock` naming the product
    /// - `OpenCartConflict` when a concurrent request created this user's
    ///   cart first (retry resolves it as an overwrite)
    #[instrument(skip(self, payload), fields(items = payload.items.len()))]
    pub async fn submit_cart(&self, user_id: &str, payload: CartPayload) -> ServiceResult<String> {
        validate_line_items(&payload.items)?;

        let totals =
            TransactionTotals::from_lines(&payload.items, Money::from_units(payload.ppn))?;
        let now = Utc::now();

        let mut tx = begin_write(&self.pool).await?;

        ensure_user(&mut tx, user_id).await?;

        let code = match TransactionRepository::find_open_cart_in(&mut tx, user_id).await? {
            CartState::OpenCart(cart) => {
                let held = TransactionRepository::items_in(&mut tx, &cart.id).await?;
                StockLedger::increment(&mut tx, &held).await?;
                TransactionRepository::delete_items_in(&mut tx, &cart.id).await?;

                let cart = Transaction {
                    transaction_date: payload.transaction_date.unwrap_or(now),
                    delivery_type: Some(payload.delivery_type),
                    subtotal: totals.subtotal.units(),
                    total_discount: totals.total_discount.units(),
                    ppn: totals.ppn.units(),
                    bill: totals.bill.units(),
                    updated_at: now,
                    ..cart
                };
                TransactionRepository::update_cart_header_in(&mut tx, &cart).await?;
                TransactionRepository::insert_items_in(&mut tx, &cart.id, &payload.items, now)
                    .await?;
                StockLedger::decrement(&mut tx, &payload.items).await?;

                info!(code = %cart.code, released = held.len(), "Cart overwritten");
                cart.code
            }
            CartState::NoOpenCart => {
                let code = SequenceRepository::next_code_in(&mut tx, &self.prefix, today()).await?;

                let cart = Transaction {
                    id: Uuid::new_v4().to_string(),
                    code,
                    transaction_type: TransactionType::Cart,
                    user_id: user_id.to_string(),
                    created_by: None,
                    transaction_date: payload.transaction_date.unwrap_or(now),
                    customer_name: None,
                    delivery_type: Some(payload.delivery_type),
                    table_number: None,
                    payment_type: None,
                    payment_method: None,
                    payment_status: None,
                    subtotal: totals.subtotal.units(),
                    total_discount: totals.total_discount.units(),
                    ppn: totals.ppn.units(),
                    bill: totals.bill.units(),
                    payment: 0,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                };

                TransactionRepository::insert_header_in(&mut tx, &cart)
                    .await
                    .map_err(|e| {
                        if e.is_unique_violation_on(OPEN_CART_INDEX_TARGET) {
                            warn!(user_id = %user_id, "Lost open-cart race");
                            ServiceError::from(CoreError::OpenCartConflict {
                                user_id: user_id.to_string(),
                            })
                        } else {
                            e.into()
                        }
                    })?;
                TransactionRepository::insert_items_in(&mut tx, &cart.id, &payload.items, now)
                    .await?;
                StockLedger::decrement(&mut tx, &payload.items).await?;

                info!(code = %cart.code, "Cart created");
                cart.code
            }
        };

        commit(tx).await?;
        Ok(code)
    }

    /// The user's open cart with its line items, or `None`.
    pub async fn get_open_cart(&self, user_id: &str) -> ServiceResult<Option<TransactionDetail>> {
        let repo = TransactionRepository::new(self.pool.clone());

        let Some(header) = repo.find_open_cart(user_id).await?.into_open() else {
            return Ok(None);
        };
        let items = repo.item_details(&header.id).await?;

        Ok(Some(TransactionDetail { header, items }))
    }

    /// Releases the cart's stock and tombstones it.
    ///
    /// ## Returns
    /// The discarded cart's code, or `None` when there was nothing to
    /// discard.
    #[instrument(skip(self))]
    pub async fn discard_cart(&self, user_id: &str) -> ServiceResult<Option<String>> {
        let mut tx = begin_write(&self.pool).await?;

        ensure_user(&mut tx, user_id).await?;

        let Some(cart) = TransactionRepository::find_open_cart_in(&mut tx, user_id)
            .await?
            .into_open()
        else {
            return Ok(None);
        };

        let held = TransactionRepository::items_in(&mut tx, &cart.id).await?;
        StockLedger::increment(&mut tx, &held).await?;
        TransactionRepository::soft_delete_in(&mut tx, &cart.id, Utc::now()).await?;

        commit(tx).await?;

        info!(code = %cart.code, released = held.len(), "Cart discarded");
        Ok(Some(cart.code))
    }
}

pub(crate) async fn ensure_user(conn: &mut SqliteConnection, user_id: &str) -> ServiceResult<()> {
    match UserRepository::get_by_id_in(conn, user_id).await? {
        Some(_) => Ok(()),
        None => Err(CoreError::UserNotFound(user_id.to_string()).into()),
    }
}
