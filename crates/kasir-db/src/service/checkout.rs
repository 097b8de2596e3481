//! # Checkout Service
//!
//! Walk-in sales: a finalized transaction with no preceding cart.
//!
//! ## create_transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. validate payload, derive totals (checked sums)                      │
//! │  2. user live?                                   ── no ──► NotFound     │
//! │  3. pre-check (no lock): qty ≤ stock per product ── no ──► BadRequest  │
//! │       fast rejection with the product named; may race                  │
//! │  4. BEGIN IMMEDIATE                                                    │
//! │       next_code_in(TRX)                                                │
//! │       insert_header_in (totals derived from the lines)                 │
//! │       insert_items_in                                                  │
//! │       StockLedger::decrement  ◄── the authoritative check              │
//! │  5. COMMIT ──► code                                                    │
//! │                                                                         │
//! │  A decrement that matches no row (stock taken between 3 and 4) rolls   │
//! │  back header, items and code number together.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Finalized transactions never give stock back: update rewrites payment
//! and customer fields only, delete is a tombstone.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::pool::{begin_write, commit};
use crate::repository::product::ProductRepository;
use crate::repository::sequence::{today, SequenceRepository};
use crate::repository::stock::StockLedger;
use crate::repository::transaction::TransactionRepository;
use crate::repository::user::UserRepository;
use crate::service::ServiceResult;
use kasir_core::stock::aggregate_quantities;
use kasir_core::validation::{
    validate_amount, validate_line_items, validate_search_query, validate_table_number,
};
use kasir_core::{
    CheckoutPayload, CoreError, CoreResult, Money, PaymentStatus, Transaction, TransactionDetail,
    TransactionFilter, TransactionTotals, TransactionType, UpdateTransaction, ValidationError,
};

/// Maximum page size for [`CheckoutService::list_transactions`].
pub const MAX_PAGE_SIZE: i64 = 500;

/// Walk-in checkout and finalized transaction maintenance.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
    prefix: String,
}

impl CheckoutService {
    pub fn new(pool: SqlitePool, prefix: impl Into<String>) -> Self {
        CheckoutService {
            pool,
            prefix: prefix.into(),
        }
    }

    /// Commits a walk-in sale.
    ///
    /// ## Returns
    /// The generated code only (`TRX-YYMMDDNNNN`).
    ///
    /// ## Errors
    /// - `EmptyOrder`, `CartTooLarge`, `InvalidQuantity`, `QuantityTooLarge`,
    ///   `Validation`
    /// - `UserNotFound`, `ProductNotFound`
    /// - `InsufficientStock { product, available, requested }`, from the
    ///   pre-check or from the conditional decrement at commit time
    #[instrument(skip(self, payload), fields(items = payload.items.len()))]
    pub async fn create_transaction(
        &self,
        user_id: &str,
        payload: CheckoutPayload,
    ) -> ServiceResult<String> {
        validate_checkout(&payload)?;
        let totals =
            TransactionTotals::from_lines(&payload.items, Money::from_units(payload.ppn))?;

        if UserRepository::new(self.pool.clone())
            .get_by_id(user_id)
            .await?
            .is_none()
        {
            return Err(CoreError::UserNotFound(user_id.to_string()).into());
        }

        self.precheck_stock(&payload).await?;

        let now = Utc::now();

        let mut tx = begin_write(&self.pool).await?;

        let code = SequenceRepository::next_code_in(&mut tx, &self.prefix, today()).await?;

        let header = Transaction {
            id: Uuid::new_v4().to_string(),
            code,
            transaction_type: TransactionType::Transaction,
            user_id: user_id.to_string(),
            created_by: payload.created_by,
            transaction_date: payload.transaction_date.unwrap_or(now),
            customer_name: Some(payload.customer_name.trim().to_string()),
            delivery_type: Some(payload.delivery_type),
            table_number: payload.table_number,
            payment_type: Some(payload.payment_type),
            payment_method: payload.payment_method,
            payment_status: Some(payload.payment_status.unwrap_or(PaymentStatus::Pending)),
            subtotal: totals.subtotal.units(),
            total_discount: totals.total_discount.units(),
            ppn: totals.ppn.units(),
            bill: totals.bill.units(),
            payment: payload.payment,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        TransactionRepository::insert_header_in(&mut tx, &header).await?;
        TransactionRepository::insert_items_in(&mut tx, &header.id, &payload.items, now).await?;

        if let Err(err) = StockLedger::decrement(&mut tx, &payload.items).await {
            warn!(code = %header.code, error = %err, "Checkout rolled back at commit");
            return Err(err);
        }

        commit(tx).await?;

        info!(
            code = %header.code,
            bill = %totals.bill,
            items = payload.items.len(),
            "Transaction committed"
        );
        Ok(header.code)
    }

    /// Fast rejection before any lock is taken.
    async fn precheck_stock(&self, payload: &CheckoutPayload) -> ServiceResult<()> {
        let products = ProductRepository::new(self.pool.clone());

        for (product_id, requested) in aggregate_quantities(&payload.items)? {
            let product = products
                .get_by_id(&product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;

            if !product.has_stock_for(requested) {
                warn!(
                    product = %product.name,
                    available = product.stock,
                    requested,
                    "Checkout rejected by pre-check"
                );
                return Err(
                    CoreError::insufficient_stock(product.name, product.stock, requested).into(),
                );
            }
        }

        Ok(())
    }

    /// Rewrites payment, status and customer fields of a finalized
    /// transaction. Stock is untouched.
    #[instrument(skip(self, changes))]
    pub async fn update_transaction(
        &self,
        id: &str,
        changes: UpdateTransaction,
    ) -> ServiceResult<Transaction> {
        validate_table_number(changes.table_number).map_err(CoreError::from)?;
        if let Some(payment) = changes.payment {
            validate_amount("payment", payment).map_err(CoreError::from)?;
        }

        let mut tx = begin_write(&self.pool).await?;

        let current = TransactionRepository::get_by_id_in(&mut tx, id)
            .await?
            .filter(|t| !t.is_cart())
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;

        let updated = Transaction {
            customer_name: changes
                .customer_name
                .map(|n| n.trim().to_string())
                .or(current.customer_name.clone()),
            table_number: changes.table_number.or(current.table_number),
            payment_type: changes.payment_type.or(current.payment_type),
            payment_method: changes.payment_method.or(current.payment_method.clone()),
            payment_status: changes.payment_status.or(current.payment_status),
            payment: changes.payment.unwrap_or(current.payment),
            updated_at: Utc::now(),
            ..current
        };

        TransactionRepository::update_in(&mut tx, &updated).await?;
        commit(tx).await?;

        info!(code = %updated.code, status = ?updated.payment_status, "Transaction updated");
        Ok(updated)
    }

    /// Tombstones a finalized transaction. Sold stock stays sold.
    #[instrument(skip(self))]
    pub async fn delete_transaction(&self, id: &str) -> ServiceResult<Transaction> {
        let mut tx = begin_write(&self.pool).await?;

        let mut header = TransactionRepository::get_by_id_in(&mut tx, id)
            .await?
            .filter(|t| !t.is_cart())
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;

        let now = Utc::now();
        TransactionRepository::soft_delete_in(&mut tx, id, now).await?;
        commit(tx).await?;

        header.deleted_at = Some(now);
        header.updated_at = now;
        info!(code = %header.code, "Transaction deleted");
        Ok(header)
    }

    /// A live finalized transaction with its line items.
    pub async fn get_transaction(&self, id: &str) -> ServiceResult<TransactionDetail> {
        let repo = TransactionRepository::new(self.pool.clone());

        let header = repo
            .get_by_id(id)
            .await?
            .filter(|t| !t.is_cart())
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;
        let items = repo.item_details(&header.id).await?;

        Ok(TransactionDetail { header, items })
    }

    pub async fn list_transactions(
        &self,
        mut filter: TransactionFilter,
    ) -> ServiceResult<Vec<Transaction>> {
        validate_page(filter.limit, filter.offset)?;
        filter.search = filter
            .search
            .as_deref()
            .map(validate_search_query)
            .transpose()
            .map_err(CoreError::from)?;

        Ok(TransactionRepository::new(self.pool.clone())
            .list(&filter)
            .await?)
    }
}

fn validate_checkout(payload: &CheckoutPayload) -> CoreResult<()> {
    validate_line_items(&payload.items)?;
    if payload.customer_name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "customer name".to_string(),
        }
        .into());
    }
    validate_table_number(payload.table_number)?;
    validate_amount("ppn", payload.ppn)?;
    validate_amount("payment", payload.payment)?;
    Ok(())
}

fn validate_page(limit: i64, offset: i64) -> CoreResult<()> {
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE,
        }
        .into());
    }
    validate_amount("offset", offset)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::service::fixtures::{line, seed_category, seed_product, seed_user};
    use crate::service::ServiceError;
    use chrono::{NaiveDate, TimeZone};
    use kasir_core::sequence::parse_code;
    use kasir_core::{ApiResponse, DeliveryType, ErrorKind, NewLineItem, PaymentType};

    fn checkout(items: Vec<NewLineItem>) -> CheckoutPayload {
        CheckoutPayload {
            created_by: None,
            customer_name: "Budi".into(),
            table_number: Some(4),
            payment_type: PaymentType::Now,
            payment_method: Some("cash".into()),
            payment_status: Some(PaymentStatus::Success),
            payment: 100_000,
            transaction_date: None,
            delivery_type: DeliveryType::DineIn,
            ppn: 0,
            items,
        }
    }

    async fn stock(db: &Database, product_id: &str) -> i64 {
        db.stock().available(product_id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_checkout_decrements_and_returns_code() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = seed_user(&db, "kasir@kasir.id").await;
        let cat = seed_category(&db, "makanan").await;
        let p = seed_product(&db, &cat, "Ayam Geprek", 10).await;

        let code = db
            .checkout()
            .create_transaction(&user.id, checkout(vec![line(&p.product.id, 4)]))
            .await
            .unwrap();

        let parsed = parse_code(&code).unwrap();
        assert_eq!(parsed.prefix, "TRX");
        assert_eq!(parsed.date, today());
        assert_eq!(code.len(), "TRX-".len() + 10);
        assert_eq!(stock(&db, &p.product.id).await, 6);
    }

    #[tokio::test]
    async fn test_oversell_is_rejected_with_product_named() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = seed_user(&db, "kasir@kasir.id").await;
        let cat = seed_category(&db, "minuman").await;
        let p = seed_product(&db, &cat, "Es Teh Manis", 3).await;

        let result = db
            .checkout()
            .create_transaction(&user.id, checkout(vec![line(&p.product.id, 5)]))
            .await;

        let envelope = ApiResponse::from_result(result);
        assert!(!envelope.success);
        assert_eq!(envelope.code, 400);
        assert_eq!(
            envelope.message,
            "Insufficient stock for Es Teh Manis: available 3, requested 5"
        );
        assert_eq!(stock(&db, &p.product.id).await, 3);
    }

    #[tokio::test]
    async fn test_split_lines_are_checked_as_one_quantity() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = seed_user(&db, "kasir@kasir.id").await;
        let cat = seed_category(&db, "minuman").await;
        let p = seed_product(&db, &cat, "Kopi Susu", 5).await;

        let err = db
            .checkout()
            .create_transaction(
                &user.id,
                checkout(vec![line(&p.product.id, 3), line(&p.product.id, 3)]),
            )
            .await
            .unwrap_err();

        match err {
            ServiceError::Core(CoreError::InsufficientStock { requested, .. }) => {
                assert_eq!(requested, 6)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_commit_time_oversell_persists_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = seed_user(&db, "kasir@kasir.id").await;
        let cat = seed_category(&db, "makanan").await;
        let nasi = seed_product(&db, &cat, "Nasi Goreng", 10).await;
        let ayam = seed_product(&db, &cat, "Ayam Bakar", 2).await;

        let service = db.checkout();
        let payload = checkout(vec![line(&nasi.product.id, 4), line(&ayam.product.id, 2)]);

        // Passes the pre-check, then stock disappears before commit.
        service.precheck_stock(&payload).await.unwrap();
        sqlx::query("UPDATE products SET stock = 1 WHERE id = ?")
            .bind(&ayam.product.id)
            .execute(db.pool())
            .await
            .unwrap();

        let mut tx = begin_write(db.pool()).await.unwrap();
        let code = SequenceRepository::next_code_in(&mut tx, "TRX", today()).await.unwrap();
        let header = Transaction {
            id: Uuid::new_v4().to_string(),
            code,
            transaction_type: TransactionType::Transaction,
            user_id: user.id.clone(),
            created_by: None,
            transaction_date: Utc::now(),
            customer_name: Some("Budi".into()),
            delivery_type: None,
            table_number: None,
            payment_type: None,
            payment_method: None,
            payment_status: None,
            subtotal: 60_000,
            total_discount: 0,
            ppn: 0,
            bill: 60_000,
            payment: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        TransactionRepository::insert_header_in(&mut tx, &header).await.unwrap();
        TransactionRepository::insert_items_in(&mut tx, &header.id, &payload.items, Utc::now())
            .await
            .unwrap();
        let err = StockLedger::decrement(&mut tx, &payload.items).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        drop(tx);

        assert_eq!(stock(&db, &nasi.product.id).await, 10);
        assert_eq!(stock(&db, &ayam.product.id).await, 1);
        assert_eq!(
            db.transactions().count(TransactionType::Transaction).await.unwrap(),
            0
        );
        assert!(db.transactions().get_by_id(&header.id).await.unwrap().is_none());
        assert_eq!(db.sequences().current("TRX", today()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_multi_item_oversell_changes_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = seed_user(&db, "kasir@kasir.id").await;
        let cat = seed_category(&db, "makanan").await;
        let nasi = seed_product(&db, &cat, "Nasi Goreng", 10).await;
        let ayam = seed_product(&db, &cat, "Ayam Bakar", 1).await;

        let err = db
            .checkout()
            .create_transaction(
                &user.id,
                checkout(vec![line(&nasi.product.id, 4), line(&ayam.product.id, 2)]),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        assert_eq!(stock(&db, &nasi.product.id).await, 10);
        assert_eq!(stock(&db, &ayam.product.id).await, 1);
        assert_eq!(
            db.transactions().count(TransactionType::Transaction).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_totals_are_derived_from_lines() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = seed_user(&db, "kasir@kasir.id").await;
        let cat = seed_category(&db, "makanan").await;
        let p = seed_product(&db, &cat, "Sate Ayam", 10).await;

        let mut payload = checkout(vec![NewLineItem {
            product_id: p.product.id.clone(),
            qty: 2,
            discount: 5_000,
            subtotal: 50_000,
            notes: Some("tanpa bawang".into()),
        }]);
        payload.ppn = 4_500;

        let code = db.checkout().create_transaction(&user.id, payload).await.unwrap();
        let header = db.transactions().get_by_code(&code).await.unwrap().unwrap();

        assert_eq!(header.subtotal, 50_000);
        assert_eq!(header.total_discount, 5_000);
        assert_eq!(header.ppn, 4_500);
        assert_eq!(header.bill, 49_500);
        assert_eq!(header.change(), Money::from_units(50_500));

        let detail = db.checkout().get_transaction(&header.id).await.unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].item.notes.as_deref(), Some("tanpa bawang"));
        assert_eq!(detail.items[0].product_name, "Sate Ayam");
    }

    #[tokio::test]
    async fn test_validation_and_lookup_failures() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = seed_user(&db, "kasir@kasir.id").await;

        let err = db
            .checkout()
            .create_transaction(&user.id, checkout(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::EmptyOrder)));

        let err = db
            .checkout()
            .create_transaction(&user.id, checkout(vec![line("ghost", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::ProductNotFound(_))));

        let err = db
            .checkout()
            .create_transaction("ghost", checkout(vec![line("ghost", 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let mut blank = checkout(vec![line("ghost", 1)]);
        blank.customer_name = "  ".into();
        let err = db.checkout().create_transaction(&user.id, blank).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_overflowing_totals_are_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = seed_user(&db, "kasir@kasir.id").await;
        let cat = seed_category(&db, "makanan").await;
        let p = seed_product(&db, &cat, "Nasi Uduk", 10).await;

        let mut huge = line(&p.product.id, 1);
        huge.subtotal = i64::MAX;
        let result = db
            .checkout()
            .create_transaction(&user.id, checkout(vec![huge.clone(), huge]))
            .await;

        let envelope = ApiResponse::from_result(result);
        assert!(!envelope.success);
        assert_eq!(envelope.code, 400);
        assert_eq!(stock(&db, &p.product.id).await, 10);
        assert_eq!(db.sequences().current("TRX", today()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_discount_above_line_subtotal_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = seed_user(&db, "kasir@kasir.id").await;
        let cat = seed_category(&db, "makanan").await;
        let p = seed_product(&db, &cat, "Soto Betawi", 10).await;

        let mut discounted = line(&p.product.id, 1);
        discounted.discount = discounted.subtotal + 40_000;
        let err = db
            .checkout()
            .create_transaction(&user.id, checkout(vec![discounted]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::DiscountExceedsSubtotal { .. })
        ));
        assert_eq!(
            db.transactions().count(TransactionType::Transaction).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_update_and_delete_keep_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = seed_user(&db, "kasir@kasir.id").await;
        let cat = seed_category(&db, "makanan").await;
        let p = seed_product(&db, &cat, "Mie Goreng", 10).await;

        let mut payload = checkout(vec![line(&p.product.id, 2)]);
        payload.payment_status = None;
        payload.payment = 0;
        let code = db.checkout().create_transaction(&user.id, payload).await.unwrap();
        let header = db.transactions().get_by_code(&code).await.unwrap().unwrap();
        assert_eq!(header.payment_status, Some(PaymentStatus::Pending));

        let updated = db
            .checkout()
            .update_transaction(
                &header.id,
                UpdateTransaction {
                    payment_status: Some(PaymentStatus::Success),
                    payment: Some(20_000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.payment_status, Some(PaymentStatus::Success));
        assert_eq!(updated.payment, 20_000);
        assert_eq!(updated.customer_name.as_deref(), Some("Budi"));
        assert_eq!(updated.code, code);

        let deleted = db.checkout().delete_transaction(&header.id).await.unwrap();
        assert!(deleted.deleted_at.is_some());
        assert_eq!(stock(&db, &p.product.id).await, 8);

        let err = db.checkout().get_transaction(&header.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = db.checkout().delete_transaction(&header.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // The tombstoned row is still there.
        assert!(db.transactions().get_by_code(&code).await.unwrap().unwrap().deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_carts_are_not_transactions() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = seed_user(&db, "kasir@kasir.id").await;
        let cat = seed_category(&db, "makanan").await;
        let p = seed_product(&db, &cat, "Pempek", 10).await;

        db.orders()
            .submit_cart(
                &user.id,
                kasir_core::CartPayload {
                    transaction_date: None,
                    delivery_type: DeliveryType::TakeAway,
                    ppn: 0,
                    items: vec![line(&p.product.id, 1)],
                },
            )
            .await
            .unwrap();
        let cart = db.orders().get_open_cart(&user.id).await.unwrap().unwrap();

        assert!(db.checkout().get_transaction(&cart.header.id).await.is_err());
        assert!(db.checkout().delete_transaction(&cart.header.id).await.is_err());
        assert!(db
            .checkout()
            .list_transactions(TransactionFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = seed_user(&db, "kasir@kasir.id").await;
        let cat = seed_category(&db, "makanan").await;
        let p = seed_product(&db, &cat, "Bakso Malang", 50).await;

        let day_one = Utc.with_ymd_and_hms(2026, 10, 15, 9, 30, 0).unwrap();
        let day_two = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();

        for (name, date, status) in [
            ("Budi", day_one, PaymentStatus::Success),
            ("Siti", day_two, PaymentStatus::Pending),
            ("Budiman", day_two, PaymentStatus::Success),
        ] {
            let mut payload = checkout(vec![line(&p.product.id, 1)]);
            payload.customer_name = name.into();
            payload.transaction_date = Some(date);
            payload.payment_status = Some(status);
            db.checkout().create_transaction(&user.id, payload).await.unwrap();
        }

        let all = db
            .checkout()
            .list_transactions(TransactionFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let on_day_two = db
            .checkout()
            .list_transactions(TransactionFilter {
                date: NaiveDate::from_ymd_opt(2026, 10, 16),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(on_day_two.len(), 2);

        let paid_budi = db
            .checkout()
            .list_transactions(TransactionFilter {
                payment_status: Some(PaymentStatus::Success),
                search: Some(" budi ".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(paid_budi.len(), 2);

        let err = db
            .checkout()
            .list_transactions(TransactionFilter {
                limit: 0,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("kasir.db")).max_connections(8))
            .await
            .unwrap();
        let user = seed_user(&db, "kasir@kasir.id").await;
        let cat = seed_category(&db, "minuman").await;
        let p = seed_product(&db, &cat, "Es Kelapa Muda", 10).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = db.checkout();
            let user_id = user.id.clone();
            let product_id = p.product.id.clone();
            handles.push(tokio::spawn(async move {
                service
                    .create_transaction(&user_id, checkout(vec![line(&product_id, 3)]))
                    .await
            }));
        }

        let mut committed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => committed += 1,
                Err(ServiceError::Core(CoreError::InsufficientStock { .. })) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(committed, 3);
        assert_eq!(stock(&db, &p.product.id).await, 1);
        assert_eq!(
            db.transactions().count(TransactionType::Transaction).await.unwrap(),
            3
        );
        db.close().await;
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(8))]

            /// Whatever the interleaving, stock ends at initial minus what
            /// was committed, and never below zero.
            #[test]
            fn concurrent_checkout_stock_never_negative(
                initial in 0i64..30,
                requests in proptest::collection::vec(1i64..8, 1..10),
            ) {
                let rt = tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(4)
                    .enable_all()
                    .build()
                    .unwrap();

                let (sold, remaining) = rt.block_on(async {
                    let dir = tempfile::tempdir().unwrap();
                    let db = Database::new(
                        DbConfig::new(dir.path().join("kasir.db")).max_connections(6),
                    )
                    .await
                    .unwrap();
                    let user = seed_user(&db, "kasir@kasir.id").await;
                    let cat = seed_category(&db, "minuman").await;
                    let p = seed_product(&db, &cat, "Jus Alpukat", initial).await;

                    let mut handles = Vec::new();
                    for qty in requests.clone() {
                        let service = db.checkout();
                        let user_id = user.id.clone();
                        let product_id = p.product.id.clone();
                        handles.push(tokio::spawn(async move {
                            service
                                .create_transaction(&user_id, checkout(vec![line(&product_id, qty)]))
                                .await
                                .map(|_| qty)
                        }));
                    }

                    let mut sold = 0;
                    for handle in handles {
                        match handle.await.unwrap() {
                            Ok(qty) => sold += qty,
                            Err(ServiceError::Core(CoreError::InsufficientStock { .. })) => {}
                            Err(other) => panic!("unexpected error: {other:?}"),
                        }
                    }

                    let remaining = stock(&db, &p.product.id).await;
                    db.close().await;
                    (sold, remaining)
                });

                prop_assert!(remaining >= 0);
                prop_assert_eq!(remaining, initial - sold);
            }
        }
    }
}
