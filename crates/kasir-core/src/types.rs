//! # Domain Types
//!
//! Core domain types used throughout Kasir.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │ ProductCategory │◄──│    Product      │◄──│ TransactionLineItem │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  name (lower)   │   │  name (unique)  │   │  qty (> 0)          │   │
//! │  │  total_product  │   │  stock (>= 0)   │   │  discount/subtotal  │   │
//! │  │  status         │   │  discount_*     │   └─────────┬───────────┘   │
//! │  └─────────────────┘   └─────────────────┘             │ owned by      │
//! │                                                        ▼               │
//! │  ┌─────────────────┐                         ┌─────────────────────┐   │
//! │  │      User       │◄────────────────────────│    Transaction      │   │
//! │  │  ─────────────  │   at most one open cart │  ─────────────────  │   │
//! │  │  role           │                         │  code (unique)      │   │
//! │  └─────────────────┘                         │  type: cart|trx     │   │
//! │                                              │  totals             │   │
//! │                                              └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! - `id`: UUID v4, immutable, used for relations
//! - `code` on transactions: `TRX-2610160001`, printed on receipts
//!
//! Money columns are stored as whole-Rupiah `i64`; accessor methods hand
//! them out as [`Money`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::pricing::{effective_price, DiscountType};

// =============================================================================
// Users
// =============================================================================

/// Role of a staff account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Cashier,
}

/// A staff account that owns carts and rings up transactions.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a user (seeding and tests; credentials live elsewhere).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

// =============================================================================
// Product Categories
// =============================================================================

/// A menu section such as "minuman" or "makanan berat".
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategory {
    pub id: String,
    /// Always stored lower-cased.
    pub name: String,
    /// Number of live products in this category.
    pub total_product: i64,
    /// Turning this off deactivates every member product.
    pub status: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating or updating a category.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default = "default_true")]
    pub status: bool,
}

/// Category updates carry the full record, same as creation.
pub type UpdateCategory = NewCategory;

// =============================================================================
// Products
// =============================================================================

/// A sellable menu item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub description: Option<String>,
    /// Price before discount, whole Rupiah.
    pub normal_price: i64,
    /// Cost of goods (HPP), whole Rupiah.
    pub cost_price: i64,
    pub discount_type: DiscountType,
    /// Percent (0-100) or Rupiah depending on `discount_type`.
    pub discount_amount: i64,
    /// Units on hand. Never negative.
    pub stock: i64,
    pub active: bool,
    pub available: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Price before discount.
    #[inline]
    pub fn normal_price(&self) -> Money {
        Money::from_units(self.normal_price)
    }

    /// Price the customer pays for one unit.
    pub fn effective_price(&self) -> Money {
        effective_price(self.normal_price(), self.discount_type, self.discount_amount)
    }

    /// True when `qty` units can be taken from current stock.
    #[inline]
    pub fn has_stock_for(&self, qty: i64) -> bool {
        self.stock >= qty
    }
}

/// A product as returned by read paths, with its display price resolved.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub effective_price: i64,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let effective_price = product.effective_price().units();
        ProductView {
            product,
            effective_price,
        }
    }
}

/// Input for creating or updating a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub category_id: String,
    #[serde(default)]
    pub description: Option<String>,
    pub normal_price: i64,
    pub cost_price: i64,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default)]
    pub discount_amount: i64,
    pub stock: i64,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_true")]
    pub available: bool,
}

/// Product updates carry the full record, same as creation.
pub type UpdateProduct = NewProduct;

fn default_true() -> bool {
    true
}

// =============================================================================
// Transaction Enums
// =============================================================================

/// Whether a transaction row is a draft cart or a finalized sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Draft order, mutable, at most one per user.
    Cart,
    /// Finalized sale. Terminal apart from payment/status edits.
    Transaction,
}

impl TransactionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            TransactionType::Cart => "cart",
            TransactionType::Transaction => "transaction",
        }
    }
}

/// How the order leaves the counter.
///
/// `In`/`Out` are used by carts; `DineIn`/`TakeAway`/`Reservation` by
/// walk-in transactions. The wire spelling of `TakeAway` is `takeWay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum DeliveryType {
    In,
    Out,
    DineIn,
    #[serde(rename = "takeWay")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "takeWay"))]
    TakeAway,
    Reservation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// Pay at the end (open tab).
    Later,
    /// Pay at the counter.
    Now,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Reject,
}

impl PaymentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Reject => "reject",
        }
    }
}

// =============================================================================
// Transaction Header
// =============================================================================

/// A transaction header, either an open cart or a finalized sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    /// Human-readable code, e.g. `TRX-2610160001`. Unique.
    pub code: String,
    pub transaction_type: TransactionType,
    /// Owning user.
    pub user_id: String,
    /// Free-form cashier label for walk-in sales.
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub transaction_date: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub delivery_type: Option<DeliveryType>,
    pub table_number: Option<i64>,
    pub payment_type: Option<PaymentType>,
    pub payment_method: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    /// Sum of line subtotals.
    pub subtotal: i64,
    /// Sum of line discounts.
    pub total_discount: i64,
    /// Tax (PPN).
    pub ppn: i64,
    /// `subtotal - total_discount + ppn`.
    pub bill: i64,
    /// Amount tendered.
    pub payment: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Transaction {
    #[inline]
    pub fn is_cart(&self) -> bool {
        self.transaction_type == TransactionType::Cart
    }

    #[inline]
    pub fn bill(&self) -> Money {
        Money::from_units(self.bill)
    }

    /// Change due to the customer (negative when underpaid).
    #[inline]
    pub fn change(&self) -> Money {
        Money::from_units(self.payment) - self.bill()
    }
}

// =============================================================================
// Line Items
// =============================================================================

/// A persisted line item. Never exists without its header.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLineItem {
    pub id: String,
    pub transaction_id: String,
    pub product_id: String,
    /// Always > 0.
    pub qty: i64,
    pub discount: i64,
    pub subtotal: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A line item joined with the product's current name, for read paths.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDetail {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub item: TransactionLineItem,
    pub product_name: String,
}

/// A requested line item in a cart or checkout payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    pub product_id: String,
    pub qty: i64,
    #[serde(default)]
    pub discount: i64,
    pub subtotal: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Header plus line items, as returned by detail reads.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetail {
    #[serde(flatten)]
    pub header: Transaction,
    pub items: Vec<LineItemDetail>,
}

// =============================================================================
// Payloads
// =============================================================================

/// Body of a cart submission.
///
/// Header totals are derived from `items` plus `ppn`; totals sent by the
/// client are not accepted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    /// Defaults to now.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub transaction_date: Option<DateTime<Utc>>,
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub ppn: i64,
    pub items: Vec<NewLineItem>,
}

/// Body of a walk-in checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    #[serde(default)]
    pub created_by: Option<String>,
    pub customer_name: String,
    #[serde(default)]
    pub table_number: Option<i64>,
    pub payment_type: PaymentType,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub payment: i64,
    /// Defaults to now.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub transaction_date: Option<DateTime<Utc>>,
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub ppn: i64,
    pub items: Vec<NewLineItem>,
}

/// Mutable header fields of a finalized transaction. `None` leaves the
/// stored value unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransaction {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub table_number: Option<i64>,
    #[serde(default)]
    pub payment_type: Option<PaymentType>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub payment: Option<i64>,
}

// =============================================================================
// Filters
// =============================================================================

/// Filter for listing finalized transactions.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    /// Calendar day (UTC) of `transaction_date`.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub date: Option<NaiveDate>,
    /// Matches code or customer name.
    #[serde(default)]
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        TransactionFilter {
            payment_status: None,
            date: None,
            search: None,
            limit: 50,
            offset: 0,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(normal_price: i64, discount_type: DiscountType, discount_amount: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".into(),
            name: "Ayam Geprek".into(),
            category_id: "c-1".into(),
            description: None,
            normal_price,
            cost_price: 9_000,
            discount_type,
            discount_amount,
            stock: 4,
            active: true,
            available: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_product_view_carries_effective_price() {
        let view = ProductView::from(product(20_000, DiscountType::Percentage, 10));
        assert_eq!(view.effective_price, 18_000);
        assert_eq!(view.product.normal_price, 20_000);
    }

    #[test]
    fn test_has_stock_for() {
        let p = product(20_000, DiscountType::None, 0);
        assert!(p.has_stock_for(4));
        assert!(!p.has_stock_for(5));
    }

    #[test]
    fn test_take_away_wire_spelling() {
        let json = serde_json::to_string(&DeliveryType::TakeAway).unwrap();
        assert_eq!(json, "\"takeWay\"");
        let dine_in: DeliveryType = serde_json::from_str("\"dineIn\"").unwrap();
        assert_eq!(dine_in, DeliveryType::DineIn);
    }

    #[test]
    fn test_cart_payload_defaults() {
        let payload: CartPayload = serde_json::from_str(
            r#"{"deliveryType":"in","items":[{"productId":"p-1","qty":2,"subtotal":30000}]}"#,
        )
        .unwrap();
        assert_eq!(payload.ppn, 0);
        assert!(payload.transaction_date.is_none());
        assert_eq!(payload.items[0].discount, 0);
        assert_eq!(payload.items[0].notes, None);
    }

    #[test]
    fn test_new_product_defaults_to_active() {
        let input: NewProduct = serde_json::from_str(
            r#"{"name":"Es Jeruk","categoryId":"c-1","normalPrice":8000,"costPrice":3000,"stock":20}"#,
        )
        .unwrap();
        assert!(input.active);
        assert!(input.available);
        assert_eq!(input.discount_type, DiscountType::None);
    }

    #[test]
    fn test_transaction_filter_default_limit() {
        let filter = TransactionFilter::default();
        assert_eq!(filter.limit, 50);
        assert_eq!(filter.offset, 0);
    }
}
