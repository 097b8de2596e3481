//! # kasir-core: Pure Business Logic for Kasir
//!
//! Everything in this crate is a pure function or a plain data type. The
//! database crate (`kasir-db`) owns every statement and every transaction;
//! this crate decides *what* those statements must enforce.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Kasir Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          HTTP boundary (routing, auth, schema parsing)          │   │
//! │  │       maps ApiResponse<T> / ApiError to status codes            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 kasir-db services                               │   │
//! │  │   OrderService (carts) · CheckoutService · CatalogService       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ uses                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kasir-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   types · money · pricing · totals · stock · sequence           │   │
//! │  │   validation · tombstone · error · envelope                     │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Transaction, line items, payloads)
//! - [`money`] - Money type with integer arithmetic
//! - [`pricing`] - Effective price after product discounts
//! - [`totals`] - Header totals derived from line items
//! - [`stock`] - Per-product quantity aggregation for the stock ledger
//! - [`sequence`] - Human-readable transaction codes
//! - [`tombstone`] - Soft-delete capability
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types and their classification
//! - [`envelope`] - Uniform `(data, error)` response envelope
//!
//! ## Example Usage
//!
//! ```rust
//! use kasir_core::money::Money;
//! use kasir_core::pricing::{effective_price, DiscountType};
//!
//! let normal = Money::from_units(25_000);
//! let price = effective_price(normal, DiscountType::Percentage, 10);
//! assert_eq!(price.units(), 22_500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod envelope;
pub mod error;
pub mod money;
pub mod pricing;
pub mod sequence;
pub mod stock;
pub mod tombstone;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use envelope::{ApiError, ApiResponse};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use pricing::{effective_price, DiscountType};
pub use tombstone::Tombstone;
pub use totals::TransactionTotals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Code prefix for walk-in transactions (`TRX-2610160001`).
pub const TRANSACTION_CODE_PREFIX: &str = "TRX";

/// Code prefix for carts (`ORD-2610160001`).
pub const CART_CODE_PREFIX: &str = "ORD";

/// Maximum line items allowed in a single cart or checkout.
///
/// ## Business Reason
/// Keeps a single commit transaction short; a batch this size holds the
/// write lock for a few milliseconds at most.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
