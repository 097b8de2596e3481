//! # Error Types
//!
//! Domain-specific error types for kasir-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasir-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations, missing entities     │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - Machine-readable classification                │
//! │                                                                         │
//! │  kasir-db errors (separate crate)                                      │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - CoreError | DbError, returned by services      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                          DbError ───┴→ ServiceError → ApiError         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Error Kind
// =============================================================================

/// Machine-readable classification of a failure.
///
/// The HTTP boundary maps each kind to a status code with
/// [`ErrorKind::status_code`]; nothing below the boundary deals in numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Referenced user/product/category/transaction is missing or tombstoned.
    NotFound,
    /// Validation failure or business-rule rejection (duplicate name,
    /// insufficient stock, invalid quantity). Not retryable as-is.
    BadRequest,
    /// Lost a race against another writer on a uniquely owned row.
    Conflict,
    /// Storage unavailable, timeout, unclassified constraint failure.
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this kind.
    pub const fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::BadRequest => 400,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// User cannot be found (or was soft-deleted).
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Product cannot be found (or was soft-deleted).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product category cannot be found (or was soft-deleted).
    #[error("Product category not found: {0}")]
    CategoryNotFound(String),

    /// Transaction or cart cannot be found (or was soft-deleted).
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Insufficient stock to reserve or sell.
    ///
    /// ## When This Occurs
    /// - Checkout pre-check sees `requested > stock`
    /// - The conditional decrement matched no row at commit time
    ///   (another commit took the stock after the pre-check passed)
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (Es Teh x5)
    ///      │
    ///      ▼
    /// UPDATE products SET stock = stock - 5 WHERE id = ? AND stock >= 5
    ///      │  0 rows
    ///      ▼
    /// InsufficientStock { product: "Es Teh", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole commit rolls back, cashier sees "only 3 left"
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Cart or checkout contains no line items.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// Cart has exceeded maximum allowed line items.
    #[error("Order cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line item quantity is zero or negative.
    #[error("Quantity for product {product_id} must be greater than 0, got {qty}")]
    InvalidQuantity { product_id: String, qty: i64 },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// A line's discount is larger than the line itself.
    #[error("Discount {discount} for product {product_id} exceeds its subtotal {subtotal}")]
    DiscountExceedsSubtotal {
        product_id: String,
        discount: i64,
        subtotal: i64,
    },

    /// Another request created an open cart for the same user first.
    #[error("User {user_id} already has an open cart being saved by another request")]
    OpenCartConflict { user_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies this error for the response envelope.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::UserNotFound(_)
            | CoreError::ProductNotFound(_)
            | CoreError::CategoryNotFound(_)
            | CoreError::TransactionNotFound(_) => ErrorKind::NotFound,
            CoreError::OpenCartConflict { .. } => ErrorKind::Conflict,
            CoreError::InsufficientStock { .. }
            | CoreError::EmptyOrder
            | CoreError::CartTooLarge { .. }
            | CoreError::InvalidQuantity { .. }
            | CoreError::QuantityTooLarge { .. }
            | CoreError::DiscountExceedsSubtotal { .. }
            | CoreError::Validation(_) => ErrorKind::BadRequest,
        }
    }

    /// Creates an InsufficientStock error.
    pub fn insufficient_stock(product: impl Into<String>, available: i64, requested: i64) -> Self {
        CoreError::InsufficientStock {
            product: product.into(),
            available,
            requested,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any write begins.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid code prefix).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate product name).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Creates a Duplicate error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        ValidationError::Duplicate {
            field: field.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message_names_product() {
        let err = CoreError::insufficient_stock("Es Teh Manis", 3, 5);
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Es Teh Manis: available 3, requested 5"
        );
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_not_found_kinds() {
        assert_eq!(CoreError::UserNotFound("u".into()).kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::ProductNotFound("p".into()).kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::CategoryNotFound("c".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::TransactionNotFound("t".into()).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_open_cart_conflict_is_conflict() {
        let err = CoreError::OpenCartConflict {
            user_id: "u-1".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.kind().status_code(), 409);
    }

    #[test]
    fn test_discount_above_subtotal_names_product() {
        let err = CoreError::DiscountExceedsSubtotal {
            product_id: "p-7".into(),
            discount: 50_000,
            subtotal: 10_000,
        };
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(
            err.to_string(),
            "Discount 50000 for product p-7 exceeds its subtotal 10000"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::BadRequest.status_code(), 400);
        assert_eq!(ErrorKind::Internal.status_code(), 500);
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let err: CoreError = ValidationError::duplicate("name", "kopi susu").into();
        assert!(matches!(err, CoreError::Validation(ValidationError::Duplicate { .. })));
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.to_string(), "Validation error: name 'kopi susu' already exists");
    }
}
