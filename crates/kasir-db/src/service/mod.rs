//! # Services
//!
//! Multi-table operations that must commit or roll back as one unit.
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller (HTTP handler, seed binary, tests)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌───────────────┐  ┌─────────────────┐  ┌────────────────┐            │
//! │  │ OrderService  │  │ CheckoutService │  │ CatalogService │            │
//! │  │  (cart.rs)    │  │  (checkout.rs)  │  │  (catalog.rs)  │            │
//! │  └───────┬───────┘  └────────┬────────┘  └───────┬────────┘            │
//! │          │ begin_write()     │                   │                      │
//! │          ▼                   ▼                   ▼                      │
//! │  Repositories *_in(conn)  +  StockLedger  +  SequenceRepository        │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  commit() ── or ── drop (rollback)                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Services return [`ServiceError`], which keeps business rejections
//! ([`CoreError`]) apart from storage failures ([`DbError`]).

pub mod cart;
pub mod catalog;
pub mod checkout;

use kasir_core::{ApiError, CoreError, ErrorKind};
use thiserror::Error;

use crate::error::DbError;

/// Error returned by every service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Business rule rejection, reported to the cashier as-is.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Core(e) => e.kind(),
            ServiceError::Db(e) => e.kind(),
        }
    }

    /// True when retrying the same call unchanged may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Core(CoreError::OpenCartConflict { .. }) => true,
            ServiceError::Core(_) => false,
            ServiceError::Db(e) => e.is_retryable(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Core(e) => e.into(),
            ServiceError::Db(e) => e.into(),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Db(err.into())
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Test fixtures shared by repository and service tests
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_passthrough() {
        let err: ServiceError = CoreError::insufficient_stock("Es Teh", 3, 5).into();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let err: ServiceError = DbError::not_found("Transaction", "t-1").into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_business_message_survives_envelope() {
        let err: ServiceError = CoreError::insufficient_stock("Es Teh", 3, 5).into();
        let api: ApiError = err.into();
        assert_eq!(api.status_code(), 400);
        assert_eq!(api.message, "Insufficient stock for Es Teh: available 3, requested 5");
    }

    #[test]
    fn test_retryable() {
        let busy: ServiceError = DbError::Busy("database is locked".into()).into();
        assert!(busy.is_retryable());

        let conflict: ServiceError = CoreError::OpenCartConflict {
            user_id: "u-1".into(),
        }
        .into();
        assert!(conflict.is_retryable());

        let empty: ServiceError = CoreError::EmptyOrder.into();
        assert!(!empty.is_retryable());
    }
}
