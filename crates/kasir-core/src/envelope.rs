//! # Response Envelope
//!
//! Every operation result leaves the backend in the same shape:
//!
//! ```json
//! { "success": false, "code": 400, "message": "Insufficient stock for Es Teh: available 3, requested 5", "data": null }
//! { "success": true,  "code": 200, "message": "OK", "data": "TRX-2610160001" }
//! ```
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service                       Envelope                 HTTP boundary   │
//! │  ───────                       ────────                 ─────────────   │
//! │                                                                         │
//! │  Ok(code) ───────────────────► ApiResponse::ok ───────► 200             │
//! │                                                                         │
//! │  Err(CoreError) ──► ApiError { kind, message } ───────► kind.status()   │
//! │  Err(DbError)   ──► ApiError (generic message, logged)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Conversions from storage errors live in `kasir-db`, next to the error
//! types they convert.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, ErrorKind};

// =============================================================================
// ApiError
// =============================================================================

/// The error half of the envelope: a machine-readable kind and a message
/// safe to show a cashier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ApiError {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(ErrorKind::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(ErrorKind::BadRequest, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorKind::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorKind::Internal, message)
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Domain errors carry messages written for the cashier, so they pass
/// through unchanged.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::new(err.kind(), err.to_string())
    }
}

// =============================================================================
// ApiResponse
// =============================================================================

/// The uniform response wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    /// HTTP-style status code.
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse::with_message(data, "OK")
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            code: 200,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(err: ApiError) -> Self {
        ApiResponse {
            success: false,
            code: err.status_code(),
            message: err.message,
            data: None,
        }
    }

    /// Wraps any service result.
    ///
    /// ```rust
    /// use kasir_core::{ApiResponse, CoreError};
    ///
    /// let res: Result<String, CoreError> = Err(CoreError::ProductNotFound("p-9".into()));
    /// let envelope = ApiResponse::from_result(res);
    /// assert!(!envelope.success);
    /// assert_eq!(envelope.code, 404);
    /// ```
    pub fn from_result<E: Into<ApiError>>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => ApiResponse::ok(data),
            Err(err) => ApiResponse::error(err.into()),
        }
    }
}
