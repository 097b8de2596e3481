//! # kasir-db: Database Layer for Kasir
//!
//! This crate owns every SQL statement and every database transaction of
//! the Kasir point-of-sale backend. It uses SQLite through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasir Data Flow                                  │
//! │                                                                         │
//! │  HTTP handler (outside this workspace)                                 │
//! │       │  db.checkout().create_transaction(user, payload)               │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kasir-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐  ┌────────────────┐  ┌──────────────────┐  │   │
//! │  │   │   Services    │  │  Repositories  │  │    Database      │  │   │
//! │  │   │               │  │                │  │    (pool.rs)     │  │   │
//! │  │   │ OrderService  │─►│ Transaction    │  │                  │  │   │
//! │  │   │ Checkout      │  │ StockLedger    │─►│ SqlitePool (WAL) │  │   │
//! │  │   │ Catalog       │  │ Sequence       │  │ BEGIN IMMEDIATE  │  │   │
//! │  │   │               │  │ Product, ...   │  │ migrations       │  │   │
//! │  │   └───────────────┘  └────────────────┘  └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiResponse::from_result(..)   (kasir-core envelope)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Layered application settings
//! - [`pool`] - Connection pool creation and write transactions
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`service`] - Cart reconciliation, checkout and catalog operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasir_db::{AppConfig, Database, DbConfig};
//!
//! let config = AppConfig::load()?;
//! let db = Database::new(DbConfig::from_app_config(&config)).await?;
//!
//! let code = db.orders().submit_cart(&user_id, cart).await?;
//! let code = db.checkout().create_transaction(&user_id, checkout).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::AppConfig;
pub use error::{DbError, DbResult};
pub use pool::{begin_write, Database, DbConfig};
pub use service::{ServiceError, ServiceResult};

// Repository re-exports for convenience
pub use repository::{
    CartState, CategoryRepository, ProductRepository, SequenceRepository, StockLedger,
    TransactionRepository, UserRepository,
};

// Service re-exports
pub use service::cart::OrderService;
pub use service::catalog::CatalogService;
pub use service::checkout::CheckoutService;
