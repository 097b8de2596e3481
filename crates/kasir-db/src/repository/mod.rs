//! # Repository Module
//!
//! Database repository implementations for Kasir.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Service (cart / checkout / catalog)                                   │
//! │       │                                                                 │
//! │       │  let mut tx = begin_write(&pool).await?;                       │
//! │       │  TransactionRepository::find_open_cart_in(&mut tx, user)       │
//! │       │  StockLedger::decrement(&mut tx, &items)                       │
//! │       │  tx.commit()                                                    │
//! │       ▼                                                                 │
//! │  Repositories                                                          │
//! │  ├── pool methods       (&self)          one statement, autocommit     │
//! │  └── *_in(conn, ...)    (associated fn)  inside a caller's transaction │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every read filters tombstoned rows (`deleted_at IS NULL`) unless its
//! name says otherwise.
//!
//! ## Available Repositories
//!
//! - [`UserRepository`] - User lookup
//! - [`CategoryRepository`] - Product categories and their product counter
//! - [`ProductRepository`] - Product CRUD and search
//! - [`SequenceRepository`] - Daily per-prefix code counters
//! - [`StockLedger`] - Conditional stock decrement / increment
//! - [`TransactionRepository`] - Cart and transaction headers, line items

pub mod category;
pub mod product;
pub mod sequence;
pub mod stock;
pub mod transaction;
pub mod user;

pub use category::CategoryRepository;
pub use product::ProductRepository;
pub use sequence::SequenceRepository;
pub use stock::StockLedger;
pub use transaction::{CartState, TransactionRepository};
pub use user::UserRepository;
