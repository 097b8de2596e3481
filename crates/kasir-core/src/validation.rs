//! # Validation Module
//!
//! Input validation for catalog writes, carts and checkouts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP boundary                                                │
//! │  └── Schema parsing (types, required fields)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before any write begins)                        │
//! │  ├── Name lengths, prices, discount ranges                             │
//! │  └── Line item quantities and batch size                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (qty > 0)                               │
//! │  ├── UNIQUE constraints (code, live names, one open cart per user)     │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasir_core::validation::{validate_product_name, validate_quantity};
//!
//! validate_product_name("Nasi Goreng").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::pricing::DiscountType;
use crate::types::NewLineItem;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum length for product and category names.
pub const MIN_NAME_LEN: usize = 4;

/// Maximum length for product and category names.
pub const MAX_NAME_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let len = name.chars().count();
    if len < MIN_NAME_LEN {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min: MIN_NAME_LEN,
        });
    }

    if len > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Between 4 and 200 characters after trimming
///
/// ## Example
/// ```rust
/// use kasir_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Es Teh Manis").is_ok());
/// assert!(validate_product_name("Teh").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name)
}

/// Validates a category name. Same length rules as product names.
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    validate_name("category name", name)
}

/// Normalizes a category name for storage: trimmed and lower-cased.
///
/// ```rust
/// use kasir_core::validation::normalize_category_name;
///
/// assert_eq!(normalize_category_name("  Minuman Dingin "), "minuman dingin");
/// ```
pub fn normalize_category_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string; empty means "no filter".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates an entity id (UUID string).
///
/// ## Example
/// ```rust
/// use kasir_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "qty".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a non-negative Rupiah amount (prices, cost, ppn, payment).
///
/// ```rust
/// use kasir_core::validation::validate_amount;
///
/// assert!(validate_amount("normal price", 0).is_ok());
/// assert!(validate_amount("normal price", -1).is_err());
/// ```
pub fn validate_amount(field: &str, amount: i64) -> ValidationResult<()> {
    if amount < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock level written through the catalog.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    validate_amount("stock", stock)
}

/// Validates a product discount at write time.
///
/// ## Rules
/// - `Percentage`: 0 to 100
/// - `Nominal`: not negative
/// - `None`: amount is ignored
pub fn validate_discount(discount_type: DiscountType, amount: i64) -> ValidationResult<()> {
    match discount_type {
        DiscountType::None => Ok(()),
        DiscountType::Percentage if !(0..=100).contains(&amount) => {
            Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: 100,
            })
        }
        DiscountType::Percentage => Ok(()),
        DiscountType::Nominal => validate_amount("discount", amount),
    }
}

/// Validates a table number when one is given.
pub fn validate_table_number(table_number: Option<i64>) -> ValidationResult<()> {
    match table_number {
        Some(n) if n <= 0 => Err(ValidationError::MustBePositive {
            field: "table number".to_string(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates a batch of line items for a cart or checkout.
///
/// ## Rules
/// - At least one item, at most MAX_CART_ITEMS (100)
/// - Every `qty` in 1..=999
/// - `subtotal` positive, `discount` in 0..=subtotal
///
/// Runs before any write transaction is opened.
pub fn validate_line_items(items: &[NewLineItem]) -> CoreResult<()> {
    if items.is_empty() {
        return Err(CoreError::EmptyOrder);
    }

    if items.len() > MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }

    for item in items {
        if item.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "productId".to_string(),
            }
            .into());
        }

        if item.qty <= 0 {
            return Err(CoreError::InvalidQuantity {
                product_id: item.product_id.clone(),
                qty: item.qty,
            });
        }

        if item.qty > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: item.qty,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if item.subtotal <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "subtotal".to_string(),
            }
            .into());
        }

        validate_amount("discount", item.discount)?;

        if item.discount > item.subtotal {
            return Err(CoreError::DiscountExceedsSubtotal {
                product_id: item.product_id.clone(),
                discount: item.discount,
                subtotal: item.subtotal,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
