//! # Pricing
//!
//! The single place where a product's display price is derived from its
//! normal price and discount settings.
//!
//! ```text
//! normal_price ─┐
//! discount_type ├──► effective_price() ──► menu, product views, seed output
//! discount_amt ─┘
//! ```
//!
//! Read paths call [`effective_price`]; write paths call
//! [`crate::validation::validate_discount`] so that stored discounts are
//! always in range. `effective_price` still clamps, so rows written before
//! validation existed can never price below zero.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Discount Type
// =============================================================================

/// How `discount_amount` on a product is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// No discount. The POS frontend sends an empty string for this.
    #[default]
    #[serde(alias = "")]
    None,
    /// `discount_amount` is a percentage of the normal price (0-100).
    Percentage,
    /// `discount_amount` is a flat Rupiah amount off the normal price.
    Nominal,
}

// =============================================================================
// Effective Price
// =============================================================================

/// Returns the price a customer pays for one unit.
///
/// | type         | result                                           |
/// |--------------|--------------------------------------------------|
/// | `None`       | `normal`                                         |
/// | `Percentage` | `normal - round(normal * clamp(amount, 0, 100)%)` |
/// | `Nominal`    | `max(normal - max(amount, 0), 0)`                |
///
/// ## Example
/// ```rust
/// use kasir_core::money::Money;
/// use kasir_core::pricing::{effective_price, DiscountType};
///
/// let normal = Money::from_units(20_000);
/// assert_eq!(effective_price(normal, DiscountType::None, 50).units(), 20_000);
/// assert_eq!(effective_price(normal, DiscountType::Percentage, 25).units(), 15_000);
/// assert_eq!(effective_price(normal, DiscountType::Nominal, 3_000).units(), 17_000);
/// assert_eq!(effective_price(normal, DiscountType::Nominal, 90_000).units(), 0);
/// ```
pub fn effective_price(normal: Money, discount_type: DiscountType, discount_amount: i64) -> Money {
    match discount_type {
        DiscountType::None => normal,
        DiscountType::Percentage => {
            let pct = discount_amount.clamp(0, 100);
            normal.saturating_sub_to_zero(normal.percent(pct))
        }
        DiscountType::Nominal => {
            normal.saturating_sub_to_zero(Money::from_units(discount_amount.max(0)))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
