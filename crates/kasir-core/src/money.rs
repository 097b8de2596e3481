//! # Money Module
//!
//! Provides the `Money` type for handling Rupiah amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Rupiah has no minor unit in practice, so prices are whole numbers:    │
//! │    Rp 25.000 is stored as 25000                                        │
//! │                                                                         │
//! │  Percent discounts are the only place a fraction appears; they are     │
//! │  rounded half-up to a whole Rupiah, once, in `Money::percent`.         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasir_core::money::Money;
//!
//! let price = Money::from_units(18_000);
//! let line = price * 3;
//! assert_eq!(line.units(), 54_000);
//! assert_eq!(line.to_string(), "Rp 54.000");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A Rupiah amount in whole units.
///
/// ## Design Decisions
/// - **i64 (signed)**: differences (e.g. `bill - payment`) may go negative
/// - **`#[serde(transparent)]`**: appears on the wire as a plain number,
///   the same shape the POS frontend already sends
///
/// ## User Workflow Context
/// ```text
/// Product.normal_price ──► effective_price() ──► shown on the menu
///
/// LineItem.subtotal ──┐
/// LineItem.discount ──┴──► TransactionTotals ──► Transaction.bill
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole Rupiah.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// let price = Money::from_units(25_000);
    /// assert_eq!(price.units(), 25_000);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the amount in whole Rupiah.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// let unit_price = Money::from_units(8_500);
    /// assert_eq!(unit_price.multiply_quantity(4).units(), 34_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns `percent`% of this amount, rounded half-up to a whole Rupiah.
    ///
    /// Computed in i128 so large prices cannot overflow the intermediate.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// // 15% of Rp 12.345 = 1851.75 → 1852
    /// assert_eq!(Money::from_units(12_345).percent(15).units(), 1_852);
    /// ```
    pub fn percent(&self, percent: i64) -> Money {
        let scaled = self.0 as i128 * percent as i128;
        let rounded = if scaled >= 0 {
            (scaled + 50) / 100
        } else {
            (scaled - 50) / 100
        };
        Money(rounded as i64)
    }

    /// Adds `other`, or `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Subtracts `other`, or `None` on overflow.
    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Subtracts `other`, flooring the result at zero.
    #[inline]
    pub fn saturating_sub_to_zero(self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Rupiah formatting with `.` thousand separators, e.g. `Rp 1.250.000`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rp {}", sign, grouped)
    }
}

impl From<i64> for Money {
    fn from(units: i64) -> Self {
        Money(units)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_units(0).to_string(), "Rp 0");
        assert_eq!(Money::from_units(500).to_string(), "Rp 500");
        assert_eq!(Money::from_units(25_000).to_string(), "Rp 25.000");
        assert_eq!(Money::from_units(1_250_000).to_string(), "Rp 1.250.000");
        assert_eq!(Money::from_units(-7_500).to_string(), "-Rp 7.500");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_units(10_000);
        let b = Money::from_units(2_500);

        assert_eq!((a + b).units(), 12_500);
        assert_eq!((a - b).units(), 7_500);
        assert_eq!((a * 3).units(), 30_000);

        let mut c = a;
        c += b;
        c -= Money::from_units(500);
        assert_eq!(c.units(), 12_000);
    }

    #[test]
    fn test_percent_rounds_half_up() {
        assert_eq!(Money::from_units(25_000).percent(10).units(), 2_500);
        // 1% of 150 = 1.5 → 2
        assert_eq!(Money::from_units(150).percent(1).units(), 2);
        // 1% of 149 = 1.49 → 1
        assert_eq!(Money::from_units(149).percent(1).units(), 1);
        assert_eq!(Money::from_units(9_999).percent(0).units(), 0);
        assert_eq!(Money::from_units(9_999).percent(100).units(), 9_999);
    }

    #[test]
    fn test_percent_does_not_overflow_on_large_amounts() {
        let big = Money::from_units(i64::MAX / 10);
        assert_eq!(big.percent(100), big);
    }

    #[test]
    fn test_saturating_sub_to_zero() {
        let price = Money::from_units(5_000);
        assert_eq!(price.saturating_sub_to_zero(Money::from_units(2_000)).units(), 3_000);
        assert_eq!(price.saturating_sub_to_zero(Money::from_units(9_000)).units(), 0);
    }

    #[test]
    fn test_sum() {
        let lines = [
            Money::from_units(12_000),
            Money::from_units(8_000),
            Money::from_units(5_500),
        ];
        let total: Money = lines.iter().sum();
        assert_eq!(total.units(), 25_500);
    }

    #[test]
    fn test_serializes_as_plain_number() {
        let json = serde_json::to_string(&Money::from_units(42_000)).unwrap();
        assert_eq!(json, "42000");
        let back: Money = serde_json::from_str("42000").unwrap();
        assert_eq!(back, Money::from_units(42_000));
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_units(1).is_positive());
        assert!(Money::from_units(-1).is_negative());
        assert_eq!(Money::from_units(-300).abs().units(), 300);
    }

    #[test]
    fn test_checked_ops_report_overflow() {
        let max = Money::from_units(i64::MAX);
        assert_eq!(max.checked_add(Money::from_units(1)), None);
        assert_eq!(Money::from_units(i64::MIN).checked_sub(Money::from_units(1)), None);
        assert_eq!(
            Money::from_units(5_000).checked_sub(Money::from_units(2_000)),
            Some(Money::from_units(3_000))
        );
    }
}
