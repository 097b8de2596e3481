//! # Transaction Totals
//!
//! Header totals are always derived from the line items being written;
//! totals sent by a client are never stored.
//!
//! ```text
//! subtotal       = Σ line.subtotal
//! total_discount = Σ line.discount
//! bill           = subtotal - total_discount + ppn
//! ```
//!
//! Amounts come straight from the client, so every sum is checked; an
//! overflow is rejected as a validation error instead of wrapping.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::NewLineItem;

/// Monetary totals for a transaction header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTotals {
    pub subtotal: Money,
    pub total_discount: Money,
    pub ppn: Money,
    pub bill: Money,
}

impl TransactionTotals {
    /// Derives header totals from the lines and the tax amount.
    ///
    /// ```rust
    /// use kasir_core::{NewLineItem, TransactionTotals, Money};
    ///
    /// let lines = vec![
    ///     NewLineItem { product_id: "a".into(), qty: 2, discount: 2_000, subtotal: 30_000, notes: None },
    ///     NewLineItem { product_id: "b".into(), qty: 1, discount: 0, subtotal: 12_000, notes: None },
    /// ];
    /// let totals = TransactionTotals::from_lines(&lines, Money::from_units(4_000)).unwrap();
    /// assert_eq!(totals.subtotal.units(), 42_000);
    /// assert_eq!(totals.total_discount.units(), 2_000);
    /// assert_eq!(totals.bill.units(), 44_000);
    /// ```
    ///
    /// ## Errors
    /// `Validation(OutOfRange)` naming the total that overflowed.
    pub fn from_lines(lines: &[NewLineItem], ppn: Money) -> CoreResult<Self> {
        let subtotal = checked_sum("subtotal", lines.iter().map(|l| l.subtotal))?;
        let total_discount = checked_sum("total discount", lines.iter().map(|l| l.discount))?;

        let bill = subtotal
            .checked_sub(total_discount)
            .and_then(|net| net.checked_add(ppn))
            .ok_or_else(|| out_of_range("bill"))?;

        Ok(TransactionTotals {
            subtotal,
            total_discount,
            ppn,
            bill,
        })
    }
}

fn checked_sum(field: &str, mut amounts: impl Iterator<Item = i64>) -> CoreResult<Money> {
    amounts.try_fold(Money::zero(), |acc, units| {
        acc.checked_add(Money::from_units(units))
            .ok_or_else(|| out_of_range(field))
    })
}

fn out_of_range(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_lines_bill_is_tax_only() {
        let totals = TransactionTotals::from_lines(&[], Money::from_units(1_000)).unwrap();
        assert_eq!(totals.subtotal, Money::zero());
        assert_eq!(totals.bill.units(), 1_000);
    }

    #[test]
    fn test_discounts_reduce_bill() {
        let lines = vec![NewLineItem {
            product_id: "p".into(),
            qty: 3,
            discount: 4_500,
            subtotal: 45_000,
            notes: Some("pedas".into()),
        }];
        let totals = TransactionTotals::from_lines(&lines, Money::zero()).unwrap();
        assert_eq!(totals.bill.units(), 40_500);
    }

    fn line(subtotal: i64, discount: i64) -> NewLineItem {
        NewLineItem {
            product_id: "p".into(),
            qty: 1,
            discount,
            subtotal,
            notes: None,
        }
    }

    #[test]
    fn test_subtotal_overflow_is_rejected() {
        let lines = [line(i64::MAX, 0), line(i64::MAX, 0)];
        let err = TransactionTotals::from_lines(&lines, Money::zero()).unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::BadRequest);
        assert!(err.to_string().starts_with("Validation error: subtotal must be between 0"));
    }

    #[test]
    fn test_tax_overflow_is_rejected() {
        let result = TransactionTotals::from_lines(&[line(i64::MAX, 0)], Money::from_units(1));
        assert!(result.is_err());
    }
}
