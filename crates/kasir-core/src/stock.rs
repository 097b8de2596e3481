//! # Stock Aggregation
//!
//! The stock ledger applies one conditional update per *product*, not per
//! line item. A cart may list the same product several times (separate
//! notes, separate discounts), so quantities are summed first:
//!
//! ```text
//! items: [Es Teh x2 "less sugar"] [Nasi Goreng x1] [Es Teh x3]
//!                      │
//!                      ▼  aggregate_quantities()
//! { "es-teh-id": 5, "nasi-goreng-id": 1 }     (BTreeMap, sorted by id)
//!                      │
//!                      ▼
//! UPDATE products SET stock = stock - 5 WHERE id = 'es-teh-id' AND stock >= 5
//! UPDATE products SET stock = stock - 1 WHERE id = 'nasi-goreng-id' AND stock >= 1
//! ```
//!
//! Sorted order means two concurrent commits touch shared products in the
//! same sequence.

use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};
use crate::types::{NewLineItem, TransactionLineItem};

/// Anything that names a product and a quantity.
pub trait StockLine {
    fn product_id(&self) -> &str;
    fn qty(&self) -> i64;
}

impl StockLine for NewLineItem {
    fn product_id(&self) -> &str {
        &self.product_id
    }

    fn qty(&self) -> i64 {
        self.qty
    }
}

impl StockLine for TransactionLineItem {
    fn product_id(&self) -> &str {
        &self.product_id
    }

    fn qty(&self) -> i64 {
        self.qty
    }
}

impl<T: StockLine + ?Sized> StockLine for &T {
    fn product_id(&self) -> &str {
        (**self).product_id()
    }

    fn qty(&self) -> i64 {
        (**self).qty()
    }
}

/// Sums quantities per product.
///
/// Rejects any line with `qty <= 0`; a zero or negative line would turn a
/// decrement into an increment.
///
/// ```rust
/// use kasir_core::stock::aggregate_quantities;
/// use kasir_core::NewLineItem;
///
/// let line = |id: &str, qty| NewLineItem {
///     product_id: id.into(), qty, discount: 0, subtotal: 1, notes: None,
/// };
/// let totals = aggregate_quantities(&[line("b", 1), line("a", 2), line("b", 4)]).unwrap();
/// let expected = vec![(String::from("a"), 2), (String::from("b"), 5)];
/// assert_eq!(totals.into_iter().collect::<Vec<_>>(), expected);
/// ```
pub fn aggregate_quantities<L: StockLine>(lines: &[L]) -> CoreResult<BTreeMap<String, i64>> {
    let mut totals: BTreeMap<String, i64> = BTreeMap::new();

    for line in lines {
        if line.qty() <= 0 {
            return Err(CoreError::InvalidQuantity {
                product_id: line.product_id().to_string(),
                qty: line.qty(),
            });
        }
        *totals.entry(line.product_id().to_string()).or_insert(0) += line.qty();
    }

    Ok(totals)
}

/// Net per-product change when a cart's lines are replaced.
///
/// Positive values mean more stock is taken, negative values mean stock is
/// given back. Products whose quantity is unchanged are omitted.
pub fn net_change<A: StockLine, B: StockLine>(
    previous: &[A],
    next: &[B],
) -> CoreResult<BTreeMap<String, i64>> {
    let mut delta = aggregate_quantities(next)?;

    for (product_id, qty) in aggregate_quantities(previous)? {
        *delta.entry(product_id).or_insert(0) -= qty;
    }

    delta.retain(|_, qty| *qty != 0);
    Ok(delta)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(product_id: &str, qty: i64) -> NewLineItem {
        NewLineItem {
            product_id: product_id.to_string(),
            qty,
            discount: 0,
            subtotal: 1_000 * qty.max(1),
            notes: None,
        }
    }

    #[test]
    fn test_sums_repeated_products() {
        let totals = aggregate_quantities(&[line("p1", 2), line("p2", 1), line("p1", 3)]).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals["p1"], 5);
        assert_eq!(totals["p2"], 1);
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        let err = aggregate_quantities(&[line("p1", 2), line("p2", -1)]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuantity { qty: -1, .. }));
    }

    #[test]
    fn test_net_change_for_grown_cart() {
        // {P1: 2} → {P1: 5} takes three more units
        let delta = net_change(&[line("p1", 2)], &[line("p1", 5)]).unwrap();
        assert_eq!(delta["p1"], 3);
    }

    #[test]
    fn test_net_change_drops_unchanged_and_tracks_removed() {
        let delta = net_change(
            &[line("p1", 2), line("p2", 4)],
            &[line("p1", 1), line("p1", 1), line("p3", 1)],
        )
        .unwrap();
        assert!(!delta.contains_key("p1"));
        assert_eq!(delta["p2"], -4);
        assert_eq!(delta["p3"], 1);
    }

    fn lines_strategy() -> impl Strategy<Value = Vec<(u8, i64)>> {
        prop::collection::vec((0u8..5, 1i64..50), 0..20)
    }

    proptest! {
        #[test]
        fn aggregation_preserves_total_quantity(raw in lines_strategy()) {
            let lines: Vec<_> = raw.iter().map(|(p, q)| line(&format!("p{p}"), *q)).collect();
            let totals = aggregate_quantities(&lines).unwrap();
            let expected: i64 = raw.iter().map(|(_, q)| q).sum();
            prop_assert_eq!(totals.values().sum::<i64>(), expected);
            prop_assert!(totals.values().all(|q| *q > 0));
        }

        #[test]
        fn net_change_matches_difference_of_totals(old in lines_strategy(), new in lines_strategy()) {
            let old: Vec<_> = old.iter().map(|(p, q)| line(&format!("p{p}"), *q)).collect();
            let new: Vec<_> = new.iter().map(|(p, q)| line(&format!("p{p}"), *q)).collect();
            let before = aggregate_quantities(&old).unwrap();
            let after = aggregate_quantities(&new).unwrap();
            let delta = net_change(&old, &new).unwrap();
            for p in 0u8..5 {
                let id = format!("p{p}");
                let b = before.get(&id).copied().unwrap_or(0);
                let a = after.get(&id).copied().unwrap_or(0);
                prop_assert_eq!(delta.get(&id).copied().unwrap_or(0), a - b);
            }
        }
    }
}
