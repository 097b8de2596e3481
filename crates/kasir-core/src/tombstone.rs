//! # Tombstones
//!
//! Users, categories, products and transactions are never physically
//! deleted. A non-null `deleted_at` hides the row from every lookup; the
//! repositories add `deleted_at IS NULL` to each query.

use chrono::{DateTime, Utc};

use crate::types::{Product, ProductCategory, Transaction, User};

/// Soft-delete capability shared by every core entity.
pub trait Tombstone {
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>);

    #[inline]
    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }

    /// Marks the entity deleted at `at`. Deleting twice keeps the first mark.
    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        if !self.is_deleted() {
            self.set_deleted_at(Some(at));
        }
    }
}

macro_rules! impl_tombstone {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Tombstone for $ty {
                #[inline]
                fn deleted_at(&self) -> Option<DateTime<Utc>> {
                    self.deleted_at
                }

                #[inline]
                fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
                    self.deleted_at = at;
                }
            }
        )*
    };
}

impl_tombstone!(User, ProductCategory, Product, Transaction);
