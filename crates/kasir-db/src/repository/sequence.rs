//! # Sequence Repository
//!
//! Daily per-prefix counters behind human-readable codes
//! (`TRX-2610160001`, `ORD-2610160002`, ...).
//!
//! ## Atomic Increment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INSERT INTO sequence_counters (prefix, date_key, last_number, ...)    │
//! │  VALUES ('TRX', '261016', 1, ...)                                      │
//! │  ON CONFLICT (prefix, date_key)                                        │
//! │      DO UPDATE SET last_number = last_number + 1                       │
//! │  RETURNING last_number                                                 │
//! │                                                                         │
//! │  First call of the day ──► row inserted, returns 1                     │
//! │  Every later call     ──► row bumped,   returns previous + 1           │
//! │                                                                         │
//! │  One statement: SQLite's write lock makes the read-modify-write        │
//! │  atomic, so two callers can never observe the same number.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A new day is a new key; nothing ever resets a counter.

use chrono::{Local, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use kasir_core::sequence::{date_key, format_code, validate_prefix};

/// Repository for code generation.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
}

impl SequenceRepository {
    /// Creates a new SequenceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SequenceRepository { pool }
    }

    /// Issues the next code for `prefix` on today's (local) date.
    pub async fn next_code(&self, prefix: &str) -> DbResult<String> {
        self.next_code_on(prefix, today()).await
    }

    /// Issues the next code for `prefix` on an explicit date.
    pub async fn next_code_on(&self, prefix: &str, date: NaiveDate) -> DbResult<String> {
        let mut conn = self.pool.acquire().await?;
        Self::next_code_in(&mut conn, prefix, date).await
    }

    /// Issues the next code on an open transaction.
    ///
    /// The number is consumed only if the enclosing transaction commits;
    /// a rollback hands the same number to the next caller.
    pub async fn next_code_in(
        conn: &mut SqliteConnection,
        prefix: &str,
        date: NaiveDate,
    ) -> DbResult<String> {
        validate_prefix(prefix).map_err(|e| DbError::Internal(e.to_string()))?;

        let key = date_key(date);
        let number: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sequence_counters (prefix, date_key, last_number, updated_at)
            VALUES (?, ?, 1, ?)
            ON CONFLICT (prefix, date_key)
                DO UPDATE SET last_number = last_number + 1, updated_at = excluded.updated_at
            RETURNING last_number
            "#,
        )
        .bind(prefix)
        .bind(&key)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        let code = format_code(prefix, date, number);
        debug!(prefix = %prefix, date_key = %key, number, code = %code, "Issued code");
        Ok(code)
    }

    /// Last number issued for `(prefix, date)`, 0 when none yet.
    pub async fn current(&self, prefix: &str, date: NaiveDate) -> DbResult<i64> {
        let number: Option<i64> = sqlx::query_scalar(
            "SELECT last_number FROM sequence_counters WHERE prefix = ? AND date_key = ?",
        )
        .bind(prefix)
        .bind(date_key(date))
        .fetch_optional(&self.pool)
        .await?;

        Ok(number.unwrap_or(0))
    }
}

/// Calendar date the shop is trading on.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use kasir_core::sequence::parse_code;
    use std::collections::HashSet;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_two_calls_same_day_are_consecutive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let seq = db.sequences();
        let date = day(2026, 10, 16);

        assert_eq!(seq.next_code_on("TRX", date).await.unwrap(), "TRX-2610160001");
        assert_eq!(seq.next_code_on("TRX", date).await.unwrap(), "TRX-2610160002");
        assert_eq!(seq.current("TRX", date).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_counters_are_per_prefix_and_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let seq = db.sequences();

        seq.next_code_on("TRX", day(2026, 10, 16)).await.unwrap();
        seq.next_code_on("TRX", day(2026, 10, 16)).await.unwrap();

        assert_eq!(
            seq.next_code_on("ORD", day(2026, 10, 16)).await.unwrap(),
            "ORD-2610160001"
        );
        assert_eq!(
            seq.next_code_on("TRX", day(2026, 10, 17)).await.unwrap(),
            "TRX-2610170001"
        );
    }

    #[tokio::test]
    async fn test_today_code_parses_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let code = db.sequences().next_code("TRX").await.unwrap();

        let parsed = parse_code(&code).unwrap();
        assert_eq!(parsed.prefix, "TRX");
        assert_eq!(parsed.date, today());
        assert_eq!(parsed.number, 1);
    }

    #[tokio::test]
    async fn test_rejects_invalid_prefix() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.sequences().next_code("trx").await.is_err());
    }

    #[tokio::test]
    async fn test_rolled_back_number_is_reissued() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let date = day(2026, 10, 16);

        let mut tx = db.pool().begin().await.unwrap();
        let code = SequenceRepository::next_code_in(&mut tx, "TRX", date).await.unwrap();
        assert_eq!(code, "TRX-2610160001");
        tx.rollback().await.unwrap();

        assert_eq!(
            db.sequences().next_code_on("TRX", date).await.unwrap(),
            "TRX-2610160001"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_never_share_a_code() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("seq.db")).max_connections(8))
            .await
            .unwrap();
        let date = day(2026, 10, 16);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let seq = db.sequences();
            handles.push(tokio::spawn(async move {
                let mut codes = Vec::new();
                for _ in 0..25 {
                    codes.push(seq.next_code_on("TRX", date).await.unwrap());
                }
                codes
            }));
        }

        let mut all = HashSet::new();
        for handle in handles {
            for code in handle.await.unwrap() {
                assert!(all.insert(code.clone()), "duplicate code {code}");
            }
        }

        assert_eq!(all.len(), 200);
        assert!(all.contains("TRX-2610160001"));
        assert!(all.contains("TRX-2610160200"));
        db.close().await;
    }
}
